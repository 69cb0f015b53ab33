use super::*;
use contracts::{CommandPayload, CommandType, Position};

fn inner_with_pair() -> ServerInner {
    let mut inner = ServerInner::new(CoordinatorConfig::default());
    for (id, name) in [("uid-a", "Alice"), ("uid-b", "Bob")] {
        inner.api.submit_command(Command::new(
            format!("cmd-join-{id}"),
            0,
            CommandType::InjectJoin,
            CommandPayload::InjectJoin {
                participant_id: id.to_string(),
                display_name: name.to_string(),
                position: Position::new(0.0, 64.0, 0.0),
                bonus_health: 0.0,
            },
        ));
    }
    inner
}

#[test]
fn pagination_enforces_max_bounds() {
    let (start, end, next_cursor) = paginate(100, Some(10), Some(20)).expect("page should work");
    assert_eq!(start, 10);
    assert_eq!(end, 30);
    assert_eq!(next_cursor, Some(30));

    let out_of_range = paginate(5, Some(10), Some(1));
    assert!(out_of_range.is_err());
}

#[test]
fn delta_messages_emit_each_event_once() {
    let mut inner = inner_with_pair();
    inner.api.submit_command(Command::new(
        "cmd-pact",
        0,
        CommandType::PactRequest,
        CommandPayload::PactRequest {
            requester_id: "uid-a".to_string(),
            args: vec!["Bob".to_string()],
        },
    ));

    let first = collect_delta_messages(&mut inner);
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].message_type, "event.appended");

    // No new events since the last collection.
    assert!(collect_delta_messages(&mut inner).is_empty());
}

#[test]
fn stream_message_serializes_with_type_tag() {
    let inner = inner_with_pair();
    let message = StreamMessage::status(&inner.api.status());
    let encoded = serde_json::to_value(&message).expect("serialize");
    assert_eq!(encoded["type"], "coordinator.status");
    assert_eq!(encoded["schema_version"], SCHEMA_VERSION_V1);
    assert!(encoded["payload"]["online_participants"].is_number());
}
