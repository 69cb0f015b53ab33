async fn stream_events(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let initial_message = {
        let inner = state.inner.lock().await;
        StreamMessage::status(&inner.api.status())
    };

    ws.on_upgrade(move |socket| stream_socket(socket, state, initial_message))
}

async fn stream_socket(mut socket: WebSocket, state: AppState, initial_message: StreamMessage) {
    if send_stream_message(&mut socket, &initial_message)
        .await
        .is_err()
    {
        return;
    }

    let mut rx = state.stream_tx.subscribe();

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Ping(payload))) => {
                        if socket.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => {
                        break;
                    }
                    _ => {}
                }
            }
            outgoing = rx.recv() => {
                match outgoing {
                    Ok(message) => {
                        if send_stream_message(&mut socket, &message).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        let warning = StreamMessage::warning(
                            0,
                            format!("stream client lagged and skipped {skipped} message(s)"),
                        );

                        if send_stream_message(&mut socket, &warning).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
        }
    }
}

async fn send_stream_message(
    socket: &mut WebSocket,
    message: &StreamMessage,
) -> Result<(), axum::Error> {
    let payload = serde_json::to_string(message).map_err(axum::Error::new)?;
    socket.send(Message::Text(payload.into())).await
}

#[derive(Debug, Clone, Serialize)]
struct StreamMessage {
    schema_version: String,
    #[serde(rename = "type")]
    message_type: String,
    clock_ms: u64,
    sequence: Option<u64>,
    reconnect_token: String,
    payload: Value,
}

impl StreamMessage {
    fn status(status: &CoordinatorStatus) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            message_type: "coordinator.status".to_string(),
            clock_ms: status.clock_ms,
            sequence: None,
            reconnect_token: reconnect_token(status.clock_ms, None, "status"),
            payload: json!(status),
        }
    }

    fn event_appended(event: &Event) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            message_type: "event.appended".to_string(),
            clock_ms: event.at_ms,
            sequence: Some(event.sequence),
            reconnect_token: reconnect_token(event.at_ms, Some(event.sequence), "event"),
            payload: json!(event),
        }
    }

    fn command_result(result: &CommandResult, clock_ms: u64) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            message_type: "command.result".to_string(),
            clock_ms,
            sequence: None,
            reconnect_token: reconnect_token(clock_ms, None, "command"),
            payload: json!(result),
        }
    }

    fn warning(clock_ms: u64, warning: String) -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            message_type: "warning".to_string(),
            clock_ms,
            sequence: None,
            reconnect_token: reconnect_token(clock_ms, None, "warning"),
            payload: json!({ "message": warning }),
        }
    }
}
