#[derive(Debug, Serialize)]
struct StatusResponse {
    schema_version: String,
    status: CoordinatorStatus,
}

async fn submit_command(
    State(state): State<AppState>,
    Json(command): Json<Command>,
) -> Result<Json<CommandResult>, HttpApiError> {
    let (result, messages) = {
        let mut inner = state.inner.lock().await;
        let result = inner.api.submit_command(command);
        let status = inner.api.status();

        let mut messages = vec![StreamMessage::command_result(&result, status.clock_ms)];
        messages.extend(collect_delta_messages(&mut inner));
        messages.push(StreamMessage::status(&status));

        (result, messages)
    };

    broadcast_messages(&state, messages);

    Ok(Json(result))
}

async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let inner = state.inner.lock().await;
    Json(StatusResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        status: inner.api.status(),
    })
}
