#[derive(Clone)]
struct AppState {
    inner: std::sync::Arc<Mutex<ServerInner>>,
    stream_tx: broadcast::Sender<StreamMessage>,
}

impl AppState {
    fn new(config: CoordinatorConfig) -> Self {
        let (stream_tx, _) = broadcast::channel(4096);
        Self {
            inner: std::sync::Arc::new(Mutex::new(ServerInner::new(config))),
            stream_tx,
        }
    }
}

#[derive(Debug)]
struct ServerInner {
    api: CoordinatorApi,
    emitted_event_count: usize,
}

impl ServerInner {
    fn new(config: CoordinatorConfig) -> Self {
        Self {
            api: CoordinatorApi::from_config(config),
            emitted_event_count: 0,
        }
    }
}

fn collect_delta_messages(inner: &mut ServerInner) -> Vec<StreamMessage> {
    let new_events = &inner.api.events()[inner.emitted_event_count..];
    let messages = new_events
        .iter()
        .map(StreamMessage::event_appended)
        .collect::<Vec<_>>();
    inner.emitted_event_count = inner.api.events().len();
    messages
}

fn broadcast_messages(state: &AppState, messages: Vec<StreamMessage>) {
    for message in messages {
        let _ = state.stream_tx.send(message);
    }
}
