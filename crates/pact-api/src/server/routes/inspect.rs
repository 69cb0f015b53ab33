#[derive(Debug, Serialize)]
struct OffersResponse {
    schema_version: String,
    offers: Vec<OfferSnapshot>,
}

#[derive(Debug, Serialize)]
struct PactsResponse {
    schema_version: String,
    pact_links: Vec<PactLinkSnapshot>,
}

#[derive(Debug, Deserialize)]
struct TimelineQuery {
    cursor: Option<usize>,
    page_size: Option<usize>,
}

#[derive(Debug, Serialize)]
struct TimelineResponse {
    schema_version: String,
    events: Vec<Event>,
    next_cursor: Option<usize>,
}

async fn get_offers(State(state): State<AppState>) -> Json<OffersResponse> {
    let inner = state.inner.lock().await;
    Json(OffersResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        offers: inner.api.offers(),
    })
}

async fn get_pacts(State(state): State<AppState>) -> Json<PactsResponse> {
    let inner = state.inner.lock().await;
    Json(PactsResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        pact_links: inner.api.pacts(),
    })
}

async fn get_timeline(
    State(state): State<AppState>,
    Query(query): Query<TimelineQuery>,
) -> Result<Json<TimelineResponse>, HttpApiError> {
    let inner = state.inner.lock().await;
    let events = inner.api.events();
    let (start, end, next_cursor) = paginate(events.len(), query.cursor, query.page_size)?;

    Ok(Json(TimelineResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        events: events[start..end].to_vec(),
        next_cursor,
    }))
}
