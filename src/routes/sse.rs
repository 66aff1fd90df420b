use std::convert::Infallible;

use axum::{
    Router,
    extract::{Query, State},
    response::sse::{Event, Sse},
    routing::get,
};
use futures::Stream;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{error::AppError, services::sse_service, state::SharedState};

/// Query string of the event stream; browsers cannot set headers on `EventSource`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EventStreamQuery {
    /// Bearer token of the subscriber.
    #[serde(default)]
    pub token: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/events",
    tag = "sse",
    params(EventStreamQuery),
    responses(
        (
            status = 200,
            description = "Booking event stream",
            content_type = "text/event-stream",
            body = String
        ),
        (status = 401, description = "Missing or invalid token")
    )
)]
/// Stream slot availability and booking status changes.
pub async fn event_stream(
    State(state): State<SharedState>,
    Query(query): Query<EventStreamQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let subscription = sse_service::subscribe(&state, query.token.as_deref()).await?;
    Ok(sse_service::to_sse_stream(subscription))
}

/// Configure the SSE endpoint.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/events", get(event_stream))
}
