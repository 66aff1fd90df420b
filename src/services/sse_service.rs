use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use crate::{
    dto::sse::{CONNECTED, ConnectedEvent, RESYNC_REQUIRED, ResyncRequiredEvent, ServerEvent},
    error::ServiceError,
    state::{SharedState, auth::Principal},
};

const CLIENT_RETRY: Duration = Duration::from_secs(1);
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// A live subscription to the event hub.
pub struct Subscription {
    pub principal: Principal,
    pub receiver: broadcast::Receiver<ServerEvent>,
    pub handshake: ServerEvent,
}

/// Authenticate an SSE client by its query token and subscribe it to the hub.
pub async fn subscribe(
    state: &SharedState,
    token: Option<&str>,
) -> Result<Subscription, ServiceError> {
    let token = token
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ServiceError::Unauthenticated("missing event stream token".into()))?;
    let principal = state
        .tokens()
        .resolve(token)
        .ok_or_else(|| ServiceError::Unauthenticated("invalid event stream token".into()))?;

    let receiver = state.events().subscribe();
    let handshake = ServerEvent::typed(
        CONNECTED,
        &ConnectedEvent {
            message: "subscribed to booking events".into(),
            degraded: state.is_degraded().await,
        },
    )
    .map_err(|err| ServiceError::Internal(format!("failed to encode handshake: {err}")))?;

    info!(user_id = %principal.user_id, "SSE client subscribed");
    Ok(Subscription {
        principal,
        receiver,
        handshake,
    })
}

fn to_event(payload: ServerEvent) -> Event {
    let mut event = Event::default().data(payload.data);
    if let Some(name) = payload.event {
        event = event.event(name);
    }
    event
}

/// Convert a subscription into an SSE response, forwarding hub events until the client leaves.
///
/// A client that falls behind receives `RESYNC_REQUIRED` and should re-fetch availability.
pub fn to_sse_stream(
    subscription: Subscription,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let Subscription {
        principal,
        mut receiver,
        handshake,
    } = subscription;
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        if tx
            .send(Ok(to_event(handshake).retry(CLIENT_RETRY)))
            .await
            .is_err()
        {
            return;
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    let payload = match recv_result {
                        Ok(payload) => payload,
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(missed)) => {
                            debug!(missed, user_id = %principal.user_id, "SSE client lagged");
                            let resync = ResyncRequiredEvent { missed };
                            match ServerEvent::typed(RESYNC_REQUIRED, &resync) {
                                Ok(event) => event,
                                Err(err) => {
                                    warn!(error = %err, "failed to encode resync event");
                                    continue;
                                }
                            }
                        }
                    };
                    if tx.send(Ok(to_event(payload))).await.is_err() {
                        break;
                    }
                }
            }
        }

        info!(user_id = %principal.user_id, "SSE client disconnected");
    });

    Sse::new(ReceiverStream::new(rx)).keep_alive(
        KeepAlive::new()
            .interval(KEEP_ALIVE_INTERVAL)
            .text("keep-alive"),
    )
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::{
        config::AppConfig,
        state::{AppState, auth::UserRole},
    };

    fn state_with_token() -> SharedState {
        let principal = Principal {
            user_id: Uuid::new_v4(),
            role: UserRole::User,
        };
        AppState::new(AppConfig::default().with_api_tokens(vec![("secret".into(), principal)]))
    }

    #[tokio::test]
    async fn rejects_missing_and_unknown_tokens() {
        let state = state_with_token();
        assert!(matches!(
            subscribe(&state, None).await,
            Err(ServiceError::Unauthenticated(_))
        ));
        assert!(matches!(
            subscribe(&state, Some("nope")).await,
            Err(ServiceError::Unauthenticated(_))
        ));
    }

    #[tokio::test]
    async fn handshake_reports_degraded_mode() {
        let state = state_with_token();
        let subscription = subscribe(&state, Some("secret")).await.unwrap();
        assert_eq!(subscription.handshake.event.as_deref(), Some(CONNECTED));
        let body: serde_json::Value = serde_json::from_str(&subscription.handshake.data).unwrap();
        assert_eq!(body["payload"]["degraded"], true);
        assert_eq!(state.events().subscriber_count(), 1);
    }
}
