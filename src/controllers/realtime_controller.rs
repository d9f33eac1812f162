use std::{convert::Infallible, time::Duration};

use axum::{
    extract::{Extension, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures_util::stream::Stream;
use mongodb::bson::oid::ObjectId;
use tokio::sync::broadcast::{error::RecvError, Receiver};

use super::require_user;
use crate::{error::AppResult, events::AppEvent, models::CurrentUser, AppState};

/// Next event addressed to `user_id`. `None` once the channel is closed.
async fn next_event_for(rx: &mut Receiver<AppEvent>, user_id: ObjectId) -> Option<Event> {
    loop {
        match rx.recv().await {
            Ok(evt) if evt.user_id == user_id => {
                return Some(Event::default().event(evt.name).data("1"));
            }
            Ok(_) => continue,
            Err(RecvError::Lagged(_)) => return Some(Event::default().event("ping").data("lagged")),
            Err(RecvError::Closed) => return None,
        }
    }
}

// GET /api/events  (SSE)
pub async fn sse_events(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let u = require_user(user)?;
    let rx = state.events_tx.subscribe();

    let stream = futures_util::stream::unfold((rx, u.id), |(mut rx, user_id)| async move {
        let evt = next_event_for(&mut rx, user_id).await?;
        Some((Ok(evt), (rx, user_id)))
    });

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(20))
            .text("keep-alive"),
    ))
}
