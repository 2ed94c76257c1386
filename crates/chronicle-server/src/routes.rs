//! REST handlers for the `/api/v1/event` surface.
//!
//! Handlers only marshal: query parameters and JSON bodies in, engine calls,
//! records back out. Graph traversals run on the blocking pool with a
//! cancellation token that trips when the request is abandoned, so a
//! disconnected client stops the walk at its next step.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::Json;
use axum_extra::extract::Query;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use chronicle_core::{Event, EventNode};
use chronicle_store::{graph, reconcile, EventStore, FindQuery, StoreError};

use crate::error::ApiError;
use crate::server::AppState;

/// A page of events plus the number returned.
#[derive(Debug, Serialize, Deserialize)]
pub struct EventListWithCount {
    /// The events on this page, most recent first.
    pub result: Vec<Event>,
    /// Number of events in `result`.
    pub count: usize,
}

/// Query parameters for the event listing.
#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    /// Page size; `0` means unbounded.
    #[serde(default = "default_count")]
    pub count: i64,
    /// 1-based page number.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Inclusive lower bound on the selected time field.
    pub frm: Option<DateTime<Utc>>,
    /// Exclusive upper bound on the selected time field.
    pub to: Option<DateTime<Utc>>,
    /// Filter and sort on the write stamp instead of event time.
    #[serde(default)]
    pub use_update_time: bool,
    /// Required tag entries (`key:value`), repeatable; ANDed together.
    #[serde(default)]
    pub tag: Vec<String>,
}

fn default_count() -> i64 {
    100
}

fn default_page() -> i64 {
    1
}

/// Query parameters for the reconciling POST.
#[derive(Debug, Deserialize)]
pub struct PostQuery {
    /// `"merge"` (default) or `"update"`.
    #[serde(default = "default_operation")]
    pub operation: String,
    /// Insert the record when no event exists under its id.
    #[serde(default)]
    pub insert: bool,
}

fn default_operation() -> String {
    "merge".into()
}

/// Confirmation body for deletes.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Human-readable outcome.
    pub message: String,
}

/// GET `/api/v1/event/{event_id}` — fetch one event.
pub async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<Json<Event>, ApiError> {
    Ok(Json(state.store.find_by_id(&event_id)?))
}

/// GET `/api/v1/event/{event_id}/children` — direct children of an event.
pub async fn get_children(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<Json<Vec<Event>>, ApiError> {
    let events = state.store.find_by_parent_id(&event_id)?.collect_events()?;
    Ok(Json(events))
}

/// GET `/api/v1/event/{event_id}/trace` — the chain from an event up to
/// its root, child first.
pub async fn get_trace(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<Json<Vec<Event>>, ApiError> {
    let chain = run_traversal(state.store, move |store, cancel| {
        graph::trace(store, &event_id, cancel)
    })
    .await?;
    Ok(Json(chain))
}

/// GET `/api/v1/event/{event_id}/impact` — the tree of all descendants.
///
/// Given `1`'s id for
///
/// ```text
/// 1
/// | \
/// 2  3
/// | \
/// 4  5
/// ```
///
/// returns the node representation of the whole tree rooted at `1`.
pub async fn get_impact(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<Json<EventNode>, ApiError> {
    let node = run_traversal(state.store, move |store, cancel| {
        graph::tree(store, &event_id, cancel)
    })
    .await?;
    Ok(Json(node))
}

/// GET `/api/v1/event/` — list events by tags and time range, paginated.
pub async fn get_events(
    State(state): State<AppState>,
    Query(params): Query<EventsQuery>,
) -> Result<Json<EventListWithCount>, ApiError> {
    let query = FindQuery {
        tags: if params.tag.is_empty() {
            None
        } else {
            Some(params.tag)
        },
        from: params.frm,
        to: params.to,
        use_update_time: params.use_update_time,
        count: params.count,
        page: params.page,
    };
    let result = state.store.find(&query)?.collect_events()?;
    let count = result.len();
    Ok(Json(EventListWithCount { result, count }))
}

/// PUT `/api/v1/event/` — store a new event, replacing any previous
/// document under the same id.
pub async fn put_event(
    State(state): State<AppState>,
    Json(event): Json<Event>,
) -> Result<Json<Event>, ApiError> {
    event.validate()?;
    let _ = state.store.save(&event)?;
    Ok(Json(event))
}

/// POST `/api/v1/event/` — reconcile an incoming event with the stored one.
///
/// `operation=merge` combines the two records field by field and rejects
/// clashing reserved ids; `operation=update` overwrites wholesale. When no
/// event exists under the incoming id, the incoming record is used as-is
/// (and only written when `insert` is set).
pub async fn post_event(
    State(state): State<AppState>,
    Query(params): Query<PostQuery>,
    Json(event): Json<Event>,
) -> Result<Json<Event>, ApiError> {
    event.validate()?;
    if params.operation != "merge" && params.operation != "update" {
        return Err(ApiError::BadRequest(format!(
            "only merge and update operations are supported, {:?} passed",
            params.operation
        )));
    }

    let reconciled = match state.store.find_by_id(event.id.as_str()) {
        Ok(existing) => {
            if params.operation == "merge" {
                reconcile::merge(&existing, &event)?
            } else {
                reconcile::update(&existing, &event)?
            }
        }
        Err(StoreError::NotFound(_)) => event.clone(),
        Err(e) => return Err(e.into()),
    };

    let _ = state
        .store
        .update_by_id(event.id.as_str(), &reconciled, params.insert)?;
    Ok(Json(reconciled))
}

/// DELETE `/api/v1/event/{event_id}/delete` — remove an event.
pub async fn delete_event(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    if state.store.delete(&event_id)? {
        Ok(Json(MessageResponse {
            message: format!("event {event_id} deleted successfully"),
        }))
    } else {
        Err(ApiError::BadRequest(format!(
            "cannot delete event with id: {event_id}"
        )))
    }
}

/// Run a graph traversal on the blocking pool.
///
/// The token's drop guard lives in this future: when the request is
/// abandoned, the guard drops and the traversal observes the cancellation
/// at its next step.
async fn run_traversal<T, F>(store: Arc<EventStore>, traverse: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&EventStore, &CancellationToken) -> Result<T, StoreError> + Send + 'static,
{
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();
    let result = tokio::task::spawn_blocking(move || traverse(&store, &cancel))
        .await
        .map_err(|e| ApiError::Internal(format!("traversal task failed: {e}")))?;
    Ok(result?)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
