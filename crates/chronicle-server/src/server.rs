//! Router assembly and shared application state.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::response::Json;
use axum::routing::{delete, get};
use axum::Router;
use serde::Serialize;
use tower_http::trace::TraceLayer;

use chronicle_store::EventStore;

use crate::routes;

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// The event engine.
    pub store: Arc<EventStore>,
    /// When the server started.
    pub start_time: Instant,
}

impl AppState {
    /// State wrapping the given store, with the clock started now.
    pub fn new(store: Arc<EventStore>) -> Self {
        Self {
            store,
            start_time: Instant::now(),
        }
    }
}

/// Health check response body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the server is running.
    pub status: String,
    /// Seconds since the server started.
    pub uptime_secs: u64,
}

/// Build the Axum router with all routes.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/v1/event/",
            get(routes::get_events)
                .put(routes::put_event)
                .post(routes::post_event),
        )
        .route("/api/v1/event/{event_id}", get(routes::get_event))
        .route(
            "/api/v1/event/{event_id}/children",
            get(routes::get_children),
        )
        .route("/api/v1/event/{event_id}/trace", get(routes::get_trace))
        .route("/api/v1/event/{event_id}/impact", get(routes::get_impact))
        .route(
            "/api/v1/event/{event_id}/delete",
            delete(routes::delete_event),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn make_router() -> Router {
        let store = Arc::new(EventStore::in_memory().unwrap());
        router(AppState::new(store))
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn json_req(method: &str, uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(resp: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(resp.into_body(), 1_000_000)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn event_body(id: &str, parent_id: Option<&str>, start: &str) -> Value {
        let mut body = json!({
            "id": id,
            "start_time": start,
            "end_time": start,
        });
        if let Some(parent_id) = parent_id {
            body["parent_id"] = json!(parent_id);
        }
        body
    }

    async fn put_event(app: &Router, body: &Value) {
        let resp = app
            .clone()
            .oneshot(json_req("PUT", "/api/v1/event/", body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let app = make_router();
        let resp = app.oneshot(get_req("/health")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let parsed = body_json(resp).await;
        assert_eq!(parsed["status"], "ok");
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let app = make_router();
        let mut body = event_body("evt-1", None, "2024-05-12T10:25:00.000Z");
        body["tags"] = json!({"status": ["success"]});
        put_event(&app, &body).await;

        let resp = app
            .oneshot(get_req("/api/v1/event/evt-1"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let parsed = body_json(resp).await;
        assert_eq!(parsed["id"], "evt-1");
        assert_eq!(parsed["tags"]["status"][0], "success");
    }

    #[tokio::test]
    async fn get_missing_event_is_404() {
        let app = make_router();
        let resp = app.oneshot(get_req("/api/v1/event/ghost")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn put_rejects_reserved_tag_key() {
        let app = make_router();
        let mut body = event_body("evt-1", None, "2024-05-12T10:25:00.000Z");
        body["tags"] = json!({"parent_id": ["sneaky"]});
        let resp = app
            .oneshot(json_req("PUT", "/api/v1/event/", &body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn children_endpoint_lists_direct_children() {
        let app = make_router();
        put_event(&app, &event_body("root", None, "2024-05-12T10:00:00.000Z")).await;
        put_event(
            &app,
            &event_body("kid-1", Some("root"), "2024-05-12T10:05:00.000Z"),
        )
        .await;
        put_event(
            &app,
            &event_body("kid-2", Some("root"), "2024-05-12T10:10:00.000Z"),
        )
        .await;

        let resp = app
            .oneshot(get_req("/api/v1/event/root/children"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let parsed = body_json(resp).await;
        assert_eq!(parsed.as_array().unwrap().len(), 2);
        assert_eq!(parsed[0]["id"], "kid-2"); // most recent first
    }

    #[tokio::test]
    async fn trace_endpoint_walks_to_root() {
        let app = make_router();
        put_event(&app, &event_body("c", None, "2024-05-12T10:00:00.000Z")).await;
        put_event(&app, &event_body("b", Some("c"), "2024-05-12T10:05:00.000Z")).await;
        put_event(&app, &event_body("a", Some("b"), "2024-05-12T10:10:00.000Z")).await;

        let resp = app
            .oneshot(get_req("/api/v1/event/a/trace"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let parsed = body_json(resp).await;
        let ids: Vec<&str> = parsed
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn impact_endpoint_builds_descendant_tree() {
        let app = make_router();
        put_event(&app, &event_body("1", None, "2024-05-12T10:00:00.000Z")).await;
        put_event(&app, &event_body("2", Some("1"), "2024-05-12T10:05:00.000Z")).await;
        put_event(&app, &event_body("3", Some("1"), "2024-05-12T10:01:00.000Z")).await;
        put_event(&app, &event_body("4", Some("2"), "2024-05-12T10:06:00.000Z")).await;

        let resp = app
            .oneshot(get_req("/api/v1/event/1/impact"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let parsed = body_json(resp).await;
        assert_eq!(parsed["event"]["id"], "1");
        assert_eq!(parsed["children"][0]["event"]["id"], "2");
        assert_eq!(parsed["children"][0]["children"][0]["event"]["id"], "4");
        assert_eq!(parsed["children"][1]["event"]["id"], "3");
    }

    #[tokio::test]
    async fn list_endpoint_pages_most_recent_first() {
        let app = make_router();
        put_event(&app, &event_body("a", None, "2024-05-12T10:00:00.000Z")).await;
        put_event(&app, &event_body("b", None, "2024-05-12T10:10:00.000Z")).await;
        put_event(&app, &event_body("c", None, "2024-05-12T10:20:00.000Z")).await;

        let resp = app
            .oneshot(get_req("/api/v1/event/?count=2&page=1"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let parsed = body_json(resp).await;
        assert_eq!(parsed["count"], 2);
        assert_eq!(parsed["result"][0]["id"], "c");
        assert_eq!(parsed["result"][1]["id"], "b");
    }

    #[tokio::test]
    async fn list_endpoint_filters_by_repeated_tag_params() {
        let app = make_router();
        let mut both = event_body("both", None, "2024-05-12T10:00:00.000Z");
        both["tags"] = json!({"env": ["prod"], "status": ["ok"]});
        let mut one = event_body("one", None, "2024-05-12T10:10:00.000Z");
        one["tags"] = json!({"env": ["prod"]});
        put_event(&app, &both).await;
        put_event(&app, &one).await;

        let resp = app
            .oneshot(get_req("/api/v1/event/?tag=env:prod&tag=status:ok"))
            .await
            .unwrap();
        let parsed = body_json(resp).await;
        assert_eq!(parsed["count"], 1);
        assert_eq!(parsed["result"][0]["id"], "both");
    }

    #[tokio::test]
    async fn list_endpoint_rejects_negative_count() {
        let app = make_router();
        let resp = app
            .oneshot(get_req("/api/v1/event/?count=-1"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn list_endpoint_rejects_page_zero() {
        let app = make_router();
        let resp = app
            .oneshot(get_req("/api/v1/event/?count=1&page=0"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn post_merge_takes_earlier_start_time() {
        let app = make_router();
        put_event(&app, &event_body("evt-1", None, "2024-05-12T10:00:00.000Z")).await;

        let incoming = event_body("evt-1", None, "2024-05-12T08:00:00.000Z");
        let resp = app
            .clone()
            .oneshot(json_req("POST", "/api/v1/event/", &incoming))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let parsed = body_json(resp).await;
        assert_eq!(parsed["start_time"], "2024-05-12T08:00:00.000Z");

        // merged record was persisted
        let resp = app.oneshot(get_req("/api/v1/event/evt-1")).await.unwrap();
        let parsed = body_json(resp).await;
        assert_eq!(parsed["start_time"], "2024-05-12T08:00:00.000Z");
    }

    #[tokio::test]
    async fn post_merge_conflicting_source_ids_is_400() {
        let app = make_router();
        let mut body = event_body("evt-1", None, "2024-05-12T10:00:00.000Z");
        body["source_id"] = json!("src-1");
        put_event(&app, &body).await;

        let mut incoming = event_body("evt-1", None, "2024-05-12T10:00:00.000Z");
        incoming["source_id"] = json!("src-2");
        let resp = app
            .oneshot(json_req("POST", "/api/v1/event/", &incoming))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn post_update_replaces_tags_wholesale() {
        let app = make_router();
        let mut body = event_body("evt-1", None, "2024-05-12T10:00:00.000Z");
        body["tags"] = json!({"author": ["a", "b"]});
        put_event(&app, &body).await;

        let mut incoming = event_body("evt-1", None, "2024-05-12T10:00:00.000Z");
        incoming["tags"] = json!({"author": ["x"]});
        let resp = app
            .oneshot(json_req(
                "POST",
                "/api/v1/event/?operation=update",
                &incoming,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let parsed = body_json(resp).await;
        assert_eq!(parsed["tags"]["author"], json!(["x"]));
    }

    #[tokio::test]
    async fn post_unknown_operation_is_400() {
        let app = make_router();
        let body = event_body("evt-1", None, "2024-05-12T10:00:00.000Z");
        let resp = app
            .oneshot(json_req("POST", "/api/v1/event/?operation=destroy", &body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn post_missing_id_without_insert_does_not_persist() {
        let app = make_router();
        let body = event_body("fresh", None, "2024-05-12T10:00:00.000Z");
        let resp = app
            .clone()
            .oneshot(json_req("POST", "/api/v1/event/", &body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = app.oneshot(get_req("/api/v1/event/fresh")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn post_missing_id_with_insert_persists() {
        let app = make_router();
        let body = event_body("fresh", None, "2024-05-12T10:00:00.000Z");
        let resp = app
            .clone()
            .oneshot(json_req("POST", "/api/v1/event/?insert=true", &body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = app.oneshot(get_req("/api/v1/event/fresh")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn delete_succeeds_once_then_rejects() {
        let app = make_router();
        put_event(&app, &event_body("evt-1", None, "2024-05-12T10:00:00.000Z")).await;

        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/v1/event/evt-1/delete")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/v1/event/evt-1/delete")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let app = make_router();
        let resp = app.oneshot(get_req("/nonexistent")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
