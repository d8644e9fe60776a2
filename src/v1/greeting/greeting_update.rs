#![forbid(unsafe_code)]

use poem::Request;
use poem_openapi::{payload::Json, ApiResponse, OpenApi};
use std::sync::Arc;

use crate::utils::greeting_utils::{self, RequestDebug};
use crate::utils::store::GreetingStore;

// ***************************************************************************
//                          Request/Response Definiions
// ***************************************************************************
pub struct UpdateGreetingApi {
    store: Arc<GreetingStore>,
}

impl UpdateGreetingApi {
    pub fn new(store: Arc<GreetingStore>) -> Self {
        Self { store }
    }
}

// The request body is a bare JSON string; package it for logging.
struct ReqUpdateGreeting {
    greeting: String,
}

// Implement the debug record trait for logging.
impl RequestDebug for ReqUpdateGreeting {
    type Req = ReqUpdateGreeting;
    fn get_request_info(&self) -> String {
        let mut s = String::with_capacity(255);
        s.push_str("  Request body:");
        s.push_str("\n    greeting: ");
        s.push_str(&self.greeting);
        s
    }
}

// ------------------- HTTP Status Codes -------------------
// Replacing the greeting cannot fail; malformed bodies are rejected with a
// client error by the framework before this endpoint runs.
#[derive(Debug, ApiResponse)]
enum GreetingResponse {
    #[oai(status = 204)]
    Http204,
}

fn make_http_204() -> GreetingResponse {
    GreetingResponse::Http204
}

// ***************************************************************************
//                             OpenAPI Endpoint
// ***************************************************************************
#[OpenApi]
impl UpdateGreetingApi {
    #[oai(path = "/greeting", method = "post")]
    async fn update_greeting(&self, http_req: &Request, greeting: Json<String>) -> GreetingResponse {
        // Package the request parameters.
        let req = ReqUpdateGreeting { greeting: greeting.0 };

        // Conditional logging depending on log level.
        greeting_utils::debug_request(http_req, &req);

        // Replace the value unconditionally.  The store writes the one log
        // record that accompanies each successful update.
        self.store.set(req.greeting);
        make_http_204()
    }
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use super::*;
    use poem::http::StatusCode;
    use poem::test::TestClient;
    use poem::IntoEndpoint;
    use poem_openapi::OpenApiService;

    use crate::utils::store::DEFAULT_GREETING;
    use crate::v1::greeting::greeting_get::GetGreetingApi;

    fn test_client(store: Arc<GreetingStore>) -> TestClient<impl poem::Endpoint> {
        let endpoints = (GetGreetingApi::new(store.clone()), UpdateGreetingApi::new(store));
        let service = OpenApiService::new(endpoints, "Greeting Server", "test");
        TestClient::new(service.into_endpoint())
    }

    #[tokio::test]
    async fn post_returns_204_with_empty_body() {
        let cli = test_client(Arc::new(GreetingStore::default()));

        let resp = cli.post("/greeting").body_json(&"Hi there").send().await;
        resp.assert_status(StatusCode::NO_CONTENT);
        resp.assert_text("").await;
    }

    #[tokio::test]
    async fn post_then_get_round_trip() {
        let cli = test_client(Arc::new(GreetingStore::default()));

        cli.post("/greeting").body_json(&"Hi there").send().await
            .assert_status(StatusCode::NO_CONTENT);

        let resp = cli.get("/greeting").send().await;
        resp.assert_status_is_ok();
        resp.assert_text("\"Hi there\"").await;
    }

    #[tokio::test]
    async fn post_accepts_empty_and_unusual_strings() {
        let cli = test_client(Arc::new(GreetingStore::default()));

        for greeting in ["", "he said \"hello\"", "добър ден, 世界"] {
            cli.post("/greeting").body_json(&greeting).send().await
                .assert_status(StatusCode::NO_CONTENT);

            let resp = cli.get("/greeting").send().await;
            resp.assert_status_is_ok();
            resp.assert_json(serde_json::json!(greeting)).await;
        }
    }

    #[tokio::test]
    async fn post_accepts_raw_json_string_body() {
        let store = Arc::new(GreetingStore::default());
        let cli = test_client(store.clone());

        // The wire format is a bare JSON string.
        let body = serde_json::to_string("Hi there").expect("serialize greeting");
        let resp = cli.post("/greeting")
            .content_type("application/json")
            .body(body)
            .send()
            .await;
        resp.assert_status(StatusCode::NO_CONTENT);

        assert_eq!(store.get(), "Hi there");
    }

    #[tokio::test]
    async fn post_is_idempotent() {
        let store = Arc::new(GreetingStore::default());
        let cli = test_client(store.clone());

        cli.post("/greeting").body_json(&"Howdy").send().await
            .assert_status(StatusCode::NO_CONTENT);
        cli.post("/greeting").body_json(&"Howdy").send().await
            .assert_status(StatusCode::NO_CONTENT);

        assert_eq!(store.get(), "Howdy");
    }

    #[tokio::test]
    async fn malformed_body_rejected_before_store() {
        let store = Arc::new(GreetingStore::default());
        let cli = test_client(store.clone());

        // Not a JSON string at all.
        let resp = cli.post("/greeting")
            .content_type("application/json")
            .body("{not json")
            .send()
            .await;
        resp.assert_status(StatusCode::BAD_REQUEST);

        // The store never saw the request.
        assert_eq!(store.get(), DEFAULT_GREETING);
    }
}
