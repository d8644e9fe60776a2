#![forbid(unsafe_code)]

use poem_openapi::{payload::Json, OpenApi};
use std::sync::Arc;

use crate::utils::store::GreetingStore;

// ***************************************************************************
//                          Request/Response Definiions
// ***************************************************************************
pub struct GetGreetingApi {
    store: Arc<GreetingStore>,
}

impl GetGreetingApi {
    pub fn new(store: Arc<GreetingStore>) -> Self {
        Self { store }
    }
}

// ***************************************************************************
//                             OpenAPI Endpoint
// ***************************************************************************
#[OpenApi]
impl GetGreetingApi {
    #[oai(path = "/greeting", method = "get")]
    async fn get_greeting(&self) -> Json<String> {
        // Reading the store cannot fail, so there is no error path here.
        Json(self.store.get())
    }
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use super::*;
    use poem::test::TestClient;
    use poem::IntoEndpoint;
    use poem_openapi::OpenApiService;

    use crate::utils::store::DEFAULT_GREETING;

    fn test_client(store: Arc<GreetingStore>) -> TestClient<impl poem::Endpoint> {
        let service =
            OpenApiService::new(GetGreetingApi::new(store), "Greeting Server", "test");
        TestClient::new(service.into_endpoint())
    }

    #[tokio::test]
    async fn get_returns_default_greeting() {
        let cli = test_client(Arc::new(GreetingStore::default()));

        let resp = cli.get("/greeting").send().await;
        resp.assert_status_is_ok();
        resp.assert_text(format!("\"{}\"", DEFAULT_GREETING)).await;
    }

    #[tokio::test]
    async fn get_observes_store_updates() {
        let store = Arc::new(GreetingStore::default());
        let cli = test_client(store.clone());

        store.set("Good evening".to_string());

        let resp = cli.get("/greeting").send().await;
        resp.assert_status_is_ok();
        resp.assert_text("\"Good evening\"").await;
    }
}
