//! `reqwest` implementation of the catalog gateway.

use std::num::NonZeroU32;
use std::sync::Arc;

use reqwest::Method;
use serde::Serialize;
use sweet_shop_core::{SearchFilter, Sweet, SweetDraft, SweetId};
use tracing::instrument;

use super::{ApiClient, CatalogGateway, TokenSource};
use crate::error::ApiError;

/// Request body for purchase and restock.
#[derive(Serialize)]
struct QuantityRequest {
    quantity: u32,
}

/// Catalog gateway over HTTP.
///
/// Every request carries the bearer token the [`TokenSource`] holds at the
/// moment the request is built.
#[derive(Clone)]
pub struct HttpCatalogGateway {
    api: ApiClient,
    tokens: Arc<dyn TokenSource>,
}

impl HttpCatalogGateway {
    #[must_use]
    pub fn new(api: ApiClient, tokens: impl TokenSource + 'static) -> Self {
        Self {
            api,
            tokens: Arc::new(tokens),
        }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let token = self.tokens.bearer_token();
        self.api.request(method, path, token.as_ref())
    }
}

impl CatalogGateway for HttpCatalogGateway {
    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<Sweet>, ApiError> {
        self.api
            .send_json(self.request(Method::GET, "/sweets"))
            .await
    }

    #[instrument(skip(self))]
    async fn search(&self, filter: &SearchFilter) -> Result<Vec<Sweet>, ApiError> {
        let request = self
            .request(Method::GET, "/sweets/search")
            .query(&filter.query_pairs());
        self.api.send_json(request).await
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn get(&self, id: SweetId) -> Result<Sweet, ApiError> {
        self.api
            .send_json(self.request(Method::GET, &format!("/sweets/{id}")))
            .await
    }

    #[instrument(skip(self, draft), fields(name = %draft.name))]
    async fn create(&self, draft: &SweetDraft) -> Result<Sweet, ApiError> {
        let request = self.request(Method::POST, "/sweets").json(draft);
        self.api.send_json(request).await
    }

    #[instrument(skip(self, draft), fields(id = %id))]
    async fn update(&self, id: SweetId, draft: &SweetDraft) -> Result<Sweet, ApiError> {
        let request = self
            .request(Method::PUT, &format!("/sweets/{id}"))
            .json(draft);
        self.api.send_json(request).await
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn delete(&self, id: SweetId) -> Result<(), ApiError> {
        self.api
            .send_empty(self.request(Method::DELETE, &format!("/sweets/{id}")))
            .await
    }

    #[instrument(skip(self), fields(id = %id, quantity = quantity.get()))]
    async fn purchase(&self, id: SweetId, quantity: NonZeroU32) -> Result<Sweet, ApiError> {
        let request = self
            .request(Method::POST, &format!("/sweets/{id}/purchase"))
            .json(&QuantityRequest {
                quantity: quantity.get(),
            });
        self.api.send_json(request).await
    }

    #[instrument(skip(self), fields(id = %id, quantity = quantity.get()))]
    async fn restock(&self, id: SweetId, quantity: NonZeroU32) -> Result<Sweet, ApiError> {
        let request = self
            .request(Method::POST, &format!("/sweets/{id}/restock"))
            .json(&QuantityRequest {
                quantity: quantity.get(),
            });
        self.api.send_json(request).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use reqwest::header::AUTHORIZATION;
    use secrecy::SecretString;
    use url::Url;

    use super::*;
    use crate::config::ClientConfig;
    use crate::gateway::Anonymous;

    fn api() -> ApiClient {
        let config = ClientConfig::new(Url::parse("http://localhost:8080/api").unwrap());
        ApiClient::new(&config).unwrap()
    }

    #[test]
    fn test_anonymous_requests_have_no_authorization() {
        let gateway = HttpCatalogGateway::new(api(), Anonymous);
        let request = gateway.request(Method::GET, "/sweets").build().unwrap();
        assert!(request.headers().get(AUTHORIZATION).is_none());
        assert_eq!(request.url().as_str(), "http://localhost:8080/api/sweets");
    }

    #[test]
    fn test_token_is_sent_as_bearer() {
        let gateway = HttpCatalogGateway::new(api(), SecretString::from("abc.def"));
        let request = gateway
            .request(Method::POST, "/sweets/7/restock")
            .build()
            .unwrap();
        assert_eq!(
            request.headers().get(AUTHORIZATION).unwrap(),
            "Bearer abc.def"
        );
    }

    #[test]
    fn test_search_omits_blank_fields() {
        let gateway = HttpCatalogGateway::new(api(), Anonymous);
        let filter = SearchFilter::default()
            .with_name(" ")
            .with_category("Chocolate");
        let request = gateway
            .request(Method::GET, "/sweets/search")
            .query(&filter.query_pairs())
            .build()
            .unwrap();
        assert_eq!(request.url().query(), Some("category=Chocolate"));
    }
}
