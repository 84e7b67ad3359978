//! The crate entry point: a configured [`Client`] handing out
//! per-resource facades over one shared gateway and session.

use std::sync::Arc;

use tracing::info;

use crate::core::config::Configuration;
use crate::core::error::{BloomyError, Result};
use crate::core::session::Session;
use crate::gateway::{ApiGateway, HttpGateway};
use crate::resources::{
    GoalOperations, HeadlineOperations, IssueOperations, MeetingOperations, ScorecardOperations,
    TodoOperations, UserOperations,
};
use crate::DEFAULT_BASE_URL;

/// A Bloom Growth API client.
///
/// Cheap to clone; clones share the underlying HTTP client and the
/// memoized current-user session.
#[derive(Clone)]
pub struct Client {
    gateway: Arc<dyn ApiGateway>,
    session: Arc<Session>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Build a client from an API key against the production endpoint.
    pub fn new(api_key: &str) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Build a client against a custom endpoint, e.g. a staging host.
    pub fn with_base_url(api_key: &str, base_url: &str) -> Result<Self> {
        if api_key.is_empty() {
            return Err(BloomyError::Configuration(
                "No API key provided. Set BG_API_KEY or pass a key explicitly.".to_string(),
            ));
        }
        let gateway = HttpGateway::new(api_key, base_url)?;
        info!(base_url, "Bloom Growth client initialized");
        Ok(Self::with_gateway(Arc::new(gateway)))
    }

    /// Build a client from stored configuration: the `BG_API_KEY`
    /// environment variable or the user config file.
    pub fn from_config() -> Result<Self> {
        let config = Configuration::load()?;
        let api_key = config.resolve_api_key(None)?;
        Self::with_base_url(&api_key, config.base_url())
    }

    /// Build a client over an arbitrary gateway. This is the seam used
    /// by tests to swap in a mock transport.
    pub fn with_gateway(gateway: Arc<dyn ApiGateway>) -> Self {
        Self {
            gateway,
            session: Arc::new(Session::new()),
        }
    }

    /// The id of the user owning the API key, fetched once and cached
    /// for the lifetime of the client.
    pub async fn current_user_id(&self) -> Result<u64> {
        self.session.current_user_id(self.gateway.as_ref()).await
    }

    pub fn users(&self) -> UserOperations {
        UserOperations::new(Arc::clone(&self.gateway), Arc::clone(&self.session))
    }

    pub fn meetings(&self) -> MeetingOperations {
        MeetingOperations::new(Arc::clone(&self.gateway), Arc::clone(&self.session))
    }

    pub fn todos(&self) -> TodoOperations {
        TodoOperations::new(Arc::clone(&self.gateway), Arc::clone(&self.session))
    }

    pub fn goals(&self) -> GoalOperations {
        GoalOperations::new(Arc::clone(&self.gateway), Arc::clone(&self.session))
    }

    pub fn scorecards(&self) -> ScorecardOperations {
        ScorecardOperations::new(Arc::clone(&self.gateway), Arc::clone(&self.session))
    }

    pub fn issues(&self) -> IssueOperations {
        IssueOperations::new(Arc::clone(&self.gateway), Arc::clone(&self.session))
    }

    pub fn headlines(&self) -> HeadlineOperations {
        HeadlineOperations::new(Arc::clone(&self.gateway), Arc::clone(&self.session))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::gateway::testing::MockGateway;

    #[test]
    fn empty_api_key_is_rejected() {
        let err = Client::new("").unwrap_err();
        assert!(matches!(err, BloomyError::Configuration(_)));
    }

    #[tokio::test]
    async fn current_user_id_is_fetched_once() {
        let gateway = Arc::new(MockGateway::new());
        gateway.stub("GET", "users/mine", json!({"Id": 42}));

        let client = Client::with_gateway(Arc::clone(&gateway) as Arc<dyn ApiGateway>);
        assert_eq!(client.current_user_id().await.unwrap(), 42);
        assert_eq!(client.current_user_id().await.unwrap(), 42);
        assert_eq!(gateway.calls().len(), 1);
    }

    #[tokio::test]
    async fn clones_share_the_session() {
        let gateway = Arc::new(MockGateway::new());
        gateway.stub("GET", "users/mine", json!({"Id": 42}));

        let client = Client::with_gateway(Arc::clone(&gateway) as Arc<dyn ApiGateway>);
        let clone = client.clone();
        assert_eq!(client.current_user_id().await.unwrap(), 42);
        assert_eq!(clone.current_user_id().await.unwrap(), 42);
        assert_eq!(gateway.calls().len(), 1);
    }

    #[tokio::test]
    async fn facades_route_through_the_shared_gateway() {
        let gateway = Arc::new(MockGateway::new());
        gateway.stub("GET", "users/mine", json!({"Id": 7}));
        gateway.stub("GET", "L10/7/list", json!([{"Id": 1, "Name": "Sync"}]));

        let client = Client::with_gateway(Arc::clone(&gateway) as Arc<dyn ApiGateway>);
        let meetings = client.meetings().list(None).await.unwrap();
        assert_eq!(meetings[0].title, "Sync");
    }
}
