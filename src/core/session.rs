use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::debug;

use super::error::{BloomyError, Result};
use crate::gateway::ApiGateway;

/// Per-client session state.
///
/// Holds the memoized id of the authenticated user: fetched from
/// `users/mine` at most once per client lifetime, with concurrent first
/// callers coalescing on the same fetch.
#[derive(Debug, Default)]
pub struct Session {
    user_id: OnceCell<u64>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the user id without a network call. A no-op when already set.
    pub fn set_user_id(&self, user_id: u64) {
        let _ = self.user_id.set(user_id);
    }

    pub async fn current_user_id(&self, gateway: &dyn ApiGateway) -> Result<u64> {
        self.user_id
            .get_or_try_init(|| async {
                debug!("Fetching current user id from users/mine");
                let data = gateway.get("users/mine").await?;
                data.get("Id").and_then(Value::as_u64).ok_or_else(|| {
                    BloomyError::Decode("users/mine response missing Id".to_string())
                })
            })
            .await
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::gateway::testing::MockGateway;

    #[tokio::test]
    async fn fetches_user_id_once() {
        let gateway = MockGateway::new();
        gateway.stub("GET", "users/mine", json!({"Id": 123, "Name": "John Doe"}));

        let session = Session::new();
        assert_eq!(session.current_user_id(&gateway).await.unwrap(), 123);
        // Second call must not hit the gateway again; no second stub exists.
        assert_eq!(session.current_user_id(&gateway).await.unwrap(), 123);
        assert_eq!(gateway.calls().len(), 1);
    }

    #[tokio::test]
    async fn seeded_user_id_skips_fetch() {
        let gateway = MockGateway::new();
        let session = Session::new();
        session.set_user_id(42);

        assert_eq!(session.current_user_id(&gateway).await.unwrap(), 42);
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_id_field_is_decode_error() {
        let gateway = MockGateway::new();
        gateway.stub("GET", "users/mine", json!({"Name": "No Id"}));

        let session = Session::new();
        let err = session.current_user_id(&gateway).await.unwrap_err();
        assert!(matches!(err, BloomyError::Decode(_)));
    }
}
