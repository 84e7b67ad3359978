use std::sync::Arc;

use serde_json::{json, Value};

use super::{
    from_mapped, from_mapped_list, optional_string, optional_u64, reject_both_filters,
    string_field, u64_field,
};
use crate::core::bulk::{self, BulkResult};
use crate::core::error::{BloomyError, Result};
use crate::core::session::Session;
use crate::gateway::ApiGateway;
use crate::mapper::{bool_flag, field, field_with, FieldSpec};
use crate::models::{HeadlineDetails, HeadlineInfo, HeadlineListItem, OwnerDetails};
use crate::DEFAULT_MAX_CONCURRENT;

const HEADLINE_FIELDS: &[FieldSpec] = &[
    field("Id", "id"),
    field("Name", "title"),
    field("DetailsUrl", "notes_url"),
    field("OriginId", "meeting_details.id"),
    field("Origin", "meeting_details.title"),
    field("Owner.Id", "owner_details.id"),
    field("Owner.Name", "owner_details.name"),
    field_with("Archived", "archived", bool_flag),
    field("CreateTime", "created_at"),
    field("CloseTime", "closed_at"),
];

const HEADLINE_REQUIRED_FIELDS: &[&str] = &["title", "meeting_id"];

/// Operations on headlines, reachable as `client.headlines()`.
pub struct HeadlineOperations {
    gateway: Arc<dyn ApiGateway>,
    session: Arc<Session>,
}

impl HeadlineOperations {
    pub(crate) fn new(gateway: Arc<dyn ApiGateway>, session: Arc<Session>) -> Self {
        Self { gateway, session }
    }

    async fn resolve_user_id(&self, user_id: Option<u64>) -> Result<u64> {
        match user_id {
            Some(id) => Ok(id),
            None => self.session.current_user_id(self.gateway.as_ref()).await,
        }
    }

    pub async fn create(
        &self,
        meeting_id: u64,
        title: &str,
        owner_id: Option<u64>,
        notes: Option<&str>,
    ) -> Result<HeadlineInfo> {
        let owner_id = self.resolve_user_id(owner_id).await?;

        let mut payload = json!({"title": title, "ownerId": owner_id});
        if let Some(notes) = notes {
            payload["notes"] = json!(notes);
        }

        let data = self
            .gateway
            .post(&format!("L10/{meeting_id}/headlines"), &payload)
            .await?;

        Ok(HeadlineInfo {
            id: data.get("Id").and_then(Value::as_u64).ok_or_else(|| {
                BloomyError::Decode("headline create response missing Id".to_string())
            })?,
            title: data
                .get("Name")
                .and_then(Value::as_str)
                .unwrap_or(title)
                .to_string(),
            owner_details: OwnerDetails {
                id: owner_id,
                name: None,
            },
            notes_url: data
                .get("DetailsUrl")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }

    pub async fn update(&self, headline_id: u64, title: &str) -> Result<()> {
        self.gateway
            .put(&format!("headline/{headline_id}"), &json!({"title": title}))
            .await?;
        Ok(())
    }

    pub async fn details(&self, headline_id: u64) -> Result<HeadlineDetails> {
        let data = self
            .gateway
            .get_with_params(
                &format!("headline/{headline_id}"),
                &[("Include_Origin", "true".to_string())],
            )
            .await?;
        from_mapped(&data, HEADLINE_FIELDS)
    }

    /// List headlines for a user (default: the current user) or a
    /// meeting.
    pub async fn list(
        &self,
        user_id: Option<u64>,
        meeting_id: Option<u64>,
    ) -> Result<Vec<HeadlineListItem>> {
        reject_both_filters(user_id, meeting_id)?;

        let data = if let Some(meeting_id) = meeting_id {
            self.gateway
                .get(&format!("l10/{meeting_id}/headlines"))
                .await?
        } else {
            let user_id = self.resolve_user_id(user_id).await?;
            self.gateway
                .get(&format!("headline/users/{user_id}"))
                .await?
        };

        from_mapped_list(&data, HEADLINE_FIELDS)
    }

    pub async fn delete(&self, headline_id: u64) -> Result<()> {
        self.gateway
            .delete(&format!("headline/{headline_id}"))
            .await?;
        Ok(())
    }

    /// Create many headlines one at a time, in input order. Items need
    /// `title` and `meeting_id`; `owner_id` and `notes` are optional.
    pub async fn create_many(&self, headlines: Vec<Value>) -> BulkResult<HeadlineInfo> {
        bulk::execute_sequential(headlines, HEADLINE_REQUIRED_FIELDS, |item| {
            self.create_from(item)
        })
        .await
    }

    /// Create many headlines with at most `max_concurrent` requests in
    /// flight (default 5). Results are in completion order.
    pub async fn create_many_concurrent(
        &self,
        headlines: Vec<Value>,
        max_concurrent: Option<usize>,
    ) -> Result<BulkResult<HeadlineInfo>> {
        bulk::execute_concurrent(
            headlines,
            HEADLINE_REQUIRED_FIELDS,
            |item| self.create_from(item),
            max_concurrent.unwrap_or(DEFAULT_MAX_CONCURRENT),
        )
        .await
    }

    async fn create_from(&self, item: Value) -> Result<HeadlineInfo> {
        let title = string_field(&item, "title")?;
        let meeting_id = u64_field(&item, "meeting_id")?;
        let owner_id = optional_u64(&item, "owner_id");
        let notes = optional_string(&item, "notes");
        self.create(meeting_id, &title, owner_id, notes.as_deref())
            .await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::gateway::testing::MockGateway;

    fn ops(gateway: Arc<MockGateway>) -> HeadlineOperations {
        let session = Session::new();
        session.set_user_id(123);
        HeadlineOperations::new(gateway, Arc::new(session))
    }

    fn sample_headline(id: u64) -> Value {
        json!({
            "Id": id,
            "Name": format!("Headline {id}"),
            "DetailsUrl": "https://example.com/h",
            "OriginId": 456,
            "Origin": "Weekly Sync",
            "Owner": {"Id": 123, "Name": "John Doe"},
            "Archived": false,
            "CreateTime": "2024-06-01T00:00:00Z",
            "CloseTime": null,
        })
    }

    #[tokio::test]
    async fn create_defaults_owner_to_current_user() {
        let gateway = Arc::new(MockGateway::new());
        gateway.stub(
            "POST",
            "L10/456/headlines",
            json!({"Id": 5, "Name": "News", "DetailsUrl": "u"}),
        );

        let headline = ops(Arc::clone(&gateway))
            .create(456, "News", None, None)
            .await
            .unwrap();

        assert_eq!(headline.id, 5);
        assert_eq!(headline.owner_details.id, 123);
        assert_eq!(headline.owner_details.name, None);

        let body = gateway.calls()[0].body.clone().unwrap();
        assert_eq!(body["ownerId"], 123);
    }

    #[tokio::test]
    async fn details_builds_nested_models() {
        let gateway = Arc::new(MockGateway::new());
        gateway.stub("GET", "headline/9", sample_headline(9));

        let details = ops(gateway).details(9).await.unwrap();
        assert_eq!(details.id, 9);
        assert_eq!(details.meeting_details.id, Some(456));
        assert_eq!(details.meeting_details.title.as_deref(), Some("Weekly Sync"));
        assert_eq!(details.owner_details.name.as_deref(), Some("John Doe"));
        assert!(!details.archived);
    }

    #[tokio::test]
    async fn list_by_meeting_uses_l10_path() {
        let gateway = Arc::new(MockGateway::new());
        gateway.stub("GET", "l10/456/headlines", json!([sample_headline(1)]));

        let headlines = ops(Arc::clone(&gateway))
            .list(None, Some(456))
            .await
            .unwrap();
        assert_eq!(headlines.len(), 1);
        assert_eq!(gateway.calls()[0].path, "l10/456/headlines");
    }

    #[tokio::test]
    async fn list_rejects_both_filters() {
        let gateway = Arc::new(MockGateway::new());
        let err = ops(gateway).list(Some(1), Some(2)).await.unwrap_err();
        assert!(matches!(err, BloomyError::Validation(_)));
    }

    #[tokio::test]
    async fn create_many_validates_meeting_id() {
        let gateway = Arc::new(MockGateway::new());
        gateway.stub(
            "POST",
            "L10/1/headlines",
            json!({"Id": 1, "Name": "A", "DetailsUrl": "u"}),
        );

        let items = vec![
            json!({"title": "A", "meeting_id": 1}),
            json!({"title": "B"}),
        ];

        let result = ops(gateway).create_many(items).await;
        assert_eq!(result.success_count(), 1);
        assert_eq!(result.failed[0].index, 1);
        assert!(result.failed[0].error.contains("meeting_id is required"));
    }
}
