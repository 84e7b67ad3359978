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
use crate::mapper::{field, FieldSpec};
use crate::models::{CreatedIssue, IssueDetails, IssueListItem};
use crate::DEFAULT_MAX_CONCURRENT;

const ISSUE_DETAILS_FIELDS: &[FieldSpec] = &[
    field("Id", "id"),
    field("Name", "title"),
    field("DetailsUrl", "notes_url"),
    field("CreateTime", "created_at"),
    field("CloseTime", "completed_at"),
    field("OriginId", "meeting_id"),
    field("Origin", "meeting_title"),
    field("Owner.Id", "user_id"),
    field("Owner.Name", "user_name"),
];

const ISSUE_LIST_FIELDS: &[FieldSpec] = &[
    field("Id", "id"),
    field("Name", "title"),
    field("DetailsUrl", "notes_url"),
    field("CreateTime", "created_at"),
    field("OriginId", "meeting_id"),
    field("Origin", "meeting_title"),
];

const CREATED_ISSUE_FIELDS: &[FieldSpec] = &[
    field("Id", "id"),
    field("OriginId", "meeting_id"),
    field("Origin", "meeting_title"),
    field("Name", "title"),
    field("Owner.Id", "user_id"),
    field("DetailsUrl", "notes_url"),
];

const ISSUE_REQUIRED_FIELDS: &[&str] = &["meeting_id", "title"];

/// Operations on issues, reachable as `client.issues()`.
pub struct IssueOperations {
    gateway: Arc<dyn ApiGateway>,
    session: Arc<Session>,
}

impl IssueOperations {
    pub(crate) fn new(gateway: Arc<dyn ApiGateway>, session: Arc<Session>) -> Self {
        Self { gateway, session }
    }

    async fn resolve_user_id(&self, user_id: Option<u64>) -> Result<u64> {
        match user_id {
            Some(id) => Ok(id),
            None => self.session.current_user_id(self.gateway.as_ref()).await,
        }
    }

    pub async fn details(&self, issue_id: u64) -> Result<IssueDetails> {
        let data = self.gateway.get(&format!("issues/{issue_id}")).await?;
        from_mapped(&data, ISSUE_DETAILS_FIELDS)
    }

    /// List issues for a user (default: the current user) or a meeting.
    pub async fn list(
        &self,
        user_id: Option<u64>,
        meeting_id: Option<u64>,
    ) -> Result<Vec<IssueListItem>> {
        reject_both_filters(user_id, meeting_id)?;

        let data = if let Some(meeting_id) = meeting_id {
            self.gateway
                .get(&format!("l10/{meeting_id}/issues"))
                .await?
        } else {
            let user_id = self.resolve_user_id(user_id).await?;
            self.gateway
                .get(&format!("issues/users/{user_id}"))
                .await?
        };

        from_mapped_list(&data, ISSUE_LIST_FIELDS)
    }

    pub async fn create(
        &self,
        meeting_id: u64,
        title: &str,
        user_id: Option<u64>,
        notes: Option<&str>,
    ) -> Result<CreatedIssue> {
        let user_id = self.resolve_user_id(user_id).await?;

        let mut payload = json!({
            "title": title,
            "meetingid": meeting_id,
            "ownerid": user_id,
        });
        if let Some(notes) = notes {
            payload["notes"] = json!(notes);
        }

        let data = self.gateway.post("issues/create", &payload).await?;
        from_mapped(&data, CREATED_ISSUE_FIELDS)
    }

    /// Mark an issue as solved and return its refreshed details.
    pub async fn complete(&self, issue_id: u64) -> Result<IssueDetails> {
        self.gateway
            .post(
                &format!("issues/{issue_id}/complete"),
                &json!({"complete": true}),
            )
            .await?;
        self.details(issue_id).await
    }

    /// Update an issue's title and/or notes. At least one field must be
    /// provided.
    pub async fn update(
        &self,
        issue_id: u64,
        title: Option<&str>,
        notes: Option<&str>,
    ) -> Result<IssueDetails> {
        if title.is_none() && notes.is_none() {
            return Err(BloomyError::Validation(
                "At least one field (title or notes) must be provided for update".to_string(),
            ));
        }

        let mut payload = serde_json::Map::new();
        if let Some(title) = title {
            payload.insert("title".to_string(), json!(title));
        }
        if let Some(notes) = notes {
            payload.insert("notes".to_string(), json!(notes));
        }

        self.gateway
            .put(&format!("issues/{issue_id}"), &Value::Object(payload))
            .await?;

        self.details(issue_id).await
    }

    /// Create many issues one at a time, in input order. Items need
    /// `meeting_id` and `title`; `user_id` and `notes` are optional.
    pub async fn create_many(&self, issues: Vec<Value>) -> BulkResult<CreatedIssue> {
        bulk::execute_sequential(issues, ISSUE_REQUIRED_FIELDS, |item| self.create_from(item))
            .await
    }

    /// Create many issues with at most `max_concurrent` requests in
    /// flight (default 5). Results are in completion order.
    pub async fn create_many_concurrent(
        &self,
        issues: Vec<Value>,
        max_concurrent: Option<usize>,
    ) -> Result<BulkResult<CreatedIssue>> {
        bulk::execute_concurrent(
            issues,
            ISSUE_REQUIRED_FIELDS,
            |item| self.create_from(item),
            max_concurrent.unwrap_or(DEFAULT_MAX_CONCURRENT),
        )
        .await
    }

    async fn create_from(&self, item: Value) -> Result<CreatedIssue> {
        let meeting_id = u64_field(&item, "meeting_id")?;
        let title = string_field(&item, "title")?;
        let user_id = optional_u64(&item, "user_id");
        let notes = optional_string(&item, "notes");
        self.create(meeting_id, &title, user_id, notes.as_deref())
            .await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::gateway::testing::MockGateway;

    fn ops(gateway: Arc<MockGateway>) -> IssueOperations {
        let session = Session::new();
        session.set_user_id(123);
        IssueOperations::new(gateway, Arc::new(session))
    }

    fn sample_issue(id: u64) -> Value {
        json!({
            "Id": id,
            "Name": format!("Issue {id}"),
            "DetailsUrl": "https://example.com/issue",
            "CreateTime": "2024-06-10T00:00:00Z",
            "CloseTime": null,
            "OriginId": 456,
            "Origin": "Weekly Sync",
            "Owner": {"Id": 123, "Name": "John Doe"},
        })
    }

    #[tokio::test]
    async fn details_maps_owner_and_origin() {
        let gateway = Arc::new(MockGateway::new());
        gateway.stub("GET", "issues/7", sample_issue(7));

        let details = ops(gateway).details(7).await.unwrap();
        assert_eq!(details.id, 7);
        assert_eq!(details.meeting_id, Some(456));
        assert_eq!(details.user_name.as_deref(), Some("John Doe"));
        assert_eq!(details.completed_at, None);
    }

    #[tokio::test]
    async fn create_posts_lowercase_payload_keys() {
        let gateway = Arc::new(MockGateway::new());
        gateway.stub("POST", "issues/create", sample_issue(8));

        let created = ops(Arc::clone(&gateway))
            .create(456, "Issue 8", None, Some("details"))
            .await
            .unwrap();
        assert_eq!(created.id, 8);

        let body = gateway.calls()[0].body.clone().unwrap();
        assert_eq!(body["meetingid"], 456);
        assert_eq!(body["ownerid"], 123);
        assert_eq!(body["notes"], "details");
    }

    #[tokio::test]
    async fn complete_posts_then_refetches() {
        let gateway = Arc::new(MockGateway::new());
        gateway.stub("POST", "issues/7/complete", Value::Null);
        gateway.stub("GET", "issues/7", sample_issue(7));

        let details = ops(Arc::clone(&gateway)).complete(7).await.unwrap();
        assert_eq!(details.id, 7);

        let methods: Vec<&str> = gateway.calls().iter().map(|c| c.method).collect();
        assert_eq!(methods, vec!["POST", "GET"]);
    }

    #[tokio::test]
    async fn update_requires_a_field() {
        let gateway = Arc::new(MockGateway::new());
        let err = ops(gateway).update(7, None, None).await.unwrap_err();
        assert!(matches!(err, BloomyError::Validation(_)));
    }

    #[tokio::test]
    async fn create_many_isolates_server_failures() {
        let gateway = Arc::new(MockGateway::new());
        gateway.stub("POST", "issues/create", sample_issue(1));
        gateway.stub_error("POST", "issues/create", 500, "Server error");
        gateway.stub("POST", "issues/create", sample_issue(3));

        let items = vec![
            json!({"meeting_id": 456, "title": "Issue 1"}),
            json!({"meeting_id": 456, "title": "Issue 2"}),
            json!({"meeting_id": 456, "title": "Issue 3"}),
        ];

        let result = ops(gateway).create_many(items).await;

        assert_eq!(result.success_count(), 2);
        assert_eq!(result.failure_count(), 1);
        assert_eq!(result.failed[0].index, 1);
        assert_eq!(
            result.failed[0].input_data,
            json!({"meeting_id": 456, "title": "Issue 2"})
        );
        assert!(result.failed[0].error.contains("Server error"));
    }
}
