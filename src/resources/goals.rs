use std::sync::Arc;

use serde_json::{json, Value};

use super::{from_mapped_list, optional_u64, string_field, u64_field};
use crate::core::bulk::{self, BulkResult};
use crate::core::error::{BloomyError, Result};
use crate::core::session::Session;
use crate::gateway::ApiGateway;
use crate::mapper::{field, field_with, FieldSpec};
use crate::models::{ArchivedGoalInfo, CreatedGoalInfo, GoalInfo, GoalListResponse, GoalStatus};
use crate::DEFAULT_MAX_CONCURRENT;

const GOAL_FIELDS: &[FieldSpec] = &[
    field("Id", "id"),
    field("Owner.Id", "user_id"),
    field("Owner.Name", "user_name"),
    field("Name", "title"),
    field("CreateTime", "created_at"),
    field("DueDate", "due_date"),
    field_with("Complete", "status", completed_label),
    field("Origins.0.Id", "meeting_id"),
    field("Origins.0.Name", "meeting_title"),
];

const ARCHIVED_GOAL_FIELDS: &[FieldSpec] = &[
    field("Id", "id"),
    field("Name", "title"),
    field("CreateTime", "created_at"),
    field("DueDate", "due_date"),
    field_with("Complete", "status", archived_label),
];

const GOAL_REQUIRED_FIELDS: &[&str] = &["title", "meeting_id"];

fn completed_label(value: &Value) -> Value {
    Value::String(
        if value.as_bool().unwrap_or(false) {
            "Completed"
        } else {
            "Incomplete"
        }
        .to_string(),
    )
}

fn archived_label(value: &Value) -> Value {
    Value::String(
        if value.as_bool().unwrap_or(false) {
            "Complete"
        } else {
            "Incomplete"
        }
        .to_string(),
    )
}

/// Operations on goals ("rocks"), reachable as `client.goals()`.
pub struct GoalOperations {
    gateway: Arc<dyn ApiGateway>,
    session: Arc<Session>,
}

impl GoalOperations {
    pub(crate) fn new(gateway: Arc<dyn ApiGateway>, session: Arc<Session>) -> Self {
        Self { gateway, session }
    }

    async fn resolve_user_id(&self, user_id: Option<u64>) -> Result<u64> {
        match user_id {
            Some(id) => Ok(id),
            None => self.session.current_user_id(self.gateway.as_ref()).await,
        }
    }

    /// List active goals for a user (default: the current user).
    pub async fn list(&self, user_id: Option<u64>) -> Result<Vec<GoalInfo>> {
        let user_id = self.resolve_user_id(user_id).await?;
        let data = self
            .gateway
            .get_with_params(
                &format!("rocks/user/{user_id}"),
                &[("include_origin", "true".to_string())],
            )
            .await?;
        from_mapped_list(&data, GOAL_FIELDS)
    }

    /// List both active and archived goals for a user.
    pub async fn list_with_archived(&self, user_id: Option<u64>) -> Result<GoalListResponse> {
        let user_id = self.resolve_user_id(user_id).await?;
        Ok(GoalListResponse {
            active: self.list(Some(user_id)).await?,
            archived: self.archived_goals(user_id).await?,
        })
    }

    pub async fn create(
        &self,
        title: &str,
        meeting_id: u64,
        user_id: Option<u64>,
    ) -> Result<CreatedGoalInfo> {
        let user_id = self.resolve_user_id(user_id).await?;

        let payload = json!({"title": title, "accountableUserId": user_id});
        let data = self
            .gateway
            .post(&format!("L10/{meeting_id}/rocks"), &payload)
            .await?;

        let status = match data.get("Completion").and_then(Value::as_i64) {
            Some(2) => "complete",
            Some(1) => "on",
            _ => "off",
        };

        Ok(CreatedGoalInfo {
            id: data
                .get("Id")
                .and_then(Value::as_u64)
                .ok_or_else(|| BloomyError::Decode("goal create response missing Id".to_string()))?,
            user_id,
            user_name: data
                .get("Owner")
                .and_then(|owner| owner.get("Name"))
                .and_then(Value::as_str)
                .map(str::to_string),
            title: title.to_string(),
            meeting_id,
            meeting_title: data
                .get("Origins")
                .and_then(|origins| origins.get(0))
                .and_then(|origin| origin.get("Name"))
                .and_then(Value::as_str)
                .map(str::to_string),
            status: status.to_string(),
            created_at: data
                .get("CreateTime")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }

    pub async fn delete(&self, goal_id: u64) -> Result<()> {
        self.gateway.delete(&format!("rocks/{goal_id}")).await?;
        Ok(())
    }

    /// Update a goal's title, accountable user and/or completion status.
    pub async fn update(
        &self,
        goal_id: u64,
        title: Option<&str>,
        accountable_user: Option<u64>,
        status: Option<GoalStatus>,
    ) -> Result<()> {
        let accountable_user = self.resolve_user_id(accountable_user).await?;

        let mut payload = json!({"accountableUserId": accountable_user});
        if let Some(title) = title {
            payload["title"] = json!(title);
        }
        if let Some(status) = status {
            payload["completion"] = json!(status.as_remote());
        }

        self.gateway
            .put(&format!("rocks/{goal_id}"), &payload)
            .await?;
        Ok(())
    }

    pub async fn archive(&self, goal_id: u64) -> Result<()> {
        self.gateway
            .put_empty(&format!("rocks/{goal_id}/archive"))
            .await?;
        Ok(())
    }

    pub async fn restore(&self, goal_id: u64) -> Result<()> {
        self.gateway
            .put_empty(&format!("rocks/{goal_id}/restore"))
            .await?;
        Ok(())
    }

    async fn archived_goals(&self, user_id: u64) -> Result<Vec<ArchivedGoalInfo>> {
        let data = self
            .gateway
            .get(&format!("archivedrocks/user/{user_id}"))
            .await?;
        from_mapped_list(&data, ARCHIVED_GOAL_FIELDS)
    }

    /// Create many goals one at a time, in input order. Items need
    /// `title` and `meeting_id`; `user_id` is optional.
    pub async fn create_many(&self, goals: Vec<Value>) -> BulkResult<CreatedGoalInfo> {
        bulk::execute_sequential(goals, GOAL_REQUIRED_FIELDS, |item| self.create_from(item)).await
    }

    /// Create many goals with at most `max_concurrent` requests in
    /// flight (default 5). Results are in completion order.
    pub async fn create_many_concurrent(
        &self,
        goals: Vec<Value>,
        max_concurrent: Option<usize>,
    ) -> Result<BulkResult<CreatedGoalInfo>> {
        bulk::execute_concurrent(
            goals,
            GOAL_REQUIRED_FIELDS,
            |item| self.create_from(item),
            max_concurrent.unwrap_or(DEFAULT_MAX_CONCURRENT),
        )
        .await
    }

    async fn create_from(&self, item: Value) -> Result<CreatedGoalInfo> {
        let title = string_field(&item, "title")?;
        let meeting_id = u64_field(&item, "meeting_id")?;
        let user_id = optional_u64(&item, "user_id");
        self.create(&title, meeting_id, user_id).await
    }
}
