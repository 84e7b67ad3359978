use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};

use super::{
    from_mapped, from_mapped_list, optional_string, optional_u64, reject_both_filters,
    string_field, u64_field,
};
use crate::core::bulk::{self, BulkResult};
use crate::core::error::{BloomyError, Result};
use crate::core::session::Session;
use crate::gateway::ApiGateway;
use crate::mapper::{complete_label, field, field_with, FieldSpec};
use crate::models::TodoItem;
use crate::DEFAULT_MAX_CONCURRENT;

const TODO_FIELDS: &[FieldSpec] = &[
    field("Id", "id"),
    field("Name", "title"),
    field("DetailsUrl", "notes_url"),
    field("DueDate", "due_date"),
    field("CreateTime", "created_at"),
    field("CompleteTime", "completed_at"),
    field_with("Complete", "status", complete_label),
];

const TODO_REQUIRED_FIELDS: &[&str] = &["title", "meeting_id"];

/// Operations on todos, reachable as `client.todos()`.
pub struct TodoOperations {
    gateway: Arc<dyn ApiGateway>,
    session: Arc<Session>,
}

impl TodoOperations {
    pub(crate) fn new(gateway: Arc<dyn ApiGateway>, session: Arc<Session>) -> Self {
        Self { gateway, session }
    }

    async fn resolve_user_id(&self, user_id: Option<u64>) -> Result<u64> {
        match user_id {
            Some(id) => Ok(id),
            None => self.session.current_user_id(self.gateway.as_ref()).await,
        }
    }

    /// List todos for a user (default: the current user) or a meeting.
    pub async fn list(
        &self,
        user_id: Option<u64>,
        meeting_id: Option<u64>,
    ) -> Result<Vec<TodoItem>> {
        reject_both_filters(user_id, meeting_id)?;

        let data = if let Some(meeting_id) = meeting_id {
            self.gateway.get(&format!("l10/{meeting_id}/todos")).await?
        } else {
            let user_id = self.resolve_user_id(user_id).await?;
            self.gateway.get(&format!("todo/user/{user_id}")).await?
        };

        from_mapped_list(&data, TODO_FIELDS)
    }

    pub async fn create(
        &self,
        title: &str,
        meeting_id: u64,
        due_date: Option<&str>,
        user_id: Option<u64>,
        notes: Option<&str>,
    ) -> Result<TodoItem> {
        let user_id = self.resolve_user_id(user_id).await?;

        let mut payload = json!({
            "title": title,
            "accountableUserId": user_id,
            "notes": notes,
        });
        if let Some(due_date) = due_date {
            payload["dueDate"] = json!(due_date);
        }

        let data = self
            .gateway
            .post(&format!("L10/{meeting_id}/todos"), &payload)
            .await?;

        Ok(TodoItem {
            id: data
                .get("Id")
                .and_then(Value::as_u64)
                .ok_or_else(|| BloomyError::Decode("todo create response missing Id".to_string()))?,
            title: data
                .get("Name")
                .and_then(Value::as_str)
                .unwrap_or(title)
                .to_string(),
            notes_url: data
                .get("DetailsUrl")
                .and_then(Value::as_str)
                .map(str::to_string),
            due_date: data
                .get("DueDate")
                .and_then(Value::as_str)
                .or(due_date)
                .map(str::to_string),
            created_at: Some(Utc::now().to_rfc3339()),
            completed_at: None,
            status: "Incomplete".to_string(),
        })
    }

    /// Mark a todo as complete.
    pub async fn complete(&self, todo_id: u64) -> Result<bool> {
        self.gateway
            .post_empty(&format!("todo/{todo_id}/complete?status=true"))
            .await?;
        Ok(true)
    }

    /// Update a todo's title and/or due date. At least one field must be
    /// provided.
    pub async fn update(
        &self,
        todo_id: u64,
        title: Option<&str>,
        due_date: Option<&str>,
    ) -> Result<TodoItem> {
        let mut payload = serde_json::Map::new();
        if let Some(title) = title {
            payload.insert("title".to_string(), json!(title));
        }
        if let Some(due_date) = due_date {
            payload.insert("dueDate".to_string(), json!(due_date));
        }
        if payload.is_empty() {
            return Err(BloomyError::Validation(
                "At least one field must be provided".to_string(),
            ));
        }

        self.gateway
            .put(&format!("todo/{todo_id}"), &Value::Object(payload))
            .await?;

        Ok(TodoItem {
            id: todo_id,
            title: title.unwrap_or_default().to_string(),
            notes_url: None,
            due_date: due_date.map(str::to_string),
            created_at: None,
            completed_at: None,
            status: "Incomplete".to_string(),
        })
    }

    pub async fn details(&self, todo_id: u64) -> Result<TodoItem> {
        let data = self.gateway.get(&format!("todo/{todo_id}")).await?;
        from_mapped(&data, TODO_FIELDS)
    }

    /// Create many todos one at a time, in input order. Items need
    /// `title` and `meeting_id`; `due_date`, `user_id` and `notes` are
    /// optional.
    pub async fn create_many(&self, todos: Vec<Value>) -> BulkResult<TodoItem> {
        bulk::execute_sequential(todos, TODO_REQUIRED_FIELDS, |item| self.create_from(item)).await
    }

    /// Create many todos with at most `max_concurrent` requests in
    /// flight (default 5). Results are in completion order.
    pub async fn create_many_concurrent(
        &self,
        todos: Vec<Value>,
        max_concurrent: Option<usize>,
    ) -> Result<BulkResult<TodoItem>> {
        bulk::execute_concurrent(
            todos,
            TODO_REQUIRED_FIELDS,
            |item| self.create_from(item),
            max_concurrent.unwrap_or(DEFAULT_MAX_CONCURRENT),
        )
        .await
    }

    async fn create_from(&self, item: Value) -> Result<TodoItem> {
        let title = string_field(&item, "title")?;
        let meeting_id = u64_field(&item, "meeting_id")?;
        let due_date = optional_string(&item, "due_date");
        let user_id = optional_u64(&item, "user_id");
        let notes = optional_string(&item, "notes");

        self.create(
            &title,
            meeting_id,
            due_date.as_deref(),
            user_id,
            notes.as_deref(),
        )
        .await
    }
}
