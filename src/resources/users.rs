use std::sync::Arc;

use serde_json::Value;

use super::from_mapped_list;
use crate::core::error::{BloomyError, Result};
use crate::core::session::Session;
use crate::gateway::ApiGateway;
use crate::mapper::{field, map_record, FieldSpec};
use crate::models::{DirectReport, UserDetails, UserListItem, UserPosition, UserSearchResult};

const PLACEHOLDER_IMAGE: &str = "/i/userplaceholder";

const DIRECT_REPORT_FIELDS: &[FieldSpec] = &[
    field("Id", "id"),
    field("Name", "name"),
    field("ImageUrl", "image_url"),
];

const POSITION_FIELDS: &[FieldSpec] = &[
    field("Group.Position.Id", "id"),
    field("Group.Position.Name", "name"),
];

const SEARCH_FIELDS: &[FieldSpec] = &[
    field("Id", "id"),
    field("Name", "name"),
    field("Description", "description"),
    field("Email", "email"),
    field("OrganizationId", "organization_id"),
    field("ImageUrl", "image_url"),
];

const USER_LIST_FIELDS: &[FieldSpec] = &[
    field("Id", "id"),
    field("Name", "name"),
    field("Email", "email"),
    field("Description", "position"),
    field("ImageUrl", "image_url"),
];

/// What to attach to a [`UserDetails`] lookup beyond the base record.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserDetailOptions {
    pub direct_reports: bool,
    pub positions: bool,
    pub all: bool,
}

/// Operations on users, reachable as `client.users()`.
pub struct UserOperations {
    gateway: Arc<dyn ApiGateway>,
    session: Arc<Session>,
}

impl UserOperations {
    pub(crate) fn new(gateway: Arc<dyn ApiGateway>, session: Arc<Session>) -> Self {
        Self { gateway, session }
    }

    async fn resolve_user_id(&self, user_id: Option<u64>) -> Result<u64> {
        match user_id {
            Some(id) => Ok(id),
            None => self.session.current_user_id(self.gateway.as_ref()).await,
        }
    }

    /// Details for a user (default: the current user), optionally with
    /// direct reports and positions attached.
    pub async fn details(
        &self,
        user_id: Option<u64>,
        options: UserDetailOptions,
    ) -> Result<UserDetails> {
        let user_id = self.resolve_user_id(user_id).await?;
        let data = self.gateway.get(&format!("users/{user_id}")).await?;

        let mut details = UserDetails {
            id: data
                .get("Id")
                .and_then(Value::as_u64)
                .ok_or_else(|| BloomyError::Decode("user response missing Id".to_string()))?,
            name: data
                .get("Name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            image_url: data
                .get("ImageUrl")
                .and_then(Value::as_str)
                .map(str::to_string),
            direct_reports: None,
            positions: None,
        };

        if options.direct_reports || options.all {
            details.direct_reports = Some(self.direct_reports(Some(user_id)).await?);
        }
        if options.positions || options.all {
            details.positions = Some(self.positions(Some(user_id)).await?);
        }

        Ok(details)
    }

    pub async fn direct_reports(&self, user_id: Option<u64>) -> Result<Vec<DirectReport>> {
        let user_id = self.resolve_user_id(user_id).await?;
        let data = self
            .gateway
            .get(&format!("users/{user_id}/directreports"))
            .await?;
        from_mapped_list(&data, DIRECT_REPORT_FIELDS)
    }

    pub async fn positions(&self, user_id: Option<u64>) -> Result<Vec<UserPosition>> {
        let user_id = self.resolve_user_id(user_id).await?;
        let data = self.gateway.get(&format!("users/{user_id}/seats")).await?;
        from_mapped_list(&data, POSITION_FIELDS)
    }

    pub async fn search(&self, term: &str) -> Result<Vec<UserSearchResult>> {
        let data = self
            .gateway
            .get_with_params("search/user", &[("term", term.to_string())])
            .await?;
        from_mapped_list(&data, SEARCH_FIELDS)
    }

    /// All users in the organization. Placeholder accounts (the default
    /// avatar) are filtered out unless requested.
    pub async fn all(&self, include_placeholders: bool) -> Result<Vec<UserListItem>> {
        let data = self
            .gateway
            .get_with_params("search/all", &[("term", "%".to_string())])
            .await?;

        let users = data
            .as_array()
            .map(|entries| {
                entries
                    .iter()
                    .filter(|entry| {
                        entry.get("ResultType").and_then(Value::as_str) == Some("User")
                            && (include_placeholders
                                || entry.get("ImageUrl").and_then(Value::as_str)
                                    != Some(PLACEHOLDER_IMAGE))
                    })
                    .map(|entry| {
                        serde_json::from_value(map_record(entry, USER_LIST_FIELDS))
                            .map_err(Into::into)
                    })
                    .collect::<Result<Vec<UserListItem>>>()
            })
            .transpose()?;

        Ok(users.unwrap_or_default())
    }
}
