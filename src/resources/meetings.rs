use std::sync::Arc;

use serde_json::{json, Value};

use super::from_mapped_list;
use crate::core::error::{BloomyError, Result};
use crate::core::session::Session;
use crate::gateway::ApiGateway;
use crate::mapper::{complete_label, field, field_with, FieldSpec};
use crate::models::{
    AttendeeInfo, CreatedMeeting, MeetingDetails, MeetingIssue, MeetingListItem, MeetingTodo,
    MetricInfo,
};

const MEETING_LIST_FIELDS: &[FieldSpec] = &[field("Id", "id"), field("Name", "title")];

const ATTENDEE_FIELDS: &[FieldSpec] = &[field("Id", "id"), field("Name", "name")];

const MEETING_ISSUE_FIELDS: &[FieldSpec] = &[
    field("Id", "id"),
    field("Name", "title"),
    field("DetailsUrl", "notes_url"),
    field("CreateTime", "created_at"),
    field("CloseTime", "completed_at"),
    field("Owner.Id", "user_id"),
    field("Owner.Name", "user_name"),
    field("Origin", "meeting_title"),
];

const MEETING_TODO_FIELDS: &[FieldSpec] = &[
    field("Id", "id"),
    field("Name", "title"),
    field("DueDate", "due_date"),
    field("DetailsUrl", "notes_url"),
    field_with("Complete", "status", complete_label),
    field("CreateTime", "created_at"),
    field("CompleteTime", "completed_at"),
    field("Owner.Id", "user_id"),
    field("Owner.Name", "user_name"),
];

/// Operations on L10 meetings, reachable as `client.meetings()`.
pub struct MeetingOperations {
    gateway: Arc<dyn ApiGateway>,
    session: Arc<Session>,
}

impl MeetingOperations {
    pub(crate) fn new(gateway: Arc<dyn ApiGateway>, session: Arc<Session>) -> Self {
        Self { gateway, session }
    }

    async fn resolve_user_id(&self, user_id: Option<u64>) -> Result<u64> {
        match user_id {
            Some(id) => Ok(id),
            None => self.session.current_user_id(self.gateway.as_ref()).await,
        }
    }

    /// List meetings visible to a user (default: the current user).
    pub async fn list(&self, user_id: Option<u64>) -> Result<Vec<MeetingListItem>> {
        let user_id = self.resolve_user_id(user_id).await?;
        let data = self.gateway.get(&format!("L10/{user_id}/list")).await?;
        from_mapped_list(&data, MEETING_LIST_FIELDS)
    }

    pub async fn attendees(&self, meeting_id: u64) -> Result<Vec<AttendeeInfo>> {
        let data = self
            .gateway
            .get(&format!("L10/{meeting_id}/attendees"))
            .await?;
        from_mapped_list(&data, ATTENDEE_FIELDS)
    }

    pub async fn issues(
        &self,
        meeting_id: u64,
        include_closed: bool,
    ) -> Result<Vec<MeetingIssue>> {
        let data = self
            .gateway
            .get_with_params(
                &format!("L10/{meeting_id}/issues"),
                &[("include_resolved", include_closed.to_string())],
            )
            .await?;

        let mut mapped = crate::mapper::map_list(&data, MEETING_ISSUE_FIELDS);
        for record in &mut mapped {
            record["meeting_id"] = json!(meeting_id);
        }
        mapped
            .into_iter()
            .map(|record| serde_json::from_value(record).map_err(Into::into))
            .collect()
    }

    pub async fn todos(&self, meeting_id: u64, include_closed: bool) -> Result<Vec<MeetingTodo>> {
        let data = self
            .gateway
            .get_with_params(
                &format!("L10/{meeting_id}/todos"),
                &[("INCLUDE_CLOSED", include_closed.to_string())],
            )
            .await?;
        from_mapped_list(&data, MEETING_TODO_FIELDS)
    }

    /// Measurables attached to a meeting. Records missing an id or name
    /// are skipped rather than failing the whole list.
    pub async fn metrics(&self, meeting_id: u64) -> Result<Vec<MetricInfo>> {
        let data = self
            .gateway
            .get(&format!("L10/{meeting_id}/measurables"))
            .await?;

        let Some(entries) = data.as_array() else {
            return Ok(Vec::new());
        };

        let mut metrics = Vec::new();
        for entry in entries {
            let (Some(id), Some(name)) = (
                entry.get("Id").and_then(Value::as_u64),
                entry.get("Name").and_then(Value::as_str),
            ) else {
                continue;
            };

            metrics.push(MetricInfo {
                id,
                title: name.trim().to_string(),
                target: entry.get("Target").and_then(Value::as_f64).unwrap_or(0.0),
                operator: entry
                    .get("Direction")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                format: entry
                    .get("Modifiers")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                user_id: entry
                    .get("Owner")
                    .and_then(|owner| owner.get("Id"))
                    .and_then(Value::as_u64),
                user_name: entry
                    .get("Owner")
                    .and_then(|owner| owner.get("Name"))
                    .and_then(Value::as_str)
                    .map(str::to_string),
                admin_id: entry
                    .get("Admin")
                    .and_then(|admin| admin.get("Id"))
                    .and_then(Value::as_u64),
                admin_name: entry
                    .get("Admin")
                    .and_then(|admin| admin.get("Name"))
                    .and_then(Value::as_str)
                    .map(str::to_string),
            });
        }

        Ok(metrics)
    }

    /// Full meeting view composed of the list entry plus attendees,
    /// issues, todos and metrics. Unknown ids are `NotFound`.
    pub async fn details(&self, meeting_id: u64, include_closed: bool) -> Result<MeetingDetails> {
        let meetings = self.list(None).await?;
        let meeting = meetings
            .into_iter()
            .find(|m| m.id == meeting_id)
            .ok_or_else(|| BloomyError::NotFound(format!("Meeting with ID {meeting_id}")))?;

        Ok(MeetingDetails {
            id: meeting.id,
            title: meeting.title,
            attendees: self.attendees(meeting_id).await?,
            issues: self.issues(meeting_id, include_closed).await?,
            todos: self.todos(meeting_id, include_closed).await?,
            metrics: self.metrics(meeting_id).await?,
        })
    }

    /// Create a meeting, then add each listed attendee to it.
    pub async fn create(
        &self,
        title: &str,
        add_self: bool,
        attendees: &[u64],
    ) -> Result<CreatedMeeting> {
        let payload = json!({"title": title, "addSelf": add_self});
        let data = self.gateway.post("L10/create", &payload).await?;

        let meeting_id = data
            .get("meetingId")
            .and_then(Value::as_u64)
            .ok_or_else(|| {
                BloomyError::Decode("meeting create response missing meetingId".to_string())
            })?;

        for attendee_id in attendees {
            self.gateway
                .post_empty(&format!("L10/{meeting_id}/attendees/{attendee_id}"))
                .await?;
        }

        Ok(CreatedMeeting {
            meeting_id,
            title: title.to_string(),
            attendees: attendees.to_vec(),
        })
    }

    pub async fn delete(&self, meeting_id: u64) -> Result<()> {
        self.gateway.delete(&format!("L10/{meeting_id}")).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::gateway::testing::MockGateway;

    fn ops(gateway: Arc<MockGateway>) -> MeetingOperations {
        let session = Session::new();
        session.set_user_id(123);
        MeetingOperations::new(gateway, Arc::new(session))
    }

    #[tokio::test]
    async fn list_maps_ids_and_titles() {
        let gateway = Arc::new(MockGateway::new());
        gateway.stub(
            "GET",
            "L10/123/list",
            json!([{"Id": 1, "Name": "Team Meeting"}]),
        );

        let meetings = ops(gateway).list(None).await.unwrap();
        assert_eq!(meetings[0].id, 1);
        assert_eq!(meetings[0].title, "Team Meeting");
    }

    #[tokio::test]
    async fn issues_inject_meeting_id() {
        let gateway = Arc::new(MockGateway::new());
        gateway.stub(
            "GET",
            "L10/456/issues",
            json!([{
                "Id": 2, "Name": "Issue", "DetailsUrl": "u",
                "CreateTime": "2024-06-10", "CloseTime": null,
                "Owner": {"Id": 1, "Name": "John"}, "Origin": "Team Meeting",
            }]),
        );

        let issues = ops(gateway).issues(456, false).await.unwrap();
        assert_eq!(issues[0].meeting_id, 456);
        assert_eq!(issues[0].meeting_title.as_deref(), Some("Team Meeting"));
    }

    #[tokio::test]
    async fn metrics_skip_incomplete_records() {
        let gateway = Arc::new(MockGateway::new());
        gateway.stub(
            "GET",
            "L10/456/measurables",
            json!([
                {"Id": 1, "Name": " Sales ", "Target": 100, "Direction": ">",
                 "Modifiers": "currency", "Owner": {"Id": 9, "Name": "J"}},
                {"Id": null, "Name": "No id"},
                {"Name": "Also no id"},
            ]),
        );

        let metrics = ops(gateway).metrics(456).await.unwrap();
        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics[0].title, "Sales");
        assert_eq!(metrics[0].target, 100.0);
        assert_eq!(metrics[0].user_id, Some(9));
    }

    #[tokio::test]
    async fn metrics_on_non_array_is_empty() {
        let gateway = Arc::new(MockGateway::new());
        gateway.stub("GET", "L10/456/measurables", json!({"unexpected": true}));

        let metrics = ops(gateway).metrics(456).await.unwrap();
        assert!(metrics.is_empty());
    }

    #[tokio::test]
    async fn details_unknown_meeting_is_not_found() {
        let gateway = Arc::new(MockGateway::new());
        gateway.stub("GET", "L10/123/list", json!([{"Id": 1, "Name": "Other"}]));

        let err = ops(gateway).details(999, false).await.unwrap_err();
        assert!(matches!(err, BloomyError::NotFound(_)));
    }

    #[tokio::test]
    async fn create_adds_attendees_after_creation() {
        let gateway = Arc::new(MockGateway::new());
        gateway.stub("POST", "L10/create", json!({"meetingId": 55}));
        gateway.stub("POST", "L10/55/attendees/2", Value::Null);
        gateway.stub("POST", "L10/55/attendees/3", Value::Null);

        let created = ops(Arc::clone(&gateway))
            .create("New Meeting", true, &[2, 3])
            .await
            .unwrap();

        assert_eq!(created.meeting_id, 55);
        assert_eq!(created.attendees, vec![2, 3]);
        assert_eq!(gateway.calls().len(), 3);
    }
}
