//! Typed records produced by the resource facades.

use serde::{Deserialize, Serialize};

use crate::core::error::{BloomyError, Result};

// --- users ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDetails {
    pub id: u64,
    pub name: String,
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direct_reports: Option<Vec<DirectReport>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub positions: Option<Vec<UserPosition>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectReport {
    pub id: u64,
    pub name: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPosition {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSearchResult {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub email: Option<String>,
    pub organization_id: Option<u64>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserListItem {
    pub id: u64,
    pub name: String,
    pub email: Option<String>,
    pub position: Option<String>,
    pub image_url: Option<String>,
}

// --- meetings ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingListItem {
    pub id: u64,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendeeInfo {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingIssue {
    pub id: u64,
    pub title: String,
    pub notes_url: Option<String>,
    pub created_at: Option<String>,
    pub completed_at: Option<String>,
    pub user_id: Option<u64>,
    pub user_name: Option<String>,
    #[serde(default)]
    pub meeting_id: u64,
    pub meeting_title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingTodo {
    pub id: u64,
    pub title: String,
    pub due_date: Option<String>,
    pub notes_url: Option<String>,
    pub status: String,
    pub created_at: Option<String>,
    pub completed_at: Option<String>,
    pub user_id: Option<u64>,
    pub user_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricInfo {
    pub id: u64,
    pub title: String,
    pub target: f64,
    pub operator: String,
    pub format: String,
    pub user_id: Option<u64>,
    pub user_name: Option<String>,
    pub admin_id: Option<u64>,
    pub admin_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingDetails {
    pub id: u64,
    pub title: String,
    pub attendees: Vec<AttendeeInfo>,
    pub issues: Vec<MeetingIssue>,
    pub todos: Vec<MeetingTodo>,
    pub metrics: Vec<MetricInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedMeeting {
    pub meeting_id: u64,
    pub title: String,
    pub attendees: Vec<u64>,
}

// --- todos ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: u64,
    pub title: String,
    pub notes_url: Option<String>,
    pub due_date: Option<String>,
    pub created_at: Option<String>,
    pub completed_at: Option<String>,
    pub status: String,
}

// --- goals ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalInfo {
    pub id: u64,
    pub user_id: Option<u64>,
    pub user_name: Option<String>,
    pub title: String,
    pub created_at: Option<String>,
    pub due_date: Option<String>,
    pub status: String,
    pub meeting_id: Option<u64>,
    pub meeting_title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchivedGoalInfo {
    pub id: u64,
    pub title: String,
    pub created_at: Option<String>,
    pub due_date: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedGoalInfo {
    pub id: u64,
    pub user_id: u64,
    pub user_name: Option<String>,
    pub title: String,
    pub meeting_id: u64,
    pub meeting_title: Option<String>,
    pub status: String,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalListResponse {
    pub active: Vec<GoalInfo>,
    pub archived: Vec<ArchivedGoalInfo>,
}

/// Goal completion state as accepted by `update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    On,
    Off,
    Complete,
}

impl GoalStatus {
    /// The remote API's name for this state.
    pub fn as_remote(self) -> &'static str {
        match self {
            Self::On => "OnTrack",
            Self::Off => "AtRisk",
            Self::Complete => "Complete",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "on" => Ok(Self::On),
            "off" => Ok(Self::Off),
            "complete" => Ok(Self::Complete),
            _ => Err(BloomyError::Validation(
                "Invalid status value. Must be 'on', 'off', or 'complete'.".to_string(),
            )),
        }
    }
}

// --- scorecards ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorecardWeek {
    pub id: u64,
    pub week_number: i64,
    pub week_start: String,
    pub week_end: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorecardItem {
    pub id: u64,
    pub measurable_id: u64,
    pub accountable_user_id: Option<u64>,
    pub title: String,
    pub target: Option<f64>,
    pub value: Option<f64>,
    pub week: Option<String>,
    pub week_id: i64,
    pub updated_at: Option<String>,
}

// --- issues ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueListItem {
    pub id: u64,
    pub title: String,
    pub notes_url: Option<String>,
    pub created_at: Option<String>,
    pub meeting_id: Option<u64>,
    pub meeting_title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueDetails {
    pub id: u64,
    pub title: String,
    pub notes_url: Option<String>,
    pub created_at: Option<String>,
    pub completed_at: Option<String>,
    pub meeting_id: Option<u64>,
    pub meeting_title: Option<String>,
    pub user_id: Option<u64>,
    pub user_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedIssue {
    pub id: u64,
    pub meeting_id: Option<u64>,
    pub meeting_title: Option<String>,
    pub title: String,
    pub user_id: Option<u64>,
    pub notes_url: Option<String>,
}

// --- headlines ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingInfo {
    pub id: Option<u64>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerDetails {
    pub id: u64,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadlineInfo {
    pub id: u64,
    pub title: String,
    pub owner_details: OwnerDetails,
    pub notes_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadlineDetails {
    pub id: u64,
    pub title: String,
    pub notes_url: Option<String>,
    pub meeting_details: MeetingInfo,
    pub owner_details: OwnerDetails,
    pub archived: bool,
    pub created_at: Option<String>,
    pub closed_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadlineListItem {
    pub id: u64,
    pub title: String,
    pub meeting_details: MeetingInfo,
    pub owner_details: OwnerDetails,
    pub archived: bool,
    pub created_at: Option<String>,
    pub closed_at: Option<String>,
}
