use std::sync::Arc;

use serde_json::{json, Value};

use super::reject_both_filters;
use crate::core::error::{BloomyError, Result};
use crate::core::session::Session;
use crate::gateway::ApiGateway;
use crate::mapper::{field, map_list, FieldSpec};
use crate::models::{ScorecardItem, ScorecardWeek};

const SCORE_FIELDS: &[FieldSpec] = &[
    field("Id", "id"),
    field("MeasurableId", "measurable_id"),
    field("AccountableUserId", "accountable_user_id"),
    field("MeasurableName", "title"),
    field("Target", "target"),
    field("Measured", "value"),
    field("Week", "week"),
    field("ForWeek", "week_id"),
    field("DateEntered", "updated_at"),
];

/// Operations on scorecards, reachable as `client.scorecards()`.
pub struct ScorecardOperations {
    gateway: Arc<dyn ApiGateway>,
    session: Arc<Session>,
}

impl ScorecardOperations {
    pub(crate) fn new(gateway: Arc<dyn ApiGateway>, session: Arc<Session>) -> Self {
        Self { gateway, session }
    }

    async fn resolve_user_id(&self, user_id: Option<u64>) -> Result<u64> {
        match user_id {
            Some(id) => Ok(id),
            None => self.session.current_user_id(self.gateway.as_ref()).await,
        }
    }

    pub async fn current_week(&self) -> Result<ScorecardWeek> {
        let data = self.gateway.get("weeks/current").await?;

        Ok(ScorecardWeek {
            id: data
                .get("Id")
                .and_then(Value::as_u64)
                .ok_or_else(|| BloomyError::Decode("weeks/current missing Id".to_string()))?,
            week_number: data
                .get("ForWeekNumber")
                .and_then(Value::as_i64)
                .ok_or_else(|| {
                    BloomyError::Decode("weeks/current missing ForWeekNumber".to_string())
                })?,
            week_start: data
                .get("LocalDate")
                .and_then(|d| d.get("Date"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            week_end: data
                .get("ForWeek")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
    }

    /// Scores for a user (default: the current user) or a meeting.
    ///
    /// Unmeasured entries are dropped unless `show_empty` is set;
    /// `week_offset` keeps only the week that many weeks from the
    /// current one.
    pub async fn list(
        &self,
        user_id: Option<u64>,
        meeting_id: Option<u64>,
        show_empty: bool,
        week_offset: Option<i64>,
    ) -> Result<Vec<ScorecardItem>> {
        reject_both_filters(user_id, meeting_id)?;

        let data = if let Some(meeting_id) = meeting_id {
            self.gateway
                .get(&format!("scorecard/meeting/{meeting_id}"))
                .await?
        } else {
            let user_id = self.resolve_user_id(user_id).await?;
            self.gateway
                .get(&format!("scorecard/user/{user_id}"))
                .await?
        };

        let scores = data.get("Scores").cloned().unwrap_or(Value::Null);
        let mut items: Vec<ScorecardItem> = map_list(&scores, SCORE_FIELDS)
            .into_iter()
            .map(|record| serde_json::from_value(record).map_err(Into::into))
            .collect::<Result<_>>()?;

        if let Some(offset) = week_offset {
            let week = self.current_week().await?;
            let target_week_id = week.week_number + offset;
            items.retain(|item| item.week_id == target_week_id);
        }

        if !show_empty {
            items.retain(|item| item.value.is_some());
        }

        Ok(items)
    }

    /// A single scorecard entry by measurable id, if present in the
    /// requested week.
    pub async fn get(
        &self,
        measurable_id: u64,
        user_id: Option<u64>,
        week_offset: i64,
    ) -> Result<Option<ScorecardItem>> {
        let items = self
            .list(user_id, None, true, Some(week_offset))
            .await?;
        Ok(items
            .into_iter()
            .find(|item| item.measurable_id == measurable_id))
    }

    /// Record a score for a measurable in the week `week_offset` weeks
    /// from the current one.
    pub async fn score(&self, measurable_id: u64, score: f64, week_offset: i64) -> Result<bool> {
        let week = self.current_week().await?;
        let week_id = week.week_number + week_offset;

        self.gateway
            .put(
                &format!("measurables/{measurable_id}/week/{week_id}"),
                &json!({"value": score}),
            )
            .await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::gateway::testing::MockGateway;

    fn ops(gateway: Arc<MockGateway>) -> ScorecardOperations {
        let session = Session::new();
        session.set_user_id(123);
        ScorecardOperations::new(gateway, Arc::new(session))
    }

    fn week_response() -> Value {
        json!({
            "Id": 2024025,
            "ForWeekNumber": 25,
            "LocalDate": {"Date": "2024-06-17"},
            "ForWeek": "2024-06-23",
        })
    }

    fn score(id: u64, week_id: i64, measured: Option<f64>) -> Value {
        json!({
            "Id": id,
            "MeasurableId": 300 + id,
            "AccountableUserId": 123,
            "MeasurableName": "Sales Revenue",
            "Target": 100000,
            "Measured": measured,
            "Week": "2024-W25",
            "ForWeek": week_id,
            "DateEntered": "2024-06-20T10:00:00Z",
        })
    }

    #[tokio::test]
    async fn current_week_parses_fields() {
        let gateway = Arc::new(MockGateway::new());
        gateway.stub("GET", "weeks/current", week_response());

        let week = ops(gateway).current_week().await.unwrap();
        assert_eq!(week.id, 2024025);
        assert_eq!(week.week_number, 25);
        assert_eq!(week.week_start, "2024-06-17");
        assert_eq!(week.week_end, "2024-06-23");
    }

    #[tokio::test]
    async fn list_drops_unmeasured_by_default() {
        let gateway = Arc::new(MockGateway::new());
        gateway.stub(
            "GET",
            "scorecard/user/123",
            json!({"Scores": [score(1, 25, Some(95000.0)), score(2, 25, None)]}),
        );

        let items = ops(gateway).list(None, None, false, None).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, 1);
        assert_eq!(items[0].value, Some(95000.0));
    }

    #[tokio::test]
    async fn list_with_week_offset_filters_weeks() {
        let gateway = Arc::new(MockGateway::new());
        gateway.stub(
            "GET",
            "scorecard/user/123",
            json!({"Scores": [score(1, 24, Some(1.0)), score(2, 25, Some(2.0))]}),
        );
        gateway.stub("GET", "weeks/current", week_response());

        let items = ops(gateway)
            .list(None, None, true, Some(-1))
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].week_id, 24);
    }

    #[tokio::test]
    async fn list_by_meeting_uses_meeting_path() {
        let gateway = Arc::new(MockGateway::new());
        gateway.stub("GET", "scorecard/meeting/456", json!({"Scores": []}));

        let items = ops(Arc::clone(&gateway))
            .list(None, Some(456), true, None)
            .await
            .unwrap();
        assert!(items.is_empty());
        assert_eq!(gateway.calls()[0].path, "scorecard/meeting/456");
    }

    #[tokio::test]
    async fn get_finds_measurable() {
        let gateway = Arc::new(MockGateway::new());
        gateway.stub(
            "GET",
            "scorecard/user/123",
            json!({"Scores": [score(1, 25, None)]}),
        );
        gateway.stub("GET", "weeks/current", week_response());

        let item = ops(gateway).get(301, None, 0).await.unwrap();
        assert_eq!(item.unwrap().measurable_id, 301);
    }

    #[tokio::test]
    async fn score_puts_to_offset_week() {
        let gateway = Arc::new(MockGateway::new());
        gateway.stub("GET", "weeks/current", week_response());
        gateway.stub("PUT", "measurables/301/week/26", Value::Null);

        assert!(ops(Arc::clone(&gateway)).score(301, 42.0, 1).await.unwrap());

        let put = gateway
            .calls()
            .into_iter()
            .find(|c| c.method == "PUT")
            .unwrap();
        assert_eq!(put.path, "measurables/301/week/26");
        assert_eq!(put.body.unwrap()["value"], 42.0);
    }
}
