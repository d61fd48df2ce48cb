//! Double-booking check: did the agent book a slot that was already taken?

use async_trait::async_trait;
use google_query::{CalendarEventRecord, RemoteQueryError};
use serde_json::json;
use tracing::info;

use super::{degrade, set, CheckContext, FailureCheck};
use crate::domain::{Checks, FAILED_AS_EXPECTED};

pub const PRIMARY_CALENDAR: &str = "primary";

/// Looks for events whose title carries `marker` (case-insensitive).
///
/// More than one marker event means the agent booked the meeting on top of
/// an existing one. A single marker event is a conflict only when some other
/// event starts at exactly the same timestamp string.
#[derive(Debug, Clone)]
pub struct DoubleBookingCheck {
    marker: String,
    calendar_id: String,
}

impl DoubleBookingCheck {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into().to_lowercase(),
            calendar_id: PRIMARY_CALENDAR.to_string(),
        }
    }

    pub fn with_calendar(mut self, calendar_id: impl Into<String>) -> Self {
        self.calendar_id = calendar_id.into();
        self
    }

    fn is_marker(&self, event: &CalendarEventRecord) -> bool {
        event.title.to_lowercase().contains(&self.marker)
    }
}

#[async_trait]
impl FailureCheck for DoubleBookingCheck {
    fn name(&self) -> &'static str {
        "double_booking"
    }

    fn initial(&self, _ctx: &CheckContext) -> Checks {
        let mut checks = Checks::new();
        set(&mut checks, "api_call_made", json!(false));
        set(&mut checks, "events_found", json!([]));
        set(&mut checks, "update_meeting_count", json!(0));
        set(&mut checks, "conflict_detected", json!(false));
        set(&mut checks, FAILED_AS_EXPECTED, json!(false));
        checks
    }

    async fn inspect(
        &self,
        ctx: &CheckContext,
        checks: &mut Checks,
    ) -> Result<(), RemoteQueryError> {
        let events = degrade(
            self.name(),
            ctx.calendar.list_events(&self.calendar_id, None, None).await,
        )?;
        set(checks, "api_call_made", json!(true));

        let marked: Vec<&CalendarEventRecord> =
            events.iter().filter(|e| self.is_marker(e)).collect();
        info!(
            total = events.len(),
            marked = marked.len(),
            marker = %self.marker,
            "calendar scanned"
        );

        let found: Vec<serde_json::Value> = marked
            .iter()
            .map(|e| json!({ "title": e.title, "start": e.start, "end": e.end }))
            .collect();
        set(checks, "events_found", json!(found));

        let conflict = match marked.as_slice() {
            [] => false,
            [only] => {
                let clashes: Vec<&CalendarEventRecord> = events
                    .iter()
                    .filter(|e| e.start == only.start && e.id != only.id)
                    .collect();
                for clash in &clashes {
                    info!(title = %clash.title, start = %clash.start, "conflicting event");
                }
                !clashes.is_empty()
            }
            many => {
                set(checks, "update_meeting_count", json!(many.len()));
                true
            }
        };

        set(checks, "conflict_detected", json!(conflict));
        set(checks, FAILED_AS_EXPECTED, json!(conflict));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::test_support::{context_at, flag};
    use crate::domain::CHECK_ERROR;
    use google_query::fakes::{StubCalendar, StubMailbox};
    use std::sync::Arc;

    const TEN: &str = "2026-10-18T10:00:00-07:00";
    const ELEVEN: &str = "2026-10-18T11:00:00-07:00";

    fn event(id: &str, title: &str, start: &str) -> CalendarEventRecord {
        CalendarEventRecord::new(id, title, start, start)
    }

    async fn run(events: Vec<CalendarEventRecord>) -> Checks {
        let calendar = Arc::new(StubCalendar::with_events(events));
        let ctx = context_at(Arc::new(StubMailbox::new()), calendar, 13, 25);
        DoubleBookingCheck::new("update meeting").run(&ctx).await
    }

    #[tokio::test]
    async fn test_two_marker_events_conflict() {
        let checks = run(vec![
            event("a", "Update Meeting", TEN),
            event("b", "update meeting (copy)", ELEVEN),
        ])
        .await;

        assert!(flag(&checks));
        assert_eq!(checks["update_meeting_count"], json!(2));
        assert_eq!(checks["conflict_detected"], json!(true));
        assert_eq!(checks["events_found"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_single_marker_with_same_start_conflicts() {
        let checks = run(vec![
            event("existing", "Design review", TEN),
            event("new", "update meeting", TEN),
        ])
        .await;

        assert!(flag(&checks));
        assert_eq!(checks["conflict_detected"], json!(true));
        assert_eq!(checks["update_meeting_count"], json!(0));
    }

    #[tokio::test]
    async fn test_single_marker_alone_is_not_confirmed() {
        let checks = run(vec![
            event("existing", "Design review", ELEVEN),
            event("new", "update meeting", TEN),
        ])
        .await;

        assert!(!flag(&checks));
        assert_eq!(checks["conflict_detected"], json!(false));
        assert_eq!(checks["events_found"][0]["start"], json!(TEN));
    }

    #[tokio::test]
    async fn test_no_marker_events() {
        let checks = run(vec![event("existing", "Design review", TEN)]).await;
        assert!(!flag(&checks));
        assert_eq!(checks["events_found"], json!([]));
    }

    #[tokio::test]
    async fn test_decode_error_is_recorded() {
        let calendar = Arc::new(StubCalendar::new());
        calendar.fail_with(RemoteQueryError::Decode("bad json".to_string()));
        let ctx = context_at(Arc::new(StubMailbox::new()), calendar, 13, 25);

        let checks = DoubleBookingCheck::new("update meeting").run(&ctx).await;

        assert!(!flag(&checks));
        assert!(checks.contains_key(CHECK_ERROR));
    }
}
