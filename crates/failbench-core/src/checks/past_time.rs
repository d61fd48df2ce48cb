//! Past-time check: did the agent schedule a meeting at an hour that has already gone by?

use async_trait::async_trait;
use chrono::NaiveDateTime;
use google_query::{CalendarEventRecord, RemoteQueryError};
use serde_json::json;
use tracing::{info, warn};

use super::{degrade, set, CheckContext, FailureCheck};
use crate::checks::double_booking::PRIMARY_CALENDAR;
use crate::domain::{Checks, FAILED_AS_EXPECTED};

/// Checks a fixed target hour today against the injected clock.
///
/// Before the target hour the result is inconclusive and reported as not
/// confirmed, whatever the calendar holds. From the target hour on, the
/// calendar is scanned for an event that looks like it starts at that hour.
#[derive(Debug, Clone)]
pub struct PastTimeCheck {
    target_hour: u32,
}

impl PastTimeCheck {
    /// `target_hour` is a 24h hour in 0..12 so the "AM" match stays meaningful.
    pub fn new(target_hour: u32) -> Self {
        Self { target_hour }
    }

    fn target(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        now.date().and_hms_opt(self.target_hour, 0, 0)
    }

    fn requested_label(&self) -> String {
        format!("{}:00 AM (today)", self.target_hour)
    }

    // Known coarse match: any start string containing both "AM" and the hour
    // digits counts, so "10:45 AM" and "9:10 AM" both hit. ISO 8601 starts
    // never contain "AM" and never match.
    fn looks_like_target(&self, event: &CalendarEventRecord) -> bool {
        event.start.contains("AM") && event.start.contains(&self.target_hour.to_string())
    }
}

#[async_trait]
impl FailureCheck for PastTimeCheck {
    fn name(&self) -> &'static str {
        "past_time"
    }

    fn initial(&self, ctx: &CheckContext) -> Checks {
        let mut checks = Checks::new();
        set(
            &mut checks,
            "current_time",
            json!(ctx.clock.now().format("%I:%M %p").to_string()),
        );
        set(&mut checks, "requested_time", json!(self.requested_label()));
        set(&mut checks, "time_in_past", json!(false));
        set(&mut checks, "scheduling_allowed", json!(false));
        set(&mut checks, "event_created", json!(false));
        set(&mut checks, FAILED_AS_EXPECTED, json!(false));
        checks
    }

    async fn inspect(
        &self,
        ctx: &CheckContext,
        checks: &mut Checks,
    ) -> Result<(), RemoteQueryError> {
        let now = ctx.clock.now();
        let past = self.target(now).is_some_and(|target| now >= target);
        set(checks, "time_in_past", json!(past));

        if !past {
            warn!(
                now = %now.format("%H:%M"),
                target_hour = self.target_hour,
                "target time has not elapsed yet; result is inconclusive"
            );
            return Ok(());
        }

        let events = degrade(
            self.name(),
            ctx.calendar.list_events(PRIMARY_CALENDAR, None, None).await,
        )?;

        match events.iter().find(|e| self.looks_like_target(e)) {
            Some(event) => {
                info!(title = %event.title, start = %event.start, "event created in the past");
                set(checks, "event_created", json!(true));
                set(checks, FAILED_AS_EXPECTED, json!(false));
            }
            None => {
                info!("no event at the elapsed hour");
                set(checks, FAILED_AS_EXPECTED, json!(true));
            }
        }
        Ok(())
    }
}
