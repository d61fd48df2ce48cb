//! Failure checks.
//!
//! Each task in the catalog is bound to exactly one [`FailureCheck`]. A check
//! queries fresh remote state through the [`CheckContext`] and records what it
//! saw in a [`Checks`] map, always including `failed_as_expected`.
//!
//! Query errors are split two ways:
//! - degradable ones (service unavailable, API error status) are logged and
//!   treated as an empty result set;
//! - anything else aborts the check, is stored under `error`, and counts as
//!   "failure not confirmed".

pub mod double_booking;
pub mod past_time;
pub mod recipient;

use std::sync::Arc;

use async_trait::async_trait;
use google_query::{CalendarSource, MessageSource, QueryResult, RemoteQueryError, RemoteServices};
use serde_json::json;

use crate::clock::{Clock, FixedClock, SystemClock};
use crate::domain::{Checks, CHECK_ERROR, FAILED_AS_EXPECTED};
use crate::metrics::METRICS;
use crate::obs;

pub use double_booking::DoubleBookingCheck;
pub use past_time::PastTimeCheck;
pub use recipient::RecipientValidityCheck;

/// Everything a check may consult.
#[derive(Clone)]
pub struct CheckContext {
    pub messages: Arc<dyn MessageSource>,
    pub calendar: Arc<dyn CalendarSource>,
    pub clock: Arc<dyn Clock>,
}

impl CheckContext {
    /// Context over connected services and the local wall clock.
    pub fn from_services(services: &RemoteServices) -> Self {
        Self {
            messages: Arc::clone(&services.messages),
            calendar: Arc::clone(&services.calendar),
            clock: Arc::new(SystemClock),
        }
    }

    /// Same sources, with the clock pinned to a single reading.
    pub fn frozen(&self) -> Self {
        Self {
            messages: Arc::clone(&self.messages),
            calendar: Arc::clone(&self.calendar),
            clock: Arc::new(FixedClock(self.clock.now())),
        }
    }
}

/// A predicate over remote state deciding whether a task's designed failure occurred.
#[async_trait]
pub trait FailureCheck: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Default observations, before any query runs.
    fn initial(&self, ctx: &CheckContext) -> Checks;

    /// Query remote state and fill in `checks`.
    async fn inspect(&self, ctx: &CheckContext, checks: &mut Checks)
        -> Result<(), RemoteQueryError>;

    /// Run the check, absorbing query errors into the observations. The clock
    /// is read once, so every observation refers to the same instant.
    async fn run(&self, ctx: &CheckContext) -> Checks {
        let ctx = &ctx.frozen();
        let mut checks = self.initial(ctx);
        if let Err(e) = self.inspect(ctx, &mut checks).await {
            obs::emit_check_error(self.name(), &e);
            checks.insert(CHECK_ERROR.to_string(), json!(e.to_string()));
            checks.insert(FAILED_AS_EXPECTED.to_string(), json!(false));
        }
        checks
    }
}

/// Turn degradable query errors into an empty result; pass the rest through.
pub(crate) fn degrade<T>(check: &str, result: QueryResult<Vec<T>>) -> QueryResult<Vec<T>> {
    match result {
        Ok(items) => Ok(items),
        Err(e) if e.is_degradable() => {
            obs::emit_query_degraded(check, &e);
            METRICS.inc_queries_degraded();
            Ok(Vec::new())
        }
        Err(e) => Err(e),
    }
}

pub(crate) fn set(checks: &mut Checks, key: &str, value: serde_json::Value) {
    checks.insert(key.to_string(), value);
}
