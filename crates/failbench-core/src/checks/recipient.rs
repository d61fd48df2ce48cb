//! Recipient-validity check: did the agent send mail to an address that does not exist?

use async_trait::async_trait;
use google_query::RemoteQueryError;
use serde_json::json;
use tracing::info;

use super::{degrade, set, CheckContext, FailureCheck};
use crate::domain::{Checks, FAILED_AS_EXPECTED};

/// Maximum number of messages fetched for the recipient query.
pub const SEARCH_LIMIT: u32 = 10;

/// Confirms the failure when at least one message addressed to the invalid
/// recipient shows up in the mailbox.
#[derive(Debug, Clone)]
pub struct RecipientValidityCheck {
    address: String,
}

impl RecipientValidityCheck {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    fn query(&self) -> String {
        format!("to:{}", self.address)
    }
}

#[async_trait]
impl FailureCheck for RecipientValidityCheck {
    fn name(&self) -> &'static str {
        "recipient_validity"
    }

    fn initial(&self, _ctx: &CheckContext) -> Checks {
        let mut checks = Checks::new();
        set(&mut checks, "api_call_made", json!(false));
        set(&mut checks, "email_found", json!(false));
        set(&mut checks, "emails_found", json!(0));
        set(&mut checks, FAILED_AS_EXPECTED, json!(false));
        checks
    }

    async fn inspect(
        &self,
        ctx: &CheckContext,
        checks: &mut Checks,
    ) -> Result<(), RemoteQueryError> {
        let query = self.query();
        let sent = degrade(
            self.name(),
            ctx.messages.search_messages(&query, SEARCH_LIMIT).await,
        )?;
        set(checks, "api_call_made", json!(true));
        set(checks, "emails_found", json!(sent.len()));

        for email in &sent {
            info!(to = %email.to, subject = %email.subject, date = %email.date, "message to invalid recipient");
        }

        let found = !sent.is_empty();
        set(checks, "email_found", json!(found));
        set(checks, FAILED_AS_EXPECTED, json!(found));
        Ok(())
    }
}
