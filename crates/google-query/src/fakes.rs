//! In-memory fakes for the query traits (testing only)
//!
//! `StubMailbox` and `StubCalendar` satisfy the trait contracts without any
//! network access, and can be told to fail with a given error.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::client::{CalendarSource, MessageSource, MAX_EVENTS};
use crate::error::{QueryResult, RemoteQueryError};
use crate::records::{CalendarEventRecord, EmailRecord};

// ---------------------------------------------------------------------------
// StubMailbox
// ---------------------------------------------------------------------------

/// In-memory mailbox. Understands `to:<address>` filters; any other query
/// matches every message.
#[derive(Debug, Default)]
pub struct StubMailbox {
    messages: Mutex<Vec<EmailRecord>>,
    error: Mutex<Option<RemoteQueryError>>,
    calls: AtomicUsize,
}

impl StubMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_messages(messages: Vec<EmailRecord>) -> Self {
        let stub = Self::default();
        *stub.messages.lock().unwrap() = messages;
        stub
    }

    /// Record a message sent to `to`.
    pub fn push_sent(&self, to: &str, subject: &str) {
        let mut messages = self.messages.lock().unwrap();
        let id = format!("msg-{}", messages.len() + 1);
        messages.push(EmailRecord {
            id,
            to: to.to_string(),
            from: "me@example.com".to_string(),
            subject: subject.to_string(),
            date: "Sat, 17 Oct 2026 13:25:00 -0700".to_string(),
        });
    }

    /// Make every subsequent query fail with `error`.
    pub fn fail_with(&self, error: RemoteQueryError) {
        *self.error.lock().unwrap() = Some(error);
    }

    /// Number of queries served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessageSource for StubMailbox {
    async fn search_messages(&self, query: &str, limit: u32) -> QueryResult<Vec<EmailRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.error.lock().unwrap().clone() {
            return Err(err);
        }
        let recipient = query
            .strip_prefix("to:")
            .map(|r| r.trim().to_ascii_lowercase());
        let messages = self.messages.lock().unwrap();
        Ok(messages
            .iter()
            .filter(|m| match &recipient {
                Some(r) => m.to.to_ascii_lowercase().contains(r.as_str()),
                None => true,
            })
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// StubCalendar
// ---------------------------------------------------------------------------

/// In-memory calendar. Ignores the time window and returns at most
/// [`MAX_EVENTS`] events in insertion order.
#[derive(Debug, Default)]
pub struct StubCalendar {
    events: Mutex<Vec<CalendarEventRecord>>,
    error: Mutex<Option<RemoteQueryError>>,
    calls: AtomicUsize,
}

impl StubCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: Vec<CalendarEventRecord>) -> Self {
        let stub = Self::default();
        *stub.events.lock().unwrap() = events;
        stub
    }

    pub fn push(&self, event: CalendarEventRecord) {
        self.events.lock().unwrap().push(event);
    }

    pub fn fail_with(&self, error: RemoteQueryError) {
        *self.error.lock().unwrap() = Some(error);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CalendarSource for StubCalendar {
    async fn list_events(
        &self,
        _calendar_id: &str,
        _time_min: Option<&str>,
        _time_max: Option<&str>,
    ) -> QueryResult<Vec<CalendarEventRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.error.lock().unwrap().clone() {
            return Err(err);
        }
        let events = self.events.lock().unwrap();
        Ok(events.iter().take(MAX_EVENTS as usize).cloned().collect())
    }
}
