//! Gmail and Calendar query clients.
//!
//! The evaluator only sees the [`MessageSource`] and [`CalendarSource`]
//! traits. [`GoogleClient`] talks to the REST APIs; [`DisabledClient`] stands
//! in when no credential could be found.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::credentials::Credential;
use crate::error::{QueryResult, RemoteQueryError};
use crate::records::{CalendarEventRecord, EmailRecord};

/// Upper bound on events returned by a single listing.
pub const MAX_EVENTS: u32 = 50;

const GMAIL: &str = "Gmail";
const CALENDAR: &str = "Calendar";

/// Message search over a mailbox.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Up to `limit` messages matching the provider filter expression.
    async fn search_messages(&self, query: &str, limit: u32) -> QueryResult<Vec<EmailRecord>>;
}

/// Event listing over a calendar.
#[async_trait]
pub trait CalendarSource: Send + Sync {
    /// Up to [`MAX_EVENTS`] events, optionally bounded by an inclusive window.
    async fn list_events(
        &self,
        calendar_id: &str,
        time_min: Option<&str>,
        time_max: Option<&str>,
    ) -> QueryResult<Vec<CalendarEventRecord>>;
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct MessageList {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Message {
    id: String,
    #[serde(default)]
    payload: Option<MessagePayload>,
}

#[derive(Debug, Deserialize)]
struct MessagePayload {
    #[serde(default)]
    headers: Vec<Header>,
}

#[derive(Debug, Deserialize)]
struct Header {
    name: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct EventList {
    #[serde(default)]
    items: Vec<Event>,
}

#[derive(Debug, Deserialize)]
struct Event {
    #[serde(default)]
    id: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    start: Option<EventTime>,
    #[serde(default)]
    end: Option<EventTime>,
    #[serde(default)]
    organizer: Option<Organizer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventTime {
    #[serde(default)]
    date_time: Option<String>,
    #[serde(default)]
    date: Option<String>,
}

impl EventTime {
    fn as_string(&self) -> String {
        self.date_time
            .clone()
            .or_else(|| self.date.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct Organizer {
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
}

impl From<Message> for EmailRecord {
    fn from(msg: Message) -> Self {
        let headers = msg.payload.map(|p| p.headers).unwrap_or_default();
        let header = |name: &str| {
            headers
                .iter()
                .find(|h| h.name == name)
                .map(|h| h.value.clone())
                .unwrap_or_default()
        };
        EmailRecord {
            to: header("To"),
            from: header("From"),
            subject: header("Subject"),
            date: header("Date"),
            id: msg.id,
        }
    }
}

impl From<Event> for CalendarEventRecord {
    fn from(event: Event) -> Self {
        CalendarEventRecord {
            id: event.id,
            title: event.summary.unwrap_or_default(),
            start: event.start.map(|t| t.as_string()).unwrap_or_default(),
            end: event.end.map(|t| t.as_string()).unwrap_or_default(),
            organizer: event.organizer.and_then(|o| o.email).unwrap_or_default(),
        }
    }
}

// ---------------------------------------------------------------------------
// GoogleClient
// ---------------------------------------------------------------------------

/// REST client for the Gmail and Calendar APIs.
pub struct GoogleClient {
    http_client: reqwest::Client,
    credential: Credential,
    gmail_base_url: String,
    calendar_base_url: String,
}

impl GoogleClient {
    pub fn new(
        http_client: reqwest::Client,
        credential: Credential,
        gmail_base_url: &str,
        calendar_base_url: &str,
    ) -> Self {
        GoogleClient {
            http_client,
            credential,
            gmail_base_url: gmail_base_url.trim_end_matches('/').to_string(),
            calendar_base_url: calendar_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(base: &str, segments: &[&str]) -> QueryResult<Url> {
        let mut url = Url::parse(base).map_err(|e| RemoteQueryError::Transport(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| RemoteQueryError::Transport(format!("base URL cannot be a base: {base}")))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        service: &str,
        url: Url,
    ) -> QueryResult<T> {
        debug!(service, url = %url, "remote query");
        let response = self
            .http_client
            .get(url)
            .bearer_auth(&self.credential.access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            return Err(RemoteQueryError::Api {
                service: service.to_string(),
                status: status.as_u16(),
                message,
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| RemoteQueryError::Decode(e.to_string()))
    }
}

#[async_trait]
impl MessageSource for GoogleClient {
    async fn search_messages(&self, query: &str, limit: u32) -> QueryResult<Vec<EmailRecord>> {
        let mut url = Self::endpoint(
            &self.gmail_base_url,
            &["gmail", "v1", "users", "me", "messages"],
        )?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("maxResults", &limit.to_string());
        let list: MessageList = self.get_json(GMAIL, url).await?;

        let mut records = Vec::with_capacity(list.messages.len());
        for msg_ref in list.messages.into_iter().take(limit as usize) {
            let mut url = Self::endpoint(
                &self.gmail_base_url,
                &["gmail", "v1", "users", "me", "messages", &msg_ref.id],
            )?;
            url.query_pairs_mut()
                .append_pair("format", "metadata")
                .append_pair("metadataHeaders", "To")
                .append_pair("metadataHeaders", "From")
                .append_pair("metadataHeaders", "Subject")
                .append_pair("metadataHeaders", "Date");
            let message: Message = self.get_json(GMAIL, url).await?;
            records.push(EmailRecord::from(message));
        }
        Ok(records)
    }
}

#[async_trait]
impl CalendarSource for GoogleClient {
    async fn list_events(
        &self,
        calendar_id: &str,
        time_min: Option<&str>,
        time_max: Option<&str>,
    ) -> QueryResult<Vec<CalendarEventRecord>> {
        let mut url = Self::endpoint(
            &self.calendar_base_url,
            &["calendar", "v3", "calendars", calendar_id, "events"],
        )?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("maxResults", &MAX_EVENTS.to_string());
            if let Some(min) = time_min {
                pairs.append_pair("timeMin", min);
            }
            if let Some(max) = time_max {
                pairs.append_pair("timeMax", max);
            }
        }
        let list: EventList = self.get_json(CALENDAR, url).await?;
        Ok(list
            .items
            .into_iter()
            .take(MAX_EVENTS as usize)
            .map(CalendarEventRecord::from)
            .collect())
    }
}

// ---------------------------------------------------------------------------
// DisabledClient
// ---------------------------------------------------------------------------

/// Stand-in used when no credential is available. Every query reports
/// [`RemoteQueryError::Unavailable`], which callers degrade to an empty result.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledClient;

#[async_trait]
impl MessageSource for DisabledClient {
    async fn search_messages(&self, _query: &str, _limit: u32) -> QueryResult<Vec<EmailRecord>> {
        warn!("Gmail service not available");
        Err(RemoteQueryError::Unavailable {
            service: GMAIL.to_string(),
        })
    }
}

#[async_trait]
impl CalendarSource for DisabledClient {
    async fn list_events(
        &self,
        _calendar_id: &str,
        _time_min: Option<&str>,
        _time_max: Option<&str>,
    ) -> QueryResult<Vec<CalendarEventRecord>> {
        warn!("Calendar service not available");
        Err(RemoteQueryError::Unavailable {
            service: CALENDAR.to_string(),
        })
    }
}
