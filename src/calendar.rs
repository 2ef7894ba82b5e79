//! Google Calendar `events.list` client.

use serde::Deserialize;
use url::Url;

use crate::date::DateRange;
use crate::error::Error;
use crate::holiday::TaggedEvent;
use crate::tags::TagRule;

const CALENDAR_ID: &str = "primary";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventDateTime {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, rename = "dateTime")]
    pub date_time: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalendarEvent {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub start: Option<EventDateTime>,
    #[serde(default)]
    pub end: Option<EventDateTime>,
}

#[derive(Debug, Deserialize)]
struct EventsPage {
    #[serde(default)]
    items: Vec<CalendarEvent>,
    #[serde(default, rename = "nextPageToken")]
    next_page_token: Option<String>,
}

impl CalendarEvent {
    /// All-day events carry a plain `date` and no `dateTime`.
    pub fn is_all_day(&self) -> bool {
        match &self.start {
            Some(start) => {
                start.date_time.as_deref().unwrap_or_default().is_empty()
                    && start.date.is_some()
            }
            None => false,
        }
    }

    /// Turns an all-day event into a [`TaggedEvent`]. Timed events and
    /// events whose title has no tags yield `None`.
    pub fn to_tagged(&self, rule: TagRule) -> Result<Option<TaggedEvent>, Error> {
        if !self.is_all_day() {
            return Ok(None);
        }

        let start = self.start.as_ref().and_then(|start| start.date.as_deref());
        let end = self.end.as_ref().and_then(|end| end.date.as_deref());
        let timespan = DateRange::from_event(start.unwrap_or_default(), end.unwrap_or_default())?;

        let tags = rule.extract(self.summary.as_deref().unwrap_or_default());
        if tags.is_empty() {
            return Ok(None);
        }

        Ok(Some(TaggedEvent { timespan, tags }))
    }
}

/// Keeps the tagged all-day events out of a list of calendar events.
pub fn tagged_events(events: &[CalendarEvent], rule: TagRule) -> Result<Vec<TaggedEvent>, Error> {
    let mut tagged = Vec::new();
    for event in events {
        if let Some(event) = event.to_tagged(rule)? {
            tagged.push(event);
        }
    }
    Ok(tagged)
}

#[derive(Clone)]
pub struct CalendarClient {
    http: reqwest::Client,
    api_base: Url,
    max_pages: usize,
}

impl CalendarClient {
    pub fn new(http: reqwest::Client, api_base: Url, max_pages: usize) -> Self {
        Self {
            http,
            api_base,
            max_pages,
        }
    }

    fn events_url(&self) -> String {
        format!(
            "{}/calendars/{CALENDAR_ID}/events",
            self.api_base.as_str().trim_end_matches('/')
        )
    }

    /// Fetches every event overlapping `range`, following page tokens.
    pub async fn list_events(
        &self,
        access_token: &str,
        range: &DateRange,
    ) -> Result<Vec<CalendarEvent>, Error> {
        let (time_min, time_max) = range.to_rfc3339();
        let url = self.events_url();

        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        for page in 1..=self.max_pages {
            let mut query = vec![("timeMin", time_min.as_str()), ("timeMax", time_max.as_str())];
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }

            let response = self
                .http
                .get(&url)
                .bearer_auth(access_token)
                .query(&query)
                .send()
                .await
                .map_err(|err| Error::CalendarFetch(err.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(Error::CalendarFetch(format!("{status}: {body}")));
            }

            let body: EventsPage = response
                .json()
                .await
                .map_err(|err| Error::CalendarFetch(err.to_string()))?;

            log::debug!("Fetched page {page} with {} events", body.items.len());
            events.extend(body.items);

            match body.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) => page_token = Some(token),
                None => return Ok(events),
            }
        }

        Err(Error::TooManyPages(self.max_pages))
    }
}
