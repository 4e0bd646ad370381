use reqwest::Method;

use super::ServiceClient;
use crate::calendar_view::TimeRange;
use crate::error::CozyResult;
use crate::model::{Event, EventUpdate, NewEvent};
use crate::validate::Validate;

/// Event service.
#[derive(Clone)]
pub struct EventClient {
    inner: ServiceClient,
}

impl EventClient {
    pub fn new(inner: ServiceClient) -> Self {
        EventClient { inner }
    }

    /// GET /calendars/:id/events within `range`. The service rejects
    /// requests without both bounds.
    pub async fn list_events(&self, calendar_id: i64, range: &TimeRange) -> CozyResult<Vec<Event>> {
        let query = [
            ("start", range.start.to_rfc3339()),
            ("end", range.end.to_rfc3339()),
        ];

        self.inner
            .get_list(&format!("/calendars/{calendar_id}/events"), &query)
            .await
    }

    /// Events of several calendars within `range`, merged and ordered by start time.
    /// The service has no multi-calendar endpoint, so this is one request per calendar.
    pub async fn list_events_for(&self, calendar_ids: &[i64], range: &TimeRange) -> CozyResult<Vec<Event>> {
        let mut events = Vec::new();
        for &calendar_id in calendar_ids {
            events.extend(self.list_events(calendar_id, range).await?);
        }

        events.sort_by(|a, b| a.start_time.cmp(&b.start_time).then(a.id.cmp(&b.id)));
        Ok(events)
    }

    /// GET /events/:id
    pub async fn get_event(&self, event_id: i64) -> CozyResult<Event> {
        self.inner.get(&format!("/events/{event_id}")).await
    }

    /// POST /events
    pub async fn create_event(&self, event: &NewEvent) -> CozyResult<Event> {
        event.validate()?;
        self.inner.send_json(Method::POST, "/events", event).await
    }

    /// PUT /events/:id. The service answers with an empty 200, so the
    /// stored event is read back afterwards.
    pub async fn update_event(&self, event_id: i64, update: &EventUpdate) -> CozyResult<Event> {
        update.validate()?;
        let path = format!("/events/{event_id}");
        self.inner.send_json_unit(Method::PUT, &path, update).await?;
        self.get_event(event_id).await
    }

    /// DELETE /events/:id
    pub async fn delete_event(&self, event_id: i64) -> CozyResult<()> {
        self.inner.delete(&format!("/events/{event_id}")).await
    }
}
