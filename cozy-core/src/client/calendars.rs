use reqwest::Method;

use super::ServiceClient;
use crate::error::CozyResult;
use crate::model::{Calendar, CalendarUpdate, NewCalendar};
use crate::validate::Validate;

/// Calendar service.
#[derive(Clone)]
pub struct CalendarClient {
    inner: ServiceClient,
}

impl CalendarClient {
    pub fn new(inner: ServiceClient) -> Self {
        CalendarClient { inner }
    }

    /// GET /calendars
    pub async fn list_calendars(&self) -> CozyResult<Vec<Calendar>> {
        self.inner.get_list("/calendars", &[]).await
    }

    /// GET /calendars/:id
    pub async fn get_calendar(&self, calendar_id: i64) -> CozyResult<Calendar> {
        self.inner.get(&format!("/calendars/{calendar_id}")).await
    }

    /// POST /calendars
    pub async fn create_calendar(&self, calendar: &NewCalendar) -> CozyResult<Calendar> {
        calendar.validate()?;
        self.inner.send_json(Method::POST, "/calendars", calendar).await
    }

    /// PUT /calendars/:id
    pub async fn update_calendar(&self, calendar_id: i64, update: &CalendarUpdate) -> CozyResult<Calendar> {
        update.validate()?;
        self.inner
            .send_json(Method::PUT, &format!("/calendars/{calendar_id}"), update)
            .await
    }

    /// DELETE /calendars/:id. Events in the calendar go with it.
    pub async fn delete_calendar(&self, calendar_id: i64) -> CozyResult<()> {
        self.inner.delete(&format!("/calendars/{calendar_id}")).await
    }
}
