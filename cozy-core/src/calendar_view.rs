//! Month, week and day views: which dates each view shows and how to page
//! between them.
//!
//! Weeks start on Sunday. Days begin at local midnight in whatever time zone
//! the caller passes; the resulting ranges are half-open `[start, end)`
//! instants in UTC, ready to send to the event service.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};

use crate::error::{CozyError, CozyResult};
use crate::location::Location;
use crate::model::Event;

pub const VIEW_PARAM: &str = "view";
pub const DATE_PARAM: &str = "date";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// `[first, last]` as whole days in `tz`.
    pub fn days<Tz: TimeZone>(first: NaiveDate, last: NaiveDate, tz: &Tz) -> CozyResult<Self> {
        let after_last = last.checked_add_days(Days::new(1)).ok_or_else(|| out_of_range(last))?;
        Ok(TimeRange {
            start: start_of(first, tz),
            end: start_of(after_last, tz),
        })
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    /// Every `tz` date the range touches, in order.
    pub fn dates<Tz: TimeZone>(&self, tz: &Tz) -> Vec<NaiveDate> {
        let mut dates = Vec::new();
        let mut day = self.start.with_timezone(tz).date_naive();
        while start_of(day, tz) < self.end {
            dates.push(day);
            match day.checked_add_days(Days::new(1)) {
                Some(next) => day = next,
                None => break,
            }
        }
        dates
    }
}

fn out_of_range(date: NaiveDate) -> CozyError {
    CozyError::validation("date", format!("{date} is outside the supported calendar range"))
}

/// Local midnight of `date` in `tz`. Where a DST change skips midnight the
/// day starts at the first hour that exists.
fn start_of<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(midnight + TimeDelta::hours(1))).earliest())
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or_else(|| midnight.and_utc())
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn week_start(date: NaiveDate) -> CozyResult<NaiveDate> {
    date.checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_sunday())))
        .ok_or_else(|| out_of_range(date))
}

fn plus_days(date: NaiveDate, days: u64) -> CozyResult<NaiveDate> {
    date.checked_add_days(Days::new(days)).ok_or_else(|| out_of_range(date))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CalendarView {
    #[default]
    Month,
    Week,
    Day,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

impl CalendarView {
    pub const ALL: [CalendarView; 3] = [CalendarView::Month, CalendarView::Week, CalendarView::Day];

    pub fn as_str(&self) -> &'static str {
        match self {
            CalendarView::Month => "month",
            CalendarView::Week => "week",
            CalendarView::Day => "day",
        }
    }

    /// Range of time the view displays around `anchor`, with days taken in
    /// `tz`. Month view covers whole weeks, so it starts on the Sunday on or
    /// before the 1st and ends after the Saturday on or after the last day.
    pub fn visible_range<Tz: TimeZone>(&self, anchor: NaiveDate, tz: &Tz) -> CozyResult<TimeRange> {
        let (first, last) = match self {
            CalendarView::Month => {
                let first = first_of_month(anchor);
                let last = first
                    .checked_add_months(Months::new(1))
                    .and_then(|next| next.checked_sub_days(Days::new(1)))
                    .ok_or_else(|| out_of_range(anchor))?;
                let trailing = 6 - last.weekday().num_days_from_sunday();
                (week_start(first)?, plus_days(last, u64::from(trailing))?)
            }
            CalendarView::Week => {
                let start = week_start(anchor)?;
                (start, plus_days(start, 6)?)
            }
            CalendarView::Day => (anchor, anchor),
        };
        TimeRange::days(first, last, tz)
    }

    /// Move `anchor` by one month, week or day.
    pub fn navigate(&self, anchor: NaiveDate, direction: Direction) -> NaiveDate {
        let moved = match (self, direction) {
            (CalendarView::Month, Direction::Next) => anchor.checked_add_months(Months::new(1)),
            (CalendarView::Month, Direction::Previous) => anchor.checked_sub_months(Months::new(1)),
            (CalendarView::Week, Direction::Next) => anchor.checked_add_days(Days::new(7)),
            (CalendarView::Week, Direction::Previous) => anchor.checked_sub_days(Days::new(7)),
            (CalendarView::Day, Direction::Next) => anchor.checked_add_days(Days::new(1)),
            (CalendarView::Day, Direction::Previous) => anchor.checked_sub_days(Days::new(1)),
        };
        moved.unwrap_or(anchor)
    }

    /// Heading for the view, e.g. "March 2025".
    pub fn title(&self, anchor: NaiveDate) -> String {
        match self {
            CalendarView::Month => anchor.format("%B %Y").to_string(),
            CalendarView::Week => {
                let start = week_start(anchor).unwrap_or(anchor);
                let end = start.checked_add_days(Days::new(6)).unwrap_or(start);
                format!("{} - {}", start.format("%b %-d"), end.format("%b %-d, %Y"))
            }
            CalendarView::Day => anchor.format("%A, %B %-d, %Y").to_string(),
        }
    }
}

impl fmt::Display for CalendarView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CalendarView {
    type Err = CozyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "month" => Ok(CalendarView::Month),
            "week" => Ok(CalendarView::Week),
            "day" => Ok(CalendarView::Day),
            other => Err(CozyError::validation(
                "view",
                format!("Unknown view '{other}'. Expected month, week or day"),
            )),
        }
    }
}

/// The date the calendar is looking at, and how. Owned by whoever renders
/// the calendar and passed in explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarCursor {
    pub view: CalendarView,
    pub anchor: NaiveDate,
}

impl CalendarCursor {
    pub fn new(view: CalendarView, anchor: NaiveDate) -> Self {
        CalendarCursor { view, anchor }
    }

    pub fn range<Tz: TimeZone>(&self, tz: &Tz) -> CozyResult<TimeRange> {
        self.view.visible_range(self.anchor, tz)
    }

    pub fn next(self) -> Self {
        CalendarCursor {
            anchor: self.view.navigate(self.anchor, Direction::Next),
            ..self
        }
    }

    pub fn previous(self) -> Self {
        CalendarCursor {
            anchor: self.view.navigate(self.anchor, Direction::Previous),
            ..self
        }
    }

    pub fn title(&self) -> String {
        self.view.title(self.anchor)
    }

    /// Read `view` and `date` from the URL; missing values fall back to
    /// month view anchored on `today`.
    pub fn from_location(location: &Location, today: NaiveDate) -> CozyResult<Self> {
        let view = location
            .param(VIEW_PARAM)
            .map(str::parse::<CalendarView>)
            .transpose()?
            .unwrap_or_default();
        let anchor = location.param(DATE_PARAM).map(parse_date).transpose()?.unwrap_or(today);
        Ok(CalendarCursor { view, anchor })
    }

    /// Write the cursor back. Default values are left out of the URL.
    pub fn write_to(&self, location: Location, today: NaiveDate) -> Location {
        let location = if self.view == CalendarView::default() {
            location.without_param(VIEW_PARAM)
        } else {
            location.with_param(VIEW_PARAM, self.view.as_str())
        };
        if self.anchor == today {
            location.without_param(DATE_PARAM)
        } else {
            location.with_param(DATE_PARAM, self.anchor.format("%Y-%m-%d").to_string())
        }
    }
}

/// Parse a `YYYY-MM-DD` date argument.
pub fn parse_date(s: &str) -> CozyResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
        CozyError::validation("date", format!("Invalid date format '{s}'. Expected YYYY-MM-DD"))
    })
}

/// Group events by each `tz` day of `range` they overlap. Days without
/// events are omitted.
pub fn events_by_day<'a, Tz: TimeZone>(
    events: &'a [Event],
    range: &TimeRange,
    tz: &Tz,
) -> BTreeMap<NaiveDate, Vec<&'a Event>> {
    let mut days: BTreeMap<NaiveDate, Vec<&Event>> = BTreeMap::new();

    for date in range.dates(tz) {
        let Ok(day) = TimeRange::days(date, date, tz) else {
            continue;
        };
        let mut on_day: Vec<&Event> = events
            .iter()
            .filter(|event| event.overlaps(day.start, day.end))
            .collect();
        if on_day.is_empty() {
            continue;
        }
        on_day.sort_by_key(|event| event.start_time);
        days.insert(date, on_day);
    }

    days
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Weekday};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_view_pads_to_whole_weeks() {
        // March 2025 starts on a Saturday and ends on a Monday.
        let range = CalendarView::Month.visible_range(date(2025, 3, 20), &Utc).unwrap();
        assert_eq!(range.start, Utc.with_ymd_and_hms(2025, 2, 23, 0, 0, 0).unwrap());
        assert_eq!(range.end, Utc.with_ymd_and_hms(2025, 4, 6, 0, 0, 0).unwrap());
        assert_eq!(range.dates(&Utc).len(), 42);
        assert_eq!(range.start.weekday(), Weekday::Sun);
    }

    #[test]
    fn week_view_starts_on_sunday() {
        let range = CalendarView::Week.visible_range(date(2025, 3, 20), &Utc).unwrap();
        assert_eq!(range.start, Utc.with_ymd_and_hms(2025, 3, 16, 0, 0, 0).unwrap());
        assert_eq!(range.end, Utc.with_ymd_and_hms(2025, 3, 23, 0, 0, 0).unwrap());

        // A Sunday anchors its own week.
        let sunday = CalendarView::Week.visible_range(date(2025, 3, 16), &Utc).unwrap();
        assert_eq!(sunday, range);
    }

    #[test]
    fn day_view_is_one_day() {
        let range = CalendarView::Day.visible_range(date(2025, 3, 20), &Utc).unwrap();
        assert_eq!(range.dates(&Utc), vec![date(2025, 3, 20)]);
        assert!(range.contains(Utc.with_ymd_and_hms(2025, 3, 20, 23, 59, 59).unwrap()));
        assert!(!range.contains(Utc.with_ymd_and_hms(2025, 3, 21, 0, 0, 0).unwrap()));
    }

    #[test]
    fn navigation_moves_by_view_unit() {
        let cursor = CalendarCursor::new(CalendarView::Month, date(2025, 1, 31));
        assert_eq!(cursor.next().anchor, date(2025, 2, 28));
        assert_eq!(cursor.previous().anchor, date(2024, 12, 31));

        let week = CalendarCursor::new(CalendarView::Week, date(2025, 3, 20));
        assert_eq!(week.next().anchor, date(2025, 3, 27));

        let day = CalendarCursor::new(CalendarView::Day, date(2025, 3, 1));
        assert_eq!(day.previous().anchor, date(2025, 2, 28));
    }

    #[test]
    fn titles() {
        assert_eq!(CalendarView::Month.title(date(2025, 3, 20)), "March 2025");
        assert_eq!(CalendarView::Week.title(date(2025, 3, 20)), "Mar 16 - Mar 22, 2025");
        assert_eq!(CalendarView::Day.title(date(2025, 3, 20)), "Thursday, March 20, 2025");
    }

    #[test]
    fn cursor_round_trips_through_url() {
        let today = date(2025, 3, 20);
        let cursor = CalendarCursor::from_location(&Location::new("/calendar"), today).unwrap();
        assert_eq!(cursor, CalendarCursor::new(CalendarView::Month, today));
        assert_eq!(cursor.write_to(Location::new("/calendar"), today).to_string(), "/calendar");

        let moved = CalendarCursor::new(CalendarView::Week, today).next();
        let location = moved.write_to(Location::parse("/calendar?calendars=1"), today);
        assert_eq!(location.param(VIEW_PARAM), Some("week"));
        assert_eq!(location.param(DATE_PARAM), Some("2025-03-27"));
        assert_eq!(CalendarCursor::from_location(&location, today).unwrap(), moved);

        let bad = Location::parse("/calendar?view=year");
        assert!(CalendarCursor::from_location(&bad, today).is_err());
    }

    #[test]
    fn view_parses_case_insensitively() {
        assert_eq!("Week".parse::<CalendarView>().unwrap(), CalendarView::Week);
        assert!("year".parse::<CalendarView>().is_err());
    }

    #[test]
    fn multi_day_events_appear_on_each_day() {
        let event = Event {
            id: 1,
            calendar_id: 1,
            user_id: 1,
            title: "Offsite".into(),
            description: None,
            start_time: Utc.with_ymd_and_hms(2025, 3, 19, 15, 0, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2025, 3, 21, 0, 0, 0).unwrap(),
            location: None,
            color: None,
            created_at: None,
            updated_at: None,
        };
        let events = [event];
        let week = CalendarView::Week.visible_range(date(2025, 3, 20), &Utc).unwrap();
        let by_day = events_by_day(&events, &week, &Utc);

        let days: Vec<NaiveDate> = by_day.keys().copied().collect();
        assert_eq!(days, vec![date(2025, 3, 19), date(2025, 3, 20)]);
    }

    #[test]
    fn days_follow_the_callers_time_zone() {
        let new_york = FixedOffset::west_opt(5 * 3600).unwrap();
        let range = CalendarView::Day.visible_range(date(2025, 3, 20), &new_york).unwrap();
        assert_eq!(range.start, Utc.with_ymd_and_hms(2025, 3, 20, 5, 0, 0).unwrap());
        assert_eq!(range.end, Utc.with_ymd_and_hms(2025, 3, 21, 5, 0, 0).unwrap());
        assert_eq!(range.dates(&new_york), vec![date(2025, 3, 20)]);

        // 21:00 local on the 20th is already the 21st in UTC.
        let late = Event {
            id: 2,
            calendar_id: 1,
            user_id: 1,
            title: "Late call".into(),
            description: None,
            start_time: Utc.with_ymd_and_hms(2025, 3, 21, 2, 0, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2025, 3, 21, 3, 0, 0).unwrap(),
            location: None,
            color: None,
            created_at: None,
            updated_at: None,
        };
        let events = [late];
        let week = CalendarView::Week.visible_range(date(2025, 3, 20), &new_york).unwrap();
        let days: Vec<NaiveDate> = events_by_day(&events, &week, &new_york).keys().copied().collect();
        assert_eq!(days, vec![date(2025, 3, 20)]);
    }

    #[test]
    fn ranges_at_the_ends_of_the_calendar_are_rejected() {
        for view in CalendarView::ALL {
            let err = view.visible_range(NaiveDate::MAX, &Utc).unwrap_err();
            assert!(matches!(err, CozyError::Validation { field: "date", .. }));
        }

        let cursor = CalendarCursor::new(CalendarView::Month, NaiveDate::MAX);
        assert_eq!(cursor.next().anchor, NaiveDate::MAX);
        assert!(cursor.range(&Utc).is_err());
    }
}
