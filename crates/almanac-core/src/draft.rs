//! Form-layer validation: raw user input to a [`NewEvent`].
//!
//! The store trusts what it is given, so everything reaching it goes
//! through [`EventDraft::validate`] first.

use chrono::NaiveDate;
use tracing::debug;

use crate::error::{CalendarError, CalendarResult};
use crate::event::{EventColor, EventTiming, NewEvent, WallTime};

#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub name: String,
    pub date: NaiveDate,
    pub color: EventColor,
    pub all_day: bool,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

impl EventDraft {
    /// Empty draft for a new event on `date`, as the add form opens.
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            name: String::new(),
            date,
            color: EventColor::default(),
            all_day: false,
            start_time: None,
            end_time: None,
        }
    }

    /// Draft prefilled from an existing event, as the edit form opens.
    pub fn from_new_event(event: &NewEvent) -> Self {
        Self {
            name: event.name.clone(),
            date: event.date,
            color: event.color,
            all_day: event.timing.is_all_day(),
            start_time: event.timing.start().map(|t| t.to_string()),
            end_time: event.timing.end().map(|t| t.to_string()),
        }
    }

    pub fn validate(self) -> CalendarResult<NewEvent> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(CalendarError::Validation("event name is required".to_string()));
        }

        let timing = if self.all_day {
            EventTiming::AllDay
        } else {
            let start = required_time("start", self.start_time.as_deref())?;
            let end = required_time("end", self.end_time.as_deref())?;
            EventTiming::Timed { start, end }
        };

        debug!(name = %name, date = %self.date, all_day = self.all_day, "validated event draft");
        Ok(NewEvent {
            name: name.to_string(),
            date: self.date,
            color: self.color,
            timing,
        })
    }
}

fn required_time(label: &str, raw: Option<&str>) -> CalendarResult<WallTime> {
    match raw.map(str::trim) {
        Some(value) if !value.is_empty() => value.parse(),
        _ => Err(CalendarError::Validation(format!(
            "{label} time is required for a timed event"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::EventDraft;
    use crate::error::CalendarError;
    use crate::event::EventTiming;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).expect("date")
    }

    #[test]
    fn empty_name_is_rejected() {
        let mut draft = EventDraft::for_date(day());
        draft.name = "   ".to_string();
        draft.all_day = true;
        assert!(matches!(draft.validate(), Err(CalendarError::Validation(_))));
    }

    #[test]
    fn timed_draft_requires_both_times() {
        let mut draft = EventDraft::for_date(day());
        draft.name = "Call".to_string();
        draft.start_time = Some("09:30".to_string());
        draft.end_time = Some(String::new());
        assert!(matches!(draft.validate(), Err(CalendarError::Validation(_))));
    }

    #[test]
    fn all_day_draft_drops_times() {
        let mut draft = EventDraft::for_date(day());
        draft.name = " Holiday ".to_string();
        draft.all_day = true;
        draft.start_time = Some("09:00".to_string());
        let event = draft.validate().expect("valid draft");
        assert_eq!(event.name, "Holiday");
        assert_eq!(event.timing, EventTiming::AllDay);
    }

    #[test]
    fn end_before_start_is_accepted() {
        let mut draft = EventDraft::for_date(day());
        draft.name = "Night shift".to_string();
        draft.start_time = Some("22:00".to_string());
        draft.end_time = Some("06:00".to_string());
        let event = draft.clone().validate().expect("valid draft");
        assert_eq!(EventDraft::from_new_event(&event).start_time, draft.start_time);
    }

    #[test]
    fn malformed_time_is_an_invalid_time_error() {
        let mut draft = EventDraft::for_date(day());
        draft.name = "Call".to_string();
        draft.start_time = Some("9am".to_string());
        draft.end_time = Some("10:00".to_string());
        assert!(matches!(draft.validate(), Err(CalendarError::InvalidTime(_))));
    }
}
