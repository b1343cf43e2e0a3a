use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::draft::EventDraft;
use crate::error::CalendarError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    pub(crate) fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for EventId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum EventColor {
    #[default]
    Red,
    Green,
    Blue,
}

impl EventColor {
    pub const ALL: [EventColor; 3] = [EventColor::Red, EventColor::Green, EventColor::Blue];

    pub fn as_str(self) -> &'static str {
        match self {
            EventColor::Red => "red",
            EventColor::Green => "green",
            EventColor::Blue => "blue",
        }
    }

    /// SGR foreground code used by the terminal renderer.
    pub fn ansi_code(self) -> &'static str {
        match self {
            EventColor::Red => "31",
            EventColor::Green => "32",
            EventColor::Blue => "34",
        }
    }
}

/// Wall-clock time of day, minute precision, 24h.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WallTime {
    hour: u8,
    minute: u8,
}

impl WallTime {
    pub fn new(hour: u8, minute: u8) -> Result<Self, CalendarError> {
        if hour > 23 || minute > 59 {
            return Err(CalendarError::InvalidTime(format!("{hour}:{minute:02}")));
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// `HH:MM` read as the decimal number `HH.MM`, so 09:30 is 9.30 and
    /// not 9.5. Display ordering is defined on this value.
    pub fn decimal_hour(&self) -> f64 {
        f64::from(self.hour) + f64::from(self.minute) / 100.0
    }

    pub fn to_naive_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(u32::from(self.hour), u32::from(self.minute), 0)
            .unwrap_or(NaiveTime::MIN)
    }
}

fn wall_time_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(?P<hour>\d{1,2}):(?P<minute>\d{2})\s*$").ok())
        .as_ref()
}

impl FromStr for WallTime {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = wall_time_re()
            .and_then(|re| re.captures(s))
            .ok_or_else(|| CalendarError::InvalidTime(s.to_string()))?;
        let hour: u8 = caps["hour"]
            .parse()
            .map_err(|_| CalendarError::InvalidTime(s.to_string()))?;
        let minute: u8 = caps["minute"]
            .parse()
            .map_err(|_| CalendarError::InvalidTime(s.to_string()))?;
        Self::new(hour, minute).map_err(|_| CalendarError::InvalidTime(s.to_string()))
    }
}

impl fmt::Display for WallTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl Serialize for WallTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WallTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTiming {
    AllDay,
    /// `start` is not required to precede `end`.
    Timed { start: WallTime, end: WallTime },
}

impl EventTiming {
    pub fn is_all_day(&self) -> bool {
        matches!(self, EventTiming::AllDay)
    }

    pub fn start(&self) -> Option<WallTime> {
        match self {
            EventTiming::AllDay => None,
            EventTiming::Timed { start, .. } => Some(*start),
        }
    }

    pub fn end(&self) -> Option<WallTime> {
        match self {
            EventTiming::AllDay => None,
            EventTiming::Timed { end, .. } => Some(*end),
        }
    }
}

/// An event as submitted by the form layer, before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "EventRecord", into = "EventRecord")]
pub struct NewEvent {
    pub name: String,
    pub date: NaiveDate,
    pub color: EventColor,
    pub timing: EventTiming,
}

impl NewEvent {
    pub fn all_day(name: impl Into<String>, date: NaiveDate, color: EventColor) -> Self {
        Self {
            name: name.into(),
            date,
            color,
            timing: EventTiming::AllDay,
        }
    }

    pub fn timed(
        name: impl Into<String>,
        date: NaiveDate,
        color: EventColor,
        start: WallTime,
        end: WallTime,
    ) -> Self {
        Self {
            name: name.into(),
            date,
            color,
            timing: EventTiming::Timed { start, end },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "EventRecord", into = "EventRecord")]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub date: NaiveDate,
    pub color: EventColor,
    pub timing: EventTiming,
}

impl Event {
    pub(crate) fn from_parts(id: EventId, new: NewEvent) -> Self {
        Self {
            id,
            name: new.name,
            date: new.date,
            color: new.color,
            timing: new.timing,
        }
    }

    pub fn is_all_day(&self) -> bool {
        self.timing.is_all_day()
    }

    pub fn start_time(&self) -> Option<WallTime> {
        self.timing.start()
    }

    pub fn end_time(&self) -> Option<WallTime> {
        self.timing.end()
    }

    pub fn to_new_event(&self) -> NewEvent {
        NewEvent {
            name: self.name.clone(),
            date: self.date,
            color: self.color,
            timing: self.timing,
        }
    }
}

impl AsRef<Event> for Event {
    fn as_ref(&self) -> &Event {
        self
    }
}

/// A seed-file entry: the event plus the id it was recorded under, if any.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "EventRecord")]
pub struct SeedEvent {
    pub id: Option<EventId>,
    pub event: NewEvent,
}

impl From<NewEvent> for SeedEvent {
    fn from(event: NewEvent) -> Self {
        Self { id: None, event }
    }
}

/// Flat on-disk / on-wire shape shared by [`Event`] and [`NewEvent`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EventRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<EventId>,
    name: String,
    date: NaiveDate,
    #[serde(default)]
    color: EventColor,
    #[serde(default)]
    all_day: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    end_time: Option<String>,
}

impl TryFrom<EventRecord> for NewEvent {
    type Error = CalendarError;

    fn try_from(record: EventRecord) -> Result<Self, Self::Error> {
        if record.all_day && (record.start_time.is_some() || record.end_time.is_some()) {
            return Err(CalendarError::Validation(format!(
                "all-day event '{}' cannot carry start/end times",
                record.name
            )));
        }
        EventDraft {
            name: record.name,
            date: record.date,
            color: record.color,
            all_day: record.all_day,
            start_time: record.start_time,
            end_time: record.end_time,
        }
        .validate()
    }
}

impl TryFrom<EventRecord> for Event {
    type Error = CalendarError;

    fn try_from(mut record: EventRecord) -> Result<Self, Self::Error> {
        let id = record
            .id
            .take()
            .ok_or_else(|| CalendarError::Validation("event record has no id".to_string()))?;
        Ok(Event::from_parts(id, NewEvent::try_from(record)?))
    }
}

impl TryFrom<EventRecord> for SeedEvent {
    type Error = CalendarError;

    fn try_from(mut record: EventRecord) -> Result<Self, Self::Error> {
        let id = record.id.take();
        Ok(Self {
            id,
            event: NewEvent::try_from(record)?,
        })
    }
}

impl From<NewEvent> for EventRecord {
    fn from(event: NewEvent) -> Self {
        EventRecord {
            id: None,
            name: event.name,
            date: event.date,
            color: event.color,
            all_day: event.timing.is_all_day(),
            start_time: event.timing.start().map(|t| t.to_string()),
            end_time: event.timing.end().map(|t| t.to_string()),
        }
    }
}

impl From<Event> for EventRecord {
    fn from(event: Event) -> Self {
        let id = event.id;
        let mut record = EventRecord::from(event.to_new_event());
        record.id = Some(id);
        record
    }
}
