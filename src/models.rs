use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::recurrence::RecurrencePattern;
use crate::slug::{Degree, Program, ProgramIdentity};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ru,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BilingualText {
    pub en: String,
    pub ru: String,
}

impl BilingualText {
    pub fn new(en: impl Into<String>, ru: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            ru: ru.into(),
        }
    }

    pub fn get(&self, lang: Language) -> &str {
        match lang {
            Language::En => &self.en,
            Language::Ru => &self.ru,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.en.trim().is_empty() || self.ru.trim().is_empty()
    }
}

/// Everything about a class except the day it happens on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EventDetails {
    pub title: BilingualText,
    #[serde(rename = "type")]
    pub kind: BilingualText,
    #[serde(default)]
    pub teacher: Option<BilingualText>,
    #[serde(default)]
    pub room: Option<String>,
    #[serde(default)]
    pub address: Option<BilingualText>,
    #[schema(value_type = String, format = "time", example = "09:30:00")]
    pub start_time: NaiveTime,
    #[schema(value_type = String, format = "time", example = "11:00:00")]
    pub end_time: NaiveTime,
}

/// The template an administrator fills in; `date` anchors any recurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ScheduleEventPrototype {
    #[serde(flatten)]
    pub details: EventDetails,
    #[schema(value_type = String, format = "date", example = "2024-09-02")]
    pub date: NaiveDate,
}

/// One dated occurrence, ready to persist. Recurrence metadata is copied onto
/// every instance so a row explains itself without a parent event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ScheduleEventInstance {
    #[serde(flatten)]
    pub details: EventDetails,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub is_recurring: bool,
    pub recurrence_pattern: Option<RecurrencePattern>,
    #[schema(value_type = Option<String>, format = "date")]
    pub recurrence_end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StoredEvent {
    pub id: i64,
    pub group_id: i64,
    #[serde(flatten)]
    pub instance: ScheduleEventInstance,
}

/// Payload for creating a group, also used by the seed catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NewGroup {
    /// Derived from the group letter when omitted.
    #[serde(default)]
    pub degree: Option<Degree>,
    /// Derived from the legacy group numbering when omitted.
    #[serde(default)]
    pub program: Option<Program>,
    pub year: u16,
    /// Bare (`B01`) or full (`24.B01-vshm`) group code.
    pub code: String,
    #[serde(default)]
    pub name_en: String,
    #[serde(default)]
    pub name_ru: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub id: i64,
    pub identity: ProgramIdentity,
    pub name: BilingualText,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GroupView {
    pub id: i64,
    pub degree: Degree,
    pub program: Program,
    pub year: u16,
    pub code: String,
    pub full_code: String,
    pub slug: String,
    pub name: BilingualText,
}

impl From<&Group> for GroupView {
    fn from(group: &Group) -> Self {
        let identity = &group.identity;
        Self {
            id: group.id,
            degree: identity.degree,
            program: identity.program,
            year: identity.year,
            code: identity.group.to_string(),
            full_code: identity.full_code().to_string(),
            slug: identity.slug(),
            name: group.name.clone(),
        }
    }
}

/// A stored event shaped for the weekly timetable view.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TimetableEntry {
    pub id: i64,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub day: String,
    pub time: String,
    pub subject: BilingualText,
    #[serde(rename = "type")]
    pub kind: BilingualText,
    pub teacher: Option<BilingualText>,
    pub room: Option<String>,
    pub address: Option<BilingualText>,
}

impl From<&StoredEvent> for TimetableEntry {
    fn from(event: &StoredEvent) -> Self {
        let details = &event.instance.details;
        Self {
            id: event.id,
            date: event.instance.date,
            day: weekday_name(event.instance.date.weekday()).to_string(),
            time: format!(
                "{}-{}",
                details.start_time.format("%H:%M"),
                details.end_time.format("%H:%M")
            ),
            subject: details.title.clone(),
            kind: details.kind.clone(),
            teacher: details.teacher.clone(),
            room: details.room.clone(),
            address: details.address.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TimetableResponse {
    pub slug: String,
    pub full_code: String,
    pub url: String,
    pub title: String,
    pub group: GroupView,
    pub events: Vec<TimetableEntry>,
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
