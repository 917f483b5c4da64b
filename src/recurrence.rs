//! Expands one prototype event and its recurrence rule into the dated
//! instances that get persisted.
//!
//! Expansion is total: degenerate rules (end before anchor, no custom days,
//! missing end date) produce an empty list rather than an error. Validating
//! user input is up to the caller, see [`crate::validation`].

use std::collections::BTreeSet;

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{ScheduleEventInstance, ScheduleEventPrototype};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RecurrencePattern {
    #[default]
    None,
    Weekly,
    Biweekly,
    Custom,
}

impl RecurrencePattern {
    pub fn is_repeating(self) -> bool {
        self != RecurrencePattern::None
    }
}

/// Days a class can be scheduled on. The teaching week runs Monday to
/// Saturday.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum TeachingDay {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl TeachingDay {
    pub fn from_weekday(day: Weekday) -> Option<Self> {
        match day {
            Weekday::Mon => Some(TeachingDay::Monday),
            Weekday::Tue => Some(TeachingDay::Tuesday),
            Weekday::Wed => Some(TeachingDay::Wednesday),
            Weekday::Thu => Some(TeachingDay::Thursday),
            Weekday::Fri => Some(TeachingDay::Friday),
            Weekday::Sat => Some(TeachingDay::Saturday),
            Weekday::Sun => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RecurrenceRule {
    #[serde(default)]
    pub pattern: RecurrencePattern,
    #[serde(default)]
    #[schema(value_type = Option<String>, format = "date")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub custom_days: BTreeSet<TeachingDay>,
}

impl RecurrenceRule {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn weekly(end_date: NaiveDate) -> Self {
        Self::repeating(RecurrencePattern::Weekly, end_date)
    }

    pub fn biweekly(end_date: NaiveDate) -> Self {
        Self::repeating(RecurrencePattern::Biweekly, end_date)
    }

    pub fn custom(end_date: NaiveDate, days: impl IntoIterator<Item = TeachingDay>) -> Self {
        Self {
            custom_days: days.into_iter().collect(),
            ..Self::repeating(RecurrencePattern::Custom, end_date)
        }
    }

    fn repeating(pattern: RecurrencePattern, end_date: NaiveDate) -> Self {
        Self {
            pattern,
            end_date: Some(end_date),
            custom_days: BTreeSet::new(),
        }
    }

    /// Dates the rule selects starting from `anchor`, in ascending order.
    pub fn occurrences(&self, anchor: NaiveDate) -> Vec<NaiveDate> {
        match self.pattern {
            RecurrencePattern::None => vec![anchor],
            RecurrencePattern::Weekly => stepped(anchor, self.end_date, 7),
            RecurrencePattern::Biweekly => stepped(anchor, self.end_date, 14),
            RecurrencePattern::Custom => {
                let Some(end) = self.end_date else {
                    return Vec::new();
                };
                anchor
                    .iter_days()
                    .take_while(|day| *day <= end)
                    .filter(|day| {
                        TeachingDay::from_weekday(day.weekday())
                            .is_some_and(|teaching_day| self.custom_days.contains(&teaching_day))
                    })
                    .collect()
            }
        }
    }
}

fn stepped(anchor: NaiveDate, end: Option<NaiveDate>, step_days: u64) -> Vec<NaiveDate> {
    let Some(end) = end else {
        return Vec::new();
    };
    std::iter::successors(Some(anchor), |day| day.checked_add_days(Days::new(step_days)))
        .take_while(|day| *day <= end)
        .collect()
}

pub fn expand(
    prototype: &ScheduleEventPrototype,
    rule: &RecurrenceRule,
) -> Vec<ScheduleEventInstance> {
    let repeating = rule.pattern.is_repeating();
    rule.occurrences(prototype.date)
        .into_iter()
        .map(|date| ScheduleEventInstance {
            details: prototype.details.clone(),
            date,
            is_recurring: repeating,
            recurrence_pattern: repeating.then_some(rule.pattern),
            recurrence_end_date: if repeating { rule.end_date } else { None },
        })
        .collect()
}
