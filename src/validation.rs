//! Input checks for the admin forms. The recurrence expander accepts any
//! rule, so these preconditions are enforced here before expansion.

use chrono::NaiveDate;

use crate::error::ApiError;
use crate::models::ScheduleEventPrototype;
use crate::recurrence::{RecurrencePattern, RecurrenceRule};

/// Longest span a single recurring request may cover: one academic year.
pub const MAX_RECURRENCE_DAYS: i64 = 366;

pub fn validate_prototype(prototype: &ScheduleEventPrototype) -> Result<(), ApiError> {
    let details = &prototype.details;
    if details.title.is_blank() || details.kind.is_blank() {
        return Err(ApiError::BadRequest(
            "title and type are required in both languages".into(),
        ));
    }
    if details.start_time >= details.end_time {
        return Err(ApiError::BadRequest(
            "start_time must be before end_time".into(),
        ));
    }
    Ok(())
}

pub fn validate_rule(anchor: NaiveDate, rule: &RecurrenceRule) -> Result<(), ApiError> {
    if !rule.pattern.is_repeating() {
        return Ok(());
    }
    match rule.end_date {
        None => {
            return Err(ApiError::BadRequest(
                "end_date is required for recurring events".into(),
            ));
        }
        Some(end) if end < anchor => {
            return Err(ApiError::BadRequest(
                "end_date must not be before the event date".into(),
            ));
        }
        Some(end) if (end - anchor).num_days() > MAX_RECURRENCE_DAYS => {
            return Err(ApiError::BadRequest(format!(
                "recurrence may span at most {MAX_RECURRENCE_DAYS} days"
            )));
        }
        Some(_) => {}
    }
    if rule.pattern == RecurrencePattern::Custom && rule.custom_days.is_empty() {
        return Err(ApiError::BadRequest(
            "select at least one day for a custom recurrence".into(),
        ));
    }
    Ok(())
}

pub fn validate_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<(), ApiError> {
    match (start, end) {
        (Some(start), Some(end)) if start > end => Err(ApiError::BadRequest(
            "start must not be after end".into(),
        )),
        _ => Ok(()),
    }
}
