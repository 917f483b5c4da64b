use chrono::NaiveDateTime;
use chrono_tz::Tz;
use icalendar::{Calendar, CalendarDateTime, Component, Event, EventLike};

use crate::models::{Language, StoredEvent};
use crate::slug::GroupFullCode;

#[derive(Clone, Default)]
pub struct ICalExporter;

impl ICalExporter {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(
        &self,
        calendar_name: &str,
        full_code: &GroupFullCode,
        events: &[&StoredEvent],
        tz: Tz,
        lang: Language,
    ) -> Vec<u8> {
        if events.is_empty() {
            return Vec::new();
        }

        let mut calendar = Calendar::new();
        calendar.name(calendar_name);
        calendar.timezone(tz.name());

        for stored in events {
            let details = &stored.instance.details;
            let date = stored.instance.date;
            let in_zone = |time| CalendarDateTime::WithTimezone {
                date_time: NaiveDateTime::new(date, time),
                tzid: tz.name().to_string(),
            };

            let mut event = Event::new();
            event.summary(&format!(
                "{} ({})",
                details.title.get(lang),
                details.kind.get(lang)
            ));
            event.starts(in_zone(details.start_time));
            event.ends(in_zone(details.end_time));

            let location: Vec<&str> = details
                .room
                .as_deref()
                .into_iter()
                .chain(details.address.as_ref().map(|address| address.get(lang)))
                .filter(|part| !part.trim().is_empty())
                .collect();
            if !location.is_empty() {
                event.location(&location.join(", "));
            }
            if let Some(teacher) = &details.teacher {
                event.description(teacher.get(lang));
            }
            event.uid(&format!("{}-{}-gsom-timetable", stored.id, full_code));
            calendar.push(event);
        }

        calendar.to_string().into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::*;
    use crate::models::{BilingualText, EventDetails, ScheduleEventInstance};

    fn stored(id: i64) -> StoredEvent {
        StoredEvent {
            id,
            group_id: 1,
            instance: ScheduleEventInstance {
                details: EventDetails {
                    title: BilingualText::new("Statistics", "Статистика"),
                    kind: BilingualText::new("Lecture", "Лекция"),
                    teacher: Some(BilingualText::new("Petrov P.P.", "Петров П.П.")),
                    room: Some("101".to_string()),
                    address: Some(BilingualText::new("Volkhovsky per. 3", "Волховский пер. 3")),
                    start_time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
                    end_time: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
                },
                date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
                is_recurring: false,
                recurrence_pattern: None,
                recurrence_end_date: None,
            },
        }
    }

    #[test]
    fn test_generate_single_event() {
        let exporter = ICalExporter::new();
        let full_code: GroupFullCode = "24.B01-vshm".parse().unwrap();
        let event = stored(3);
        let bytes = exporter.generate(
            "GSOM 24.B01-vshm",
            &full_code,
            &[&event],
            chrono_tz::Europe::Moscow,
            Language::En,
        );
        let body = String::from_utf8(bytes).unwrap();
        assert!(body.contains("BEGIN:VEVENT"));
        assert!(body.contains("Statistics (Lecture)"));
        assert!(body.contains("Europe/Moscow"));
        assert!(body.contains("3-24.B01-vshm-gsom-timetable"));
    }

    #[test]
    fn test_generate_russian() {
        let exporter = ICalExporter::new();
        let full_code: GroupFullCode = "24.B01-vshm".parse().unwrap();
        let event = stored(1);
        let bytes = exporter.generate(
            "ВШМ",
            &full_code,
            &[&event],
            chrono_tz::Europe::Moscow,
            Language::Ru,
        );
        let body = String::from_utf8(bytes).unwrap();
        assert!(body.contains("Статистика (Лекция)"));
    }

    #[test]
    fn test_generate_empty() {
        let exporter = ICalExporter::new();
        let full_code: GroupFullCode = "24.B01-vshm".parse().unwrap();
        let bytes = exporter.generate("x", &full_code, &[], chrono_tz::UTC, Language::En);
        assert!(bytes.is_empty());
    }
}
