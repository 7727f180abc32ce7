//! Calendar event projection.
//!
//! Pure derivation of displayable events from the record list. Nothing is
//! cached; the calendar view asks again after every change.

use crate::model::calendar::CalendarKind;
use crate::model::log_record::{LogBody, LogRecord};
use chrono::{DateTime, Utc};

/// One entry as the calendar view renders it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalendarEvent<'a> {
    pub title: &'a str,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Backing record, handed back when the entry is selected.
    pub log: &'a LogRecord,
}

impl CalendarEvent<'_> {
    /// Point records always render as single-day entries.
    pub fn all_day(&self) -> bool {
        match self.log.body {
            LogBody::Default { is_all_day, .. } => is_all_day,
            LogBody::Workout { .. } | LogBody::Study { .. } => true,
        }
    }
}

/// Projects records of calendar `filter` into events, preserving list order.
///
/// The iterator is lazy and can be cloned to restart it.
pub fn project_events(
    logs: &[LogRecord],
    filter: CalendarKind,
) -> impl Iterator<Item = CalendarEvent<'_>> + Clone + '_ {
    logs.iter()
        .filter(move |log| log.calendar_kind() == filter)
        .map(to_event)
}

fn to_event(log: &LogRecord) -> CalendarEvent<'_> {
    let (start, end) = match log.body {
        LogBody::Default { start, end, .. } => (start, end),
        LogBody::Workout { date, .. } | LogBody::Study { date } => (date, date),
    };
    CalendarEvent {
        title: &log.title,
        start,
        end,
        log,
    }
}

#[cfg(test)]
mod tests {
    use super::project_events;
    use crate::model::calendar::CalendarKind;
    use crate::model::log_record::{LogBody, LogFields, LogRecord};
    use chrono::{TimeZone, Utc};

    fn sample_logs() -> Vec<LogRecord> {
        let day = |d| Utc.with_ymd_and_hms(2024, 4, d, 0, 0, 0).unwrap();
        vec![
            LogRecord::with_id(
                "d1",
                LogFields::new(
                    "Trip",
                    "",
                    LogBody::Default {
                        start: day(1),
                        end: day(3),
                        is_all_day: false,
                    },
                ),
            ),
            LogRecord::with_id(
                "w1",
                LogFields::new(
                    "Bench",
                    "",
                    LogBody::Workout {
                        date: day(2),
                        weight: Some(60.0),
                        reps: Some(5),
                        sets: Some(3),
                    },
                ),
            ),
            LogRecord::with_id("s1", LogFields::new("Rust", "", LogBody::Study { date: day(4) })),
            LogRecord::with_id(
                "w2",
                LogFields::new(
                    "Deadlift",
                    "",
                    LogBody::Workout {
                        date: day(5),
                        weight: None,
                        reps: None,
                        sets: None,
                    },
                ),
            ),
        ]
    }

    #[test]
    fn projection_keeps_only_active_calendar_in_order() {
        let logs = sample_logs();
        let ids: Vec<&str> = project_events(&logs, CalendarKind::Workout)
            .map(|event| event.log.id.as_str())
            .collect();
        assert_eq!(ids, ["w1", "w2"]);
    }

    #[test]
    fn point_records_project_to_zero_duration_all_day_events() {
        let logs = sample_logs();
        let event = project_events(&logs, CalendarKind::Study).next().unwrap();
        assert_eq!(event.start, event.end);
        assert_eq!(event.start, logs[2].anchor_date());
        assert!(event.all_day());
    }

    #[test]
    fn projection_is_restartable() {
        let logs = sample_logs();
        let events = project_events(&logs, CalendarKind::Default);
        assert_eq!(events.clone().count(), 1);
        let event = events.into_iter().next().unwrap();
        assert_eq!(event.title, "Trip");
        assert!(!event.all_day());
    }
}
