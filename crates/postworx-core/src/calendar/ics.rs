//! ICS generation for shift calendars.

use icalendar::{Calendar, Component, EventLike};

use super::CalendarEvent;

/// Generate the full calendar for `events`.
pub fn generate(org: &str, events: &[CalendarEvent]) -> String {
    let mut cal = Calendar::new();
    cal.name(&format!("{} Shifts", org));

    for event in events {
        let mut ics_event = icalendar::Event::new();
        ics_event
            .uid(&event.uid)
            .summary(&event.summary)
            .description(&event.description)
            .location(&event.location)
            .starts(event.start)
            .ends(event.end)
            .timestamp(event.start)
            .priority(5)
            .add_property("TRANSP", "OPAQUE");
        cal.push(ics_event.done());
    }

    let cal = cal.done();
    set_prodid(&cal.to_string(), org)
}

/// The icalendar crate always writes its own PRODID; replace it with ours.
fn set_prodid(ics: &str, org: &str) -> String {
    let mut result = String::with_capacity(ics.len());
    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            result.push_str(&format!("PRODID:-//Scheduled Shifts//{}//", org));
        } else {
            result.push_str(line);
        }
        result.push_str("\r\n");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn event() -> CalendarEvent {
        let start = Utc.with_ymd_and_hms(2026, 7, 1, 13, 0, 0).unwrap();
        CalendarEvent {
            uid: "20260701T130000Z@postworx".to_string(),
            summary: "Cook: 8h".to_string(),
            start,
            end: Utc.with_ymd_and_hms(2026, 7, 1, 21, 0, 0).unwrap(),
            description: "Coworkers:\nAnn".to_string(),
            location: "Store Example, 1".to_string(),
        }
    }

    #[test]
    fn test_generate_includes_event_fields() {
        let ics = generate("Example", &[event()]);
        assert!(ics.contains("PRODID:-//Scheduled Shifts//Example//\r\n"));
        assert!(ics.contains("VERSION:2.0"));
        assert!(ics.contains("UID:20260701T130000Z@postworx"));
        assert!(ics.contains("DTSTART:20260701T130000Z"));
        assert!(ics.contains("DTEND:20260701T210000Z"));
        assert!(ics.contains("TRANSP:OPAQUE"));
        assert!(ics.contains("PRIORITY:5"));
        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 1);
    }

    #[test]
    fn test_generate_empty_calendar() {
        let ics = generate("Example", &[]);
        assert!(ics.contains("BEGIN:VCALENDAR"));
        assert!(!ics.contains("BEGIN:VEVENT"));
    }
}
