//! Plain-text rendering of coworker rosters.
//!
//! The rendered block is what gets cached and what ends up in the calendar
//! event description, so it must be stable for identical input.

use crate::models::{CoworkerRecord, ShiftRecord};

const HEADERS: [&str; 4] = ["Name", "In", "Out", "Position"];

/// Gap between table columns.
const COLUMN_GUTTER: &str = "  ";

/// Position titles shortened so managers stand out in the roster.
const POSITION_ALIASES: &[(&str, &str)] = &[
    ("SAL Mgr, General", "## GM ##"),
    ("HR Mgr, Asst.", "# Manager #"),
];

/// Apply the display alias for a position, if any.
pub fn display_position(position: &str) -> String {
    POSITION_ALIASES
        .iter()
        .fold(position.to_string(), |acc, (from, to)| acc.replace(from, to))
}

/// Render coworkers as an aligned plain-text table.
pub fn render_table(coworkers: &[CoworkerRecord]) -> String {
    let rows: Vec<[String; 4]> = coworkers
        .iter()
        .map(|c| {
            [
                c.employee_name.clone(),
                c.in_time.clone().unwrap_or_default(),
                c.out_time.clone().unwrap_or_default(),
                display_position(&c.position_name),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let header = HEADERS.map(str::to_string);
    std::iter::once(&header)
        .chain(rows.iter())
        .map(|row| format_row(row, &widths))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_row(row: &[String; 4], widths: &[usize; 4]) -> String {
    let line = row
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = width))
        .collect::<Vec<_>>()
        .join(COLUMN_GUTTER);
    line.trim_end().to_string()
}

/// One-line summary of the user's own shift.
pub fn shift_details(shift: &ShiftRecord) -> String {
    format!(
        "Shift #{} [{}] {}: {}-{} ({} hours)",
        shift.shift_id,
        shift.labor_date.format("%Y-%m-%d"),
        shift.position_name,
        shift.in_time,
        shift.out_time,
        shift.hours
    )
}

/// Full text block for a shift: details line followed by the coworker table.
pub fn render_entry(shift: &ShiftRecord, coworkers: &[CoworkerRecord]) -> String {
    let roster = if coworkers.is_empty() {
        "(none listed)".to_string()
    } else {
        render_table(coworkers)
    };
    format!("{}\nCoworkers:\n{}", shift_details(shift), roster)
}

/// Text used when the roster could not be fetched.
pub fn unavailable_entry(shift: &ShiftRecord) -> String {
    format!("{}\nCoworkers: unavailable", shift_details(shift))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ShiftId;
    use chrono::NaiveDate;

    fn coworker(name: &str, position: &str, in_time: Option<&str>) -> CoworkerRecord {
        CoworkerRecord {
            employee_name: name.to_string(),
            position_name: position.to_string(),
            in_time: in_time.map(str::to_string),
            out_time: Some("5:00 PM".to_string()),
        }
    }

    fn shift() -> ShiftRecord {
        ShiftRecord {
            labor_date: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
            position_name: "Cook".to_string(),
            in_time: "9:00 AM".to_string(),
            out_time: "5:00 PM".to_string(),
            hours: 8.0,
            shift_id: ShiftId::new("42"),
            location_name: "Store_1".to_string(),
        }
    }

    #[test]
    fn test_display_position_aliases() {
        assert_eq!(display_position("SAL Mgr, General"), "## GM ##");
        assert_eq!(display_position("HR Mgr, Asst.: Front"), "# Manager #: Front");
        assert_eq!(display_position("Cashier"), "Cashier");
    }

    #[test]
    fn test_render_table_aligns_columns() {
        let table = render_table(&[
            coworker("Ann", "Cashier", Some("9:00 AM")),
            coworker("Bartholomew", "SAL Mgr, General", None),
        ]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Name         In       Out      Position");
        assert_eq!(lines[1], "Ann          9:00 AM  5:00 PM  Cashier");
        assert_eq!(lines[2], "Bartholomew           5:00 PM  ## GM ##");
    }

    #[test]
    fn test_render_entry() {
        let entry = render_entry(&shift(), &[coworker("Ann", "Cashier", Some("9:00 AM"))]);
        assert!(entry.starts_with("Shift #42 [2026-10-16] Cook: 9:00 AM-5:00 PM (8 hours)\nCoworkers:\n"));
        assert!(entry.ends_with("Ann   9:00 AM  5:00 PM  Cashier"));
    }

    #[test]
    fn test_render_entry_without_coworkers() {
        assert!(render_entry(&shift(), &[]).ends_with("Coworkers:\n(none listed)"));
    }

    #[test]
    fn test_unavailable_entry() {
        assert!(unavailable_entry(&shift()).ends_with("Coworkers: unavailable"));
    }
}
