//! Table and JSON rendering for the report commands.

use rollcall_store::{AttendanceRecord, DailyStats, Employee};
use serde::Serialize;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_stats(stats: &DailyStats) {
    println!(
        "[{}] Total Staff: {}  Present Today: {}",
        stats.date, stats.total_staff, stats.present
    );
}

fn dash(v: &Option<String>) -> &str {
    v.as_deref().unwrap_or("-")
}

pub fn attendance_table(records: &[AttendanceRecord]) -> String {
    let mut out = format!(
        "{:<20} {:<26} {:<16} {:<10} {:<8} {:<8}\n",
        "NAME", "EMAIL", "DESIGNATION", "DATE", "IN", "OUT"
    );
    for r in records {
        out.push_str(&format!(
            "{:<20} {:<26} {:<16} {:<10} {:<8} {:<8}\n",
            r.name,
            dash(&r.email),
            dash(&r.designation),
            r.date,
            dash(&r.time_in),
            dash(&r.time_out),
        ));
    }
    out
}

pub fn staff_table(staff: &[Employee]) -> String {
    let mut out = format!(
        "{:>4} {:<20} {:<26} {:<14} {:<16}\n",
        "ID", "NAME", "EMAIL", "PHONE", "DESIGNATION"
    );
    for e in staff {
        out.push_str(&format!(
            "{:>4} {:<20} {:<26} {:<14} {:<16}\n",
            e.id, e.name, e.email, e.phone, e.designation
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attendance_table_marks_open_row() {
        let rows = vec![AttendanceRecord {
            id: 1,
            name: "Alice".into(),
            email: Some("a@x.io".into()),
            designation: None,
            date: "2026-03-02".into(),
            time_in: Some("09:00:00".into()),
            time_out: None,
        }];
        let table = attendance_table(&rows);
        let line = table.lines().nth(1).unwrap();
        assert!(line.starts_with("Alice"));
        assert!(line.contains("09:00:00"));
        assert!(line.trim_end().ends_with('-'));
    }

    #[test]
    fn test_staff_table_header_only_when_empty() {
        assert_eq!(staff_table(&[]).lines().count(), 1);
    }
}
