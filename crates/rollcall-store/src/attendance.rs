//! Attendance recorder: idempotent check-in / check-out rows and reports.

use crate::{Store, StoreError, DATE_FORMAT, TIME_FORMAT};
use chrono::{NaiveDate, NaiveDateTime};
use rollcall_core::Action;
use rusqlite::{params, OptionalExtension};
use serde::Serialize;

/// Effect of a recorder or desk call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recorded {
    /// New open row inserted.
    Opened { id: i64 },
    /// Open row got its check-out time.
    Closed { id: i64 },
    /// Nothing to do: already open on check-in, nothing open on check-out,
    /// or the name is not registered.
    Unchanged,
    /// Check-in refused because the name is cooling down.
    Suppressed,
}

impl Recorded {
    /// Whether a row was written; callers refresh counters on `true`.
    pub fn changed(&self) -> bool {
        matches!(self, Recorded::Opened { .. } | Recorded::Closed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceRecord {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub designation: Option<String>,
    pub date: String,
    pub time_in: Option<String>,
    pub time_out: Option<String>,
}

impl AttendanceRecord {
    pub fn is_open(&self) -> bool {
        self.time_out.is_none()
    }
}

/// Dashboard counters for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyStats {
    pub date: String,
    pub total_staff: u64,
    pub present: u64,
}

const RECORD_COLUMNS: &str = "id, name, email, designation, date, time_in, time_out";

fn map_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<AttendanceRecord> {
    Ok(AttendanceRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        designation: row.get(3)?,
        date: row.get(4)?,
        time_in: row.get(5)?,
        time_out: row.get(6)?,
    })
}

impl Store {
    /// Apply one attendance action for `name` at local time `at`.
    pub fn record(&self, name: &str, action: Action, at: NaiveDateTime) -> Result<Recorded, StoreError> {
        let profile: Option<(Option<String>, Option<String>)> = self
            .conn
            .query_row(
                "SELECT email, designation FROM employees WHERE name = ?1",
                [name],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((email, designation)) = profile else {
            tracing::debug!(name, %action, "ignoring action for unregistered name");
            return Ok(Recorded::Unchanged);
        };

        let date = at.format(DATE_FORMAT).to_string();
        let time = at.format(TIME_FORMAT).to_string();

        let last: Option<(i64, Option<String>)> = self
            .conn
            .query_row(
                "SELECT id, time_out FROM attendance WHERE name = ?1 AND date = ?2 ORDER BY id DESC LIMIT 1",
                params![name, date],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let open_id = match &last {
            Some((id, None)) => Some(*id),
            _ => None,
        };

        let recorded = match (action, open_id) {
            (Action::CheckIn, None) => {
                self.conn.execute(
                    "INSERT INTO attendance (name, email, designation, date, time_in) VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![name, email, designation, date, time],
                )?;
                Recorded::Opened { id: self.conn.last_insert_rowid() }
            }
            (Action::CheckOut, Some(id)) => {
                self.conn.execute(
                    "UPDATE attendance SET time_out = ?1 WHERE id = ?2",
                    params![time, id],
                )?;
                Recorded::Closed { id }
            }
            _ => Recorded::Unchanged,
        };

        if recorded.changed() {
            tracing::info!(name, %action, %date, %time, "attendance recorded");
        }
        Ok(recorded)
    }

    /// Every attendance row, newest date first, then latest check-in first.
    pub fn all_records(&self) -> Result<Vec<AttendanceRecord>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM attendance ORDER BY date DESC, time_in DESC"
        ))?;
        let rows = stmt.query_map([], map_record)?.collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Attendance rows for one date, in insertion order.
    pub fn records_on(&self, date: NaiveDate) -> Result<Vec<AttendanceRecord>, StoreError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM attendance WHERE date = ?1 ORDER BY id"
        ))?;
        let rows = stmt
            .query_map([date.format(DATE_FORMAT).to_string()], map_record)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Total staff and distinct names with any row on `date`.
    pub fn daily_stats(&self, date: NaiveDate) -> Result<DailyStats, StoreError> {
        let day = date.format(DATE_FORMAT).to_string();
        let present: i64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT name) FROM attendance WHERE date = ?1",
            [&day],
            |row| row.get(0),
        )?;
        Ok(DailyStats {
            date: day,
            total_staff: self.count_employees()?,
            present: present as u64,
        })
    }
}
