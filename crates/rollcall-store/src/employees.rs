//! Employee registration, lookup and removal.

use crate::{Store, StoreError};
use rollcall_core::{Encoding, KnownFace};
use rusqlite::{params, ErrorCode, OptionalExtension};
use serde::Serialize;
use std::fmt;

/// Which unique column a registration collided with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateField {
    Name,
    Email,
    Phone,
}

impl fmt::Display for DuplicateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicateField::Name => f.write_str("this name is already registered"),
            DuplicateField::Email => f.write_str("this email is already in use"),
            DuplicateField::Phone => f.write_str("this phone number is already registered"),
        }
    }
}

/// Employee row without the blobs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Employee {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub designation: String,
}

/// Everything needed to insert an employee.
#[derive(Debug, Clone)]
pub struct NewEmployee {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub designation: String,
    pub encoding: Encoding,
    /// JPEG profile image.
    pub image: Vec<u8>,
}

impl Store {
    /// Report the first of name, email, phone already taken by another employee.
    pub fn find_duplicate(
        &self,
        name: &str,
        email: &str,
        phone: &str,
    ) -> Result<Option<DuplicateField>, StoreError> {
        let existing = self
            .conn
            .query_row(
                "SELECT name, email, phone FROM employees WHERE name = ?1 OR email = ?2 OR phone = ?3 LIMIT 1",
                params![name, email, phone],
                |row| {
                    Ok((
                        row.get::<_, Option<String>>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, Option<String>>(2)?,
                    ))
                },
            )
            .optional()?;

        Ok(existing.map(|(n, e, _)| {
            if n.as_deref() == Some(name) {
                DuplicateField::Name
            } else if e.as_deref() == Some(email) {
                DuplicateField::Email
            } else {
                DuplicateField::Phone
            }
        }))
    }

    /// Insert a new employee, returning its id.
    ///
    /// A unique-constraint violation maps to [`StoreError::Duplicate`].
    pub fn insert_employee(&self, emp: &NewEmployee) -> Result<i64, StoreError> {
        let result = self.conn.execute(
            "INSERT INTO employees (name, email, phone, designation, encoding, image)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                emp.name,
                emp.email,
                emp.phone,
                emp.designation,
                emp.encoding.to_blob(),
                emp.image
            ],
        );

        match result {
            Ok(_) => {
                let id = self.conn.last_insert_rowid();
                tracing::info!(id, name = %emp.name, "employee registered");
                Ok(id)
            }
            Err(rusqlite::Error::SqliteFailure(e, msg)) if e.code == ErrorCode::ConstraintViolation => {
                let msg = msg.unwrap_or_default();
                Err(match constraint_field(&msg) {
                    Some(field) => StoreError::Duplicate(field),
                    None => StoreError::Integrity(msg),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// All employees, by id.
    pub fn list_employees(&self) -> Result<Vec<Employee>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, email, phone, designation FROM employees ORDER BY id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Employee {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    email: row.get(2)?,
                    phone: row.get(3)?,
                    designation: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Names and encodings of every employee, in enrollment order.
    pub fn known_faces(&self) -> Result<Vec<KnownFace>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, encoding FROM employees ORDER BY id")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(name, blob)| match Encoding::from_blob(&blob) {
                Ok(encoding) => Ok(KnownFace { name, encoding }),
                Err(source) => Err(StoreError::Encoding { name, source }),
            })
            .collect()
    }

    /// Stored JPEG profile image.
    pub fn employee_image(&self, name: &str) -> Result<Vec<u8>, StoreError> {
        self.conn
            .query_row(
                "SELECT image FROM employees WHERE name = ?1",
                [name],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    /// Delete an employee; attendance rows go with it.
    pub fn remove_employee(&self, name: &str) -> Result<(), StoreError> {
        let deleted = self
            .conn
            .execute("DELETE FROM employees WHERE name = ?1", [name])?;
        if deleted == 0 {
            return Err(StoreError::NotFound(name.to_string()));
        }
        tracing::info!(name, "employee removed with attendance history");
        Ok(())
    }

    pub fn count_employees(&self) -> Result<u64, StoreError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM employees", [], |row| row.get(0))?;
        Ok(n as u64)
    }
}

/// Parse SQLite's "UNIQUE constraint failed: employees.email" message.
fn constraint_field(msg: &str) -> Option<DuplicateField> {
    let column = msg.rsplit("employees.").next()?;
    match column.trim() {
        "name" => Some(DuplicateField::Name),
        "email" => Some(DuplicateField::Email),
        "phone" => Some(DuplicateField::Phone),
        _ => None,
    }
}
