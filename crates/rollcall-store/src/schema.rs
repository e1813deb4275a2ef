pub const SCHEMA: &str = r#"
-- Registered staff. Name, email and phone are each unique.
CREATE TABLE IF NOT EXISTS employees (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT UNIQUE,
    email TEXT UNIQUE,
    phone TEXT UNIQUE,
    designation TEXT,
    encoding BLOB,   -- little-endian f32 face encoding
    image BLOB       -- JPEG profile image
);

-- One row per check-in; time_out stays NULL while the row is open.
-- Deleting an employee deletes their history.
CREATE TABLE IF NOT EXISTS attendance (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT,
    email TEXT,
    designation TEXT,
    date TEXT,
    time_in TEXT,
    time_out TEXT,
    FOREIGN KEY (name) REFERENCES employees(name) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_attendance_name_date ON attendance(name, date);
"#;
