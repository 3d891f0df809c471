//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.
//!
//! Enums are stored as TEXT using their wire names; nested values (parent
//! contact, attendance entries, report subjects, audit snapshots) are JSONB.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use preschool_core::domain::{
    AcademicReport, AttendanceEntry, AttendanceRecord, ClassName, Event, FinancialRecord,
    Language, NewUser, ParentInfo, Remark, Role, Student, SubjectMarks, User, UserCredentials,
    UserPreferences, UserSnapshot,
};
use preschool_core::ports::{DatabaseService, PortError, PortResult, StudentFilter};
use preschool_core::roster::{format_roll_number, split_roll_number};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

/// Unique-key violations become `Conflict`; everything else is unexpected.
fn write_error(e: sqlx::Error, conflict: impl FnOnce() -> String) -> PortError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => PortError::Conflict(conflict()),
        _ => unexpected(e),
    }
}

fn parse_column<T>(column: &str, raw: &str) -> PortResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| PortError::Unexpected(format!("Corrupt {} column: {}", column, e)))
}

fn require_row(rows_affected: u64, what: &str, key: impl std::fmt::Display) -> PortResult<()> {
    if rows_affected == 0 {
        return Err(PortError::NotFound(format!("{} {} not found", what, key)));
    }
    Ok(())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    email: String,
    display_name: String,
    role: String,
    roll_number: Option<String>,
}
impl UserRecord {
    fn to_domain(self) -> PortResult<User> {
        Ok(User {
            user_id: self.user_id,
            email: self.email,
            display_name: self.display_name,
            role: parse_column("role", &self.role)?,
            roll_number: self.roll_number,
        })
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    user_id: Uuid,
    email: String,
    hashed_password: String,
}

#[derive(FromRow)]
struct PreferencesRecord {
    user_id: Uuid,
    language: String,
    dismissed_announcements: Vec<Uuid>,
}
impl PreferencesRecord {
    fn to_domain(self) -> PortResult<UserPreferences> {
        let language = match self.language.as_str() {
            "en" => Language::En,
            "hi" => Language::Hi,
            other => {
                return Err(PortError::Unexpected(format!(
                    "Corrupt language column: {}",
                    other
                )))
            }
        };
        Ok(UserPreferences {
            user_id: self.user_id,
            language,
            dismissed_announcements: self.dismissed_announcements,
        })
    }
}

fn language_str(language: Language) -> &'static str {
    match language {
        Language::En => "en",
        Language::Hi => "hi",
    }
}

#[derive(FromRow)]
struct StudentRecord {
    id: Uuid,
    roll_number: String,
    first_name: String,
    last_name: String,
    class: String,
    age: i16,
    parent: Json<ParentInfo>,
    admission_date: NaiveDate,
    is_active: bool,
}
impl StudentRecord {
    fn to_domain(self) -> PortResult<Student> {
        Ok(Student {
            id: self.id,
            roll_number: self.roll_number,
            first_name: self.first_name,
            last_name: self.last_name,
            class: parse_column("class", &self.class)?,
            age: u8::try_from(self.age)
                .map_err(|_| PortError::Unexpected(format!("Corrupt age column: {}", self.age)))?,
            parent: self.parent.0,
            admission_date: self.admission_date,
            is_active: self.is_active,
        })
    }
}

#[derive(FromRow)]
struct AttendanceRow {
    class: String,
    date: NaiveDate,
    entries: Json<Vec<AttendanceEntry>>,
    marked_by: Uuid,
    version: i64,
    updated_at: DateTime<Utc>,
}
impl AttendanceRow {
    fn to_domain(self) -> PortResult<AttendanceRecord> {
        Ok(AttendanceRecord {
            class: parse_column("class", &self.class)?,
            date: self.date,
            entries: self.entries.0,
            marked_by: self.marked_by,
            version: self.version,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct ReportRecord {
    id: Uuid,
    roll_number: String,
    term: String,
    academic_year: String,
    subjects: Json<Vec<SubjectMarks>>,
    created_by: Json<UserSnapshot>,
    updated_by: Option<Json<UserSnapshot>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl ReportRecord {
    fn to_domain(self) -> PortResult<AcademicReport> {
        Ok(AcademicReport {
            id: self.id,
            roll_number: self.roll_number,
            term: parse_column("term", &self.term)?,
            academic_year: self.academic_year,
            subjects: self.subjects.0,
            created_by: self.created_by.0,
            updated_by: self.updated_by.map(|j| j.0),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct RemarkRecord {
    id: Uuid,
    roll_number: String,
    subject: String,
    text: String,
    kind: String,
    date: NaiveDate,
    author: Uuid,
}
impl RemarkRecord {
    fn to_domain(self) -> PortResult<Remark> {
        Ok(Remark {
            id: self.id,
            roll_number: self.roll_number,
            subject: self.subject,
            text: self.text,
            kind: parse_column("kind", &self.kind)?,
            date: self.date,
            author: self.author,
        })
    }
}

#[derive(FromRow)]
struct EventRecord {
    id: Uuid,
    title: String,
    description: String,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    location: Option<String>,
    is_announcement: bool,
    created_by: Uuid,
}
impl EventRecord {
    fn to_domain(self) -> Event {
        Event {
            id: self.id,
            title: self.title,
            description: self.description,
            start_date: self.start_date,
            end_date: self.end_date,
            location: self.location,
            is_announcement: self.is_announcement,
            created_by: self.created_by,
        }
    }
}

#[derive(FromRow)]
struct FinancialRow {
    id: Uuid,
    kind: String,
    category: String,
    amount_cents: i64,
    description: String,
    date: NaiveDate,
    roll_number: Option<String>,
    created_by: Uuid,
}
impl FinancialRow {
    fn to_domain(self) -> PortResult<FinancialRecord> {
        Ok(FinancialRecord {
            id: self.id,
            kind: parse_column("kind", &self.kind)?,
            category: self.category,
            amount_cents: self.amount_cents,
            description: self.description,
            date: self.date,
            roll_number: self.roll_number,
            created_by: self.created_by,
        })
    }
}

fn all<R, T>(rows: Vec<R>, convert: impl Fn(R) -> PortResult<T>) -> PortResult<Vec<T>> {
    rows.into_iter().map(convert).collect()
}

const USER_COLUMNS: &str = "user_id, email, display_name, role, roll_number";
const STUDENT_COLUMNS: &str =
    "id, roll_number, first_name, last_name, class, age, parent, admission_date, is_active";
const ATTENDANCE_COLUMNS: &str = "class, date, entries, marked_by, version, updated_at";
const REPORT_COLUMNS: &str = "id, roll_number, term, academic_year, subjects, created_by, \
     updated_by, created_at, updated_at";

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    // --- Users & Auth ---
    async fn create_user(&self, user: NewUser) -> PortResult<User> {
        let email = user.email.trim().to_lowercase();
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "INSERT INTO users (user_id, email, hashed_password, display_name, role, roll_number) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&email)
        .bind(&user.hashed_password)
        .bind(&user.display_name)
        .bind(user.role.as_str())
        .bind(&user.roll_number)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error(e, || format!("Email {} is already registered", email)))?;

        record.to_domain()
    }

    async fn get_user(&self, user_id: Uuid) -> PortResult<User> {
        sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {} FROM users WHERE user_id = $1",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))?
        .to_domain()
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let email = email.trim().to_lowercase();
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT user_id, email, hashed_password FROM users WHERE email = $1",
        )
        .bind(&email)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("User {} not found", email)))?;

        Ok(UserCredentials {
            user_id: record.user_id,
            email: record.email,
            hashed_password: record.hashed_password,
        })
    }

    async fn list_users(&self, role: Option<Role>) -> PortResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {} FROM users WHERE ($1::TEXT IS NULL OR role = $1) ORDER BY email",
            USER_COLUMNS
        ))
        .bind(role.map(Role::as_str))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        all(rows, UserRecord::to_domain)
    }

    async fn count_users(&self) -> PortResult<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(count.max(0) as u64)
    }

    async fn delete_user(&self, user_id: Uuid) -> PortResult<()> {
        // Sessions and preferences go with the user via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        require_row(result.rows_affected(), "User", user_id)
    }

    async fn delete_users_for_roll_number(&self, roll_number: &str) -> PortResult<u64> {
        let result = sqlx::query("DELETE FROM users WHERE roll_number = $1")
            .bind(roll_number)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(result.rows_affected())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let row: Option<(Uuid,)> = sqlx::query_as(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > NOW()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        row.map(|(user_id,)| user_id).ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn get_preferences(&self, user_id: Uuid) -> PortResult<UserPreferences> {
        let record = sqlx::query_as::<_, PreferencesRecord>(
            "SELECT user_id, language, dismissed_announcements FROM user_preferences \
             WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        match record {
            Some(record) => record.to_domain(),
            None => Ok(UserPreferences::new(user_id)),
        }
    }

    async fn save_preferences(&self, prefs: &UserPreferences) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO user_preferences (user_id, language, dismissed_announcements) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (user_id) DO UPDATE SET language = EXCLUDED.language, \
             dismissed_announcements = EXCLUDED.dismissed_announcements",
        )
        .bind(prefs.user_id)
        .bind(language_str(prefs.language))
        .bind(&prefs.dismissed_announcements)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    // --- Students ---
    async fn create_student(&self, student: Student) -> PortResult<Student> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        sqlx::query(
            "INSERT INTO students (id, roll_number, first_name, last_name, class, age, parent, \
             admission_date, is_active) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(student.id)
        .bind(&student.roll_number)
        .bind(&student.first_name)
        .bind(&student.last_name)
        .bind(student.class.as_str())
        .bind(i16::from(student.age))
        .bind(Json(&student.parent))
        .bind(student.admission_date)
        .bind(student.is_active)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            write_error(e, || {
                format!("Roll number {} is already taken", student.roll_number)
            })
        })?;

        if let Some((prefix, sequence)) = split_roll_number(&student.roll_number) {
            sqlx::query(
                "INSERT INTO roll_sequences (prefix, last_value) VALUES ($1, $2) \
                 ON CONFLICT (prefix) DO UPDATE \
                 SET last_value = GREATEST(roll_sequences.last_value, EXCLUDED.last_value)",
            )
            .bind(prefix)
            .bind(i64::from(sequence))
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        }

        tx.commit().await.map_err(unexpected)?;
        Ok(student)
    }

    async fn allocate_roll_number(&self, class: ClassName) -> PortResult<String> {
        let sequence: i64 = sqlx::query_scalar(
            "INSERT INTO roll_sequences (prefix, last_value) VALUES ($1, 1) \
             ON CONFLICT (prefix) DO UPDATE SET last_value = roll_sequences.last_value + 1 \
             RETURNING last_value",
        )
        .bind(class.roll_prefix())
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        let sequence = u32::try_from(sequence)
            .map_err(|_| PortError::Unexpected(format!("Roll sequence {} out of range", sequence)))?;
        Ok(format_roll_number(class, sequence))
    }

    async fn get_student_by_roll(&self, roll_number: &str) -> PortResult<Student> {
        sqlx::query_as::<_, StudentRecord>(&format!(
            "SELECT {} FROM students WHERE roll_number = $1",
            STUDENT_COLUMNS
        ))
        .bind(roll_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("Student {} not found", roll_number)))?
        .to_domain()
    }

    async fn list_students(&self, filter: StudentFilter) -> PortResult<Vec<Student>> {
        let rows = sqlx::query_as::<_, StudentRecord>(&format!(
            "SELECT {} FROM students \
             WHERE ($1::TEXT IS NULL OR class = $1) AND (NOT $2 OR is_active) \
             ORDER BY roll_number",
            STUDENT_COLUMNS
        ))
        .bind(filter.class.map(ClassName::as_str))
        .bind(filter.active_only)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        all(rows, StudentRecord::to_domain)
    }

    async fn update_student(&self, student: &Student) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE students SET first_name = $2, last_name = $3, class = $4, age = $5, \
             parent = $6, admission_date = $7, is_active = $8 WHERE roll_number = $1",
        )
        .bind(&student.roll_number)
        .bind(&student.first_name)
        .bind(&student.last_name)
        .bind(student.class.as_str())
        .bind(i16::from(student.age))
        .bind(Json(&student.parent))
        .bind(student.admission_date)
        .bind(student.is_active)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        require_row(result.rows_affected(), "Student", &student.roll_number)
    }

    async fn delete_student(&self, roll_number: &str) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM students WHERE roll_number = $1")
            .bind(roll_number)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        require_row(result.rows_affected(), "Student", roll_number)
    }

    // --- Attendance ---
    async fn get_attendance(
        &self,
        class: ClassName,
        date: NaiveDate,
    ) -> PortResult<Option<AttendanceRecord>> {
        sqlx::query_as::<_, AttendanceRow>(&format!(
            "SELECT {} FROM attendance WHERE class = $1 AND date = $2",
            ATTENDANCE_COLUMNS
        ))
        .bind(class.as_str())
        .bind(date)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .map(AttendanceRow::to_domain)
        .transpose()
    }

    async fn list_attendance_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> PortResult<Vec<AttendanceRecord>> {
        let rows = sqlx::query_as::<_, AttendanceRow>(&format!(
            "SELECT {} FROM attendance WHERE date BETWEEN $1 AND $2 ORDER BY date, class",
            ATTENDANCE_COLUMNS
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        all(rows, AttendanceRow::to_domain)
    }

    async fn save_attendance(
        &self,
        record: AttendanceRecord,
        expected_version: Option<i64>,
    ) -> PortResult<AttendanceRecord> {
        // The version check happens inside the single statement, so two
        // concurrent writers cannot both succeed.
        let saved = match expected_version {
            None => {
                sqlx::query_as::<_, AttendanceRow>(&format!(
                    "INSERT INTO attendance (class, date, entries, marked_by, version, updated_at) \
                     VALUES ($1, $2, $3, $4, 1, NOW()) \
                     ON CONFLICT (class, date) DO NOTHING RETURNING {}",
                    ATTENDANCE_COLUMNS
                ))
                .bind(record.class.as_str())
                .bind(record.date)
                .bind(Json(&record.entries))
                .bind(record.marked_by)
                .fetch_optional(&self.pool)
                .await
            }
            Some(version) => {
                sqlx::query_as::<_, AttendanceRow>(&format!(
                    "UPDATE attendance SET entries = $3, marked_by = $4, \
                     version = version + 1, updated_at = NOW() \
                     WHERE class = $1 AND date = $2 AND version = $5 RETURNING {}",
                    ATTENDANCE_COLUMNS
                ))
                .bind(record.class.as_str())
                .bind(record.date)
                .bind(Json(&record.entries))
                .bind(record.marked_by)
                .bind(version)
                .fetch_optional(&self.pool)
                .await
            }
        }
        .map_err(unexpected)?;

        match saved {
            Some(row) => row.to_domain(),
            None => Err(PortError::Conflict(format!(
                "Attendance for {} on {} changed since it was loaded",
                record.class, record.date
            ))),
        }
    }

    // --- Academic Reports ---
    async fn create_report(&self, report: AcademicReport) -> PortResult<AcademicReport> {
        sqlx::query(
            "INSERT INTO academic_reports (id, roll_number, term, academic_year, subjects, \
             created_by, updated_by, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(report.id)
        .bind(&report.roll_number)
        .bind(report.term.as_str())
        .bind(&report.academic_year)
        .bind(Json(&report.subjects))
        .bind(Json(&report.created_by))
        .bind(report.updated_by.as_ref().map(Json))
        .bind(report.created_at)
        .bind(report.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            write_error(e, || {
                format!(
                    "{} already has a {} report for {}",
                    report.roll_number,
                    report.term.as_str(),
                    report.academic_year
                )
            })
        })?;

        Ok(report)
    }

    async fn get_report(&self, report_id: Uuid) -> PortResult<AcademicReport> {
        sqlx::query_as::<_, ReportRecord>(&format!(
            "SELECT {} FROM academic_reports WHERE id = $1",
            REPORT_COLUMNS
        ))
        .bind(report_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("Report {} not found", report_id)))?
        .to_domain()
    }

    async fn list_reports_for_student(&self, roll_number: &str) -> PortResult<Vec<AcademicReport>> {
        let rows = sqlx::query_as::<_, ReportRecord>(&format!(
            "SELECT {} FROM academic_reports WHERE roll_number = $1 ORDER BY created_at",
            REPORT_COLUMNS
        ))
        .bind(roll_number)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        all(rows, ReportRecord::to_domain)
    }

    async fn update_report(&self, report: &AcademicReport) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE academic_reports SET term = $2, academic_year = $3, subjects = $4, \
             updated_by = $5, updated_at = $6 WHERE id = $1",
        )
        .bind(report.id)
        .bind(report.term.as_str())
        .bind(&report.academic_year)
        .bind(Json(&report.subjects))
        .bind(report.updated_by.as_ref().map(Json))
        .bind(report.updated_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        require_row(result.rows_affected(), "Report", report.id)
    }

    async fn delete_report(&self, report_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM academic_reports WHERE id = $1")
            .bind(report_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        require_row(result.rows_affected(), "Report", report_id)
    }

    // --- Remarks ---
    async fn create_remark(&self, remark: Remark) -> PortResult<Remark> {
        sqlx::query(
            "INSERT INTO remarks (id, roll_number, subject, text, kind, date, author) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(remark.id)
        .bind(&remark.roll_number)
        .bind(&remark.subject)
        .bind(&remark.text)
        .bind(remark.kind.as_str())
        .bind(remark.date)
        .bind(remark.author)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(remark)
    }

    async fn list_remarks_for_student(&self, roll_number: &str) -> PortResult<Vec<Remark>> {
        let rows = sqlx::query_as::<_, RemarkRecord>(
            "SELECT id, roll_number, subject, text, kind, date, author FROM remarks \
             WHERE roll_number = $1 ORDER BY date DESC",
        )
        .bind(roll_number)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        all(rows, RemarkRecord::to_domain)
    }

    async fn delete_remark(&self, remark_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM remarks WHERE id = $1")
            .bind(remark_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        require_row(result.rows_affected(), "Remark", remark_id)
    }

    // --- Events ---
    async fn create_event(&self, event: Event) -> PortResult<Event> {
        sqlx::query(
            "INSERT INTO events (id, title, description, start_date, end_date, location, \
             is_announcement, created_by) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(event.id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.start_date)
        .bind(event.end_date)
        .bind(&event.location)
        .bind(event.is_announcement)
        .bind(event.created_by)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(event)
    }

    async fn get_event(&self, event_id: Uuid) -> PortResult<Event> {
        sqlx::query_as::<_, EventRecord>("SELECT * FROM events WHERE id = $1")
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .map(EventRecord::to_domain)
            .ok_or_else(|| PortError::NotFound(format!("Event {} not found", event_id)))
    }

    async fn list_events(&self, from: Option<NaiveDate>) -> PortResult<Vec<Event>> {
        let rows = sqlx::query_as::<_, EventRecord>(
            "SELECT * FROM events \
             WHERE ($1::DATE IS NULL OR COALESCE(end_date, start_date) >= $1) \
             ORDER BY start_date",
        )
        .bind(from)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(rows.into_iter().map(EventRecord::to_domain).collect())
    }

    async fn update_event(&self, event: &Event) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE events SET title = $2, description = $3, start_date = $4, end_date = $5, \
             location = $6, is_announcement = $7 WHERE id = $1",
        )
        .bind(event.id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.start_date)
        .bind(event.end_date)
        .bind(&event.location)
        .bind(event.is_announcement)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        require_row(result.rows_affected(), "Event", event.id)
    }

    async fn delete_event(&self, event_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(event_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        require_row(result.rows_affected(), "Event", event_id)
    }

    // --- Finance ---
    async fn create_financial_record(&self, record: FinancialRecord) -> PortResult<FinancialRecord> {
        sqlx::query(
            "INSERT INTO financial_records (id, kind, category, amount_cents, description, date, \
             roll_number, created_by) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(record.id)
        .bind(record.kind.as_str())
        .bind(&record.category)
        .bind(record.amount_cents)
        .bind(&record.description)
        .bind(record.date)
        .bind(&record.roll_number)
        .bind(record.created_by)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(record)
    }

    async fn list_financial_records(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> PortResult<Vec<FinancialRecord>> {
        let rows = sqlx::query_as::<_, FinancialRow>(
            "SELECT * FROM financial_records WHERE date BETWEEN $1 AND $2 ORDER BY date",
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        all(rows, FinancialRow::to_domain)
    }

    async fn delete_financial_record(&self, record_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM financial_records WHERE id = $1")
            .bind(record_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        require_row(result.rows_affected(), "Financial record", record_id)
    }
}
