//! crates/preschool_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! The record store sits behind `DatabaseService` so the core stays
//! independent of the concrete database.

use crate::domain::{
    AcademicReport, AttendanceRecord, ClassName, Event, FinancialRecord, NewUser, Remark,
    Role, Student, User, UserCredentials, UserPreferences,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// Filter for roster queries.
#[derive(Debug, Clone, Copy, Default)]
pub struct StudentFilter {
    pub class: Option<ClassName>,
    pub active_only: bool,
}

impl StudentFilter {
    pub fn active() -> Self {
        Self {
            class: None,
            active_only: true,
        }
    }

    pub fn active_in(class: ClassName) -> Self {
        Self {
            class: Some(class),
            active_only: true,
        }
    }
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Users & Auth ---
    /// Fails with `Conflict` when the email is taken.
    async fn create_user(&self, user: NewUser) -> PortResult<User>;

    async fn get_user(&self, user_id: Uuid) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn list_users(&self, role: Option<Role>) -> PortResult<Vec<User>>;

    async fn count_users(&self) -> PortResult<u64>;

    async fn delete_user(&self, user_id: Uuid) -> PortResult<()>;

    /// Deletes the student account(s) paired with a roll number; returns how many went.
    async fn delete_users_for_roll_number(&self, roll_number: &str) -> PortResult<u64>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    async fn get_preferences(&self, user_id: Uuid) -> PortResult<UserPreferences>;

    async fn save_preferences(&self, prefs: &UserPreferences) -> PortResult<()>;

    // --- Students ---
    /// Fails with `Conflict` when the roll number is taken. A stored roll number
    /// also advances its prefix's sequence, so it is never allocated again.
    async fn create_student(&self, student: Student) -> PortResult<Student>;

    /// Reserves the next roll number for `class`. Numbers are never handed out
    /// twice, including those of deleted students or students who changed class.
    async fn allocate_roll_number(&self, class: ClassName) -> PortResult<String>;

    async fn get_student_by_roll(&self, roll_number: &str) -> PortResult<Student>;

    async fn list_students(&self, filter: StudentFilter) -> PortResult<Vec<Student>>;

    async fn update_student(&self, student: &Student) -> PortResult<()>;

    async fn delete_student(&self, roll_number: &str) -> PortResult<()>;

    // --- Attendance ---
    async fn get_attendance(
        &self,
        class: ClassName,
        date: NaiveDate,
    ) -> PortResult<Option<AttendanceRecord>>;

    /// All records with `start <= date <= end`.
    async fn list_attendance_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> PortResult<Vec<AttendanceRecord>>;

    /// Writes the record for its (class, date) key if the stored version still
    /// equals `expected_version` (`None` meaning "no record yet"). Returns the
    /// stored record with its new version, or `Conflict` on a stale write.
    async fn save_attendance(
        &self,
        record: AttendanceRecord,
        expected_version: Option<i64>,
    ) -> PortResult<AttendanceRecord>;

    // --- Academic Reports ---
    async fn create_report(&self, report: AcademicReport) -> PortResult<AcademicReport>;

    async fn get_report(&self, report_id: Uuid) -> PortResult<AcademicReport>;

    async fn list_reports_for_student(&self, roll_number: &str) -> PortResult<Vec<AcademicReport>>;

    async fn update_report(&self, report: &AcademicReport) -> PortResult<()>;

    async fn delete_report(&self, report_id: Uuid) -> PortResult<()>;

    // --- Remarks ---
    async fn create_remark(&self, remark: Remark) -> PortResult<Remark>;

    /// Newest first.
    async fn list_remarks_for_student(&self, roll_number: &str) -> PortResult<Vec<Remark>>;

    async fn delete_remark(&self, remark_id: Uuid) -> PortResult<()>;

    // --- Events ---
    async fn create_event(&self, event: Event) -> PortResult<Event>;

    async fn get_event(&self, event_id: Uuid) -> PortResult<Event>;

    /// Events that have not ended before `from`, ordered by start date.
    async fn list_events(&self, from: Option<NaiveDate>) -> PortResult<Vec<Event>>;

    async fn update_event(&self, event: &Event) -> PortResult<()>;

    async fn delete_event(&self, event_id: Uuid) -> PortResult<()>;

    // --- Finance ---
    async fn create_financial_record(&self, record: FinancialRecord) -> PortResult<FinancialRecord>;

    async fn list_financial_records(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> PortResult<Vec<FinancialRecord>>;

    async fn delete_financial_record(&self, record_id: Uuid) -> PortResult<()>;
}
