//! crates/preschool_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database; they derive `serde` so the
//! HTTP layer and the JSON columns can reuse them directly.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// Classes and Roles
//=========================================================================================

/// The fixed set of classes a student can be enrolled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ClassName {
    #[serde(rename = "play")]
    Play,
    #[serde(rename = "nursery")]
    Nursery,
    #[serde(rename = "lkg")]
    Lkg,
    #[serde(rename = "ukg")]
    Ukg,
    #[serde(rename = "1st")]
    First,
}

impl ClassName {
    pub const ALL: [ClassName; 5] = [
        ClassName::Play,
        ClassName::Nursery,
        ClassName::Lkg,
        ClassName::Ukg,
        ClassName::First,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ClassName::Play => "play",
            ClassName::Nursery => "nursery",
            ClassName::Lkg => "lkg",
            ClassName::Ukg => "ukg",
            ClassName::First => "1st",
        }
    }

    /// Prefix used when generating roll numbers, e.g. `LKG-007`.
    pub fn roll_prefix(self) -> &'static str {
        match self {
            ClassName::Play => "PG",
            ClassName::Nursery => "NUR",
            ClassName::Lkg => "LKG",
            ClassName::Ukg => "UKG",
            ClassName::First => "1ST",
        }
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown value '{value}' for {kind}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

impl FromStr for ClassName {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ClassName::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownVariant::new("class", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Teacher,
    Student,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Teacher => "teacher",
            Role::Student => "student",
        }
    }

    /// Admins and teachers see every student; students see only themselves.
    pub fn is_staff(self) -> bool {
        matches!(self, Role::Admin | Role::Teacher)
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "teacher" => Ok(Role::Teacher),
            "student" => Ok(Role::Student),
            other => Err(UnknownVariant::new("role", other)),
        }
    }
}

//=========================================================================================
// Students and Users
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentInfo {
    pub father_name: String,
    pub mother_name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// A student enrolled in the school. `roll_number` is the natural key used by
/// attendance, reports and remarks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: Uuid,
    pub roll_number: String,
    pub first_name: String,
    pub last_name: String,
    pub class: ClassName,
    pub age: u8,
    pub parent: ParentInfo,
    pub admission_date: NaiveDate,
    pub is_active: bool,
}

impl Student {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Input for creating a student. The roll number is generated when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStudent {
    #[serde(default)]
    pub roll_number: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub class: ClassName,
    pub age: u8,
    pub parent: ParentInfo,
    pub admission_date: NaiveDate,
}

impl NewStudent {
    pub fn into_student(self, id: Uuid, roll_number: String) -> Student {
        Student {
            id,
            roll_number,
            first_name: self.first_name,
            last_name: self.last_name,
            class: self.class,
            age: self.age,
            parent: self.parent,
            admission_date: self.admission_date,
            is_active: true,
        }
    }
}

// Represents a user - used throughout app
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    /// Set for student accounts; pairs the account with a `Student`.
    pub roll_number: Option<String>,
}

impl User {
    pub fn snapshot(&self) -> UserSnapshot {
        UserSnapshot {
            user_id: self.user_id,
            display_name: self.display_name.clone(),
            role: self.role,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub hashed_password: String,
    pub display_name: String,
    pub role: Role,
    pub roll_number: Option<String>,
}

// Only used internally for login - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Audit copy of the user who touched a record, frozen at write time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSnapshot {
    pub user_id: Uuid,
    pub display_name: String,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    #[default]
    En,
    Hi,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    pub user_id: Uuid,
    pub language: Language,
    pub dismissed_announcements: Vec<Uuid>,
}

impl UserPreferences {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            language: Language::default(),
            dismissed_announcements: Vec::new(),
        }
    }

    /// Returns false when the announcement was already dismissed.
    pub fn dismiss(&mut self, event_id: Uuid) -> bool {
        if self.dismissed_announcements.contains(&event_id) {
            return false;
        }
        self.dismissed_announcements.push(event_id);
        true
    }
}

//=========================================================================================
// Attendance
//=========================================================================================

/// A status a teacher can record for a student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkedStatus {
    Present,
    Absent,
    Late,
}

/// The resolved status of a roster student on a day. `Missed` means the
/// student has no entry in that day's record (or there is no record at all).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Missed,
}

impl From<MarkedStatus> for AttendanceStatus {
    fn from(value: MarkedStatus) -> Self {
        match value {
            MarkedStatus::Present => AttendanceStatus::Present,
            MarkedStatus::Absent => AttendanceStatus::Absent,
            MarkedStatus::Late => AttendanceStatus::Late,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceEntry {
    pub roll_number: String,
    pub status: MarkedStatus,
    #[serde(default)]
    pub remarks: Option<String>,
}

/// At most one record exists per (class, date).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub class: ClassName,
    pub date: NaiveDate,
    pub entries: Vec<AttendanceEntry>,
    pub marked_by: Uuid,
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

//=========================================================================================
// Academic Reports and Remarks
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Term {
    Term1,
    Term2,
    Term3,
    Final,
}

impl Term {
    pub fn as_str(self) -> &'static str {
        match self {
            Term::Term1 => "term1",
            Term::Term2 => "term2",
            Term::Term3 => "term3",
            Term::Final => "final",
        }
    }
}

impl FromStr for Term {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "term1" => Ok(Term::Term1),
            "term2" => Ok(Term::Term2),
            "term3" => Ok(Term::Term3),
            "final" => Ok(Term::Final),
            other => Err(UnknownVariant::new("term", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectMarks {
    pub subject: String,
    pub marks: f64,
    pub max_marks: f64,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub not_applicable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcademicReport {
    pub id: Uuid,
    pub roll_number: String,
    pub term: Term,
    pub academic_year: String,
    pub subjects: Vec<SubjectMarks>,
    pub created_by: UserSnapshot,
    pub updated_by: Option<UserSnapshot>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemarkKind {
    Positive,
    Negative,
    Neutral,
}

impl RemarkKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RemarkKind::Positive => "positive",
            RemarkKind::Negative => "negative",
            RemarkKind::Neutral => "neutral",
        }
    }
}

impl FromStr for RemarkKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positive" => Ok(RemarkKind::Positive),
            "negative" => Ok(RemarkKind::Negative),
            "neutral" => Ok(RemarkKind::Neutral),
            other => Err(UnknownVariant::new("remark kind", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Remark {
    pub id: Uuid,
    pub roll_number: String,
    pub subject: String,
    pub text: String,
    pub kind: RemarkKind,
    pub date: NaiveDate,
    pub author: Uuid,
}

//=========================================================================================
// Events and Finance
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub is_announcement: bool,
    pub created_by: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinanceKind {
    Income,
    Expense,
}

impl FinanceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FinanceKind::Income => "income",
            FinanceKind::Expense => "expense",
        }
    }
}

impl FromStr for FinanceKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(FinanceKind::Income),
            "expense" => Ok(FinanceKind::Expense),
            other => Err(UnknownVariant::new("finance kind", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialRecord {
    pub id: Uuid,
    pub kind: FinanceKind,
    pub category: String,
    pub amount_cents: i64,
    pub description: String,
    pub date: NaiveDate,
    pub roll_number: Option<String>,
    pub created_by: Uuid,
}
