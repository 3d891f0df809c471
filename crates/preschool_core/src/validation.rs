//! Synchronous input checks run before anything touches the record store.

use crate::domain::{
    AttendanceEntry, Event, FinancialRecord, NewStudent, ParentInfo, Remark, Role, Student,
    SubjectMarks,
};
use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));
static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9][0-9 \-]{6,18}[0-9]$").expect("valid phone regex"));
static ROLL_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(PG|NUR|LKG|UKG|1ST)-[0-9]{3,}$").expect("valid roll regex"));
static ACADEMIC_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}$").expect("valid year regex"));

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_REMARK_LEN: usize = 1000;
pub const STUDENT_AGE_RANGE: std::ops::RangeInclusive<u8> = 2..=8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Every problem found in one input, reported together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

impl ValidationErrors {
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    fn require(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.push(field, "is required");
        }
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email.trim())
}

pub fn is_valid_roll_number(roll: &str) -> bool {
    ROLL_NUMBER.is_match(roll)
}

fn check_parent(errors: &mut ValidationErrors, parent: &ParentInfo) {
    errors.require("parent.father_name", &parent.father_name);
    errors.require("parent.mother_name", &parent.mother_name);
    if !PHONE.is_match(parent.phone.trim()) {
        errors.push("parent.phone", "must be a phone number");
    }
    if let Some(email) = parent.email.as_deref().filter(|e| !e.trim().is_empty()) {
        if !is_valid_email(email) {
            errors.push("parent.email", "must be an email address");
        }
    }
}

fn check_student_fields(
    errors: &mut ValidationErrors,
    first_name: &str,
    last_name: &str,
    age: u8,
    parent: &ParentInfo,
    admission_date: NaiveDate,
    today: NaiveDate,
) {
    errors.require("first_name", first_name);
    errors.require("last_name", last_name);
    if !STUDENT_AGE_RANGE.contains(&age) {
        errors.push(
            "age",
            format!(
                "must be between {} and {}",
                STUDENT_AGE_RANGE.start(),
                STUDENT_AGE_RANGE.end()
            ),
        );
    }
    if admission_date > today {
        errors.push("admission_date", "cannot be in the future");
    }
    check_parent(errors, parent);
}

pub fn validate_new_student(student: &NewStudent, today: NaiveDate) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    check_student_fields(
        &mut errors,
        &student.first_name,
        &student.last_name,
        student.age,
        &student.parent,
        student.admission_date,
        today,
    );
    if let Some(roll) = &student.roll_number {
        if !is_valid_roll_number(roll) {
            errors.push("roll_number", "must look like LKG-001");
        } else if !roll.starts_with(&format!("{}-", student.class.roll_prefix())) {
            errors.push(
                "roll_number",
                format!("must start with {}-", student.class.roll_prefix()),
            );
        }
    }
    errors.into_result()
}

pub fn validate_student(student: &Student, today: NaiveDate) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    check_student_fields(
        &mut errors,
        &student.first_name,
        &student.last_name,
        student.age,
        &student.parent,
        student.admission_date,
        today,
    );
    errors.into_result()
}

pub fn validate_account(
    email: &str,
    password: &str,
    display_name: &str,
    role: Role,
    roll_number: Option<&str>,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if !is_valid_email(email) {
        errors.push("email", "must be an email address");
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(
            "password",
            format!("must be at least {} characters", MIN_PASSWORD_LEN),
        );
    }
    errors.require("display_name", display_name);
    match (role, roll_number) {
        (Role::Student, None) => errors.push("roll_number", "is required for student accounts"),
        (Role::Student, Some(roll)) if !is_valid_roll_number(roll) => {
            errors.push("roll_number", "must look like LKG-001")
        }
        (Role::Admin | Role::Teacher, Some(_)) => {
            errors.push("roll_number", "only student accounts have a roll number")
        }
        _ => {}
    }
    errors.into_result()
}

pub fn validate_subjects(subjects: &[SubjectMarks]) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if subjects.is_empty() {
        errors.push("subjects", "at least one subject is required");
    }
    let mut seen = HashSet::new();
    for (i, s) in subjects.iter().enumerate() {
        let field = |name: &str| format!("subjects[{}].{}", i, name);
        if s.subject.trim().is_empty() {
            errors.push(field("subject"), "is required");
        } else if !seen.insert(s.subject.trim().to_lowercase()) {
            errors.push(field("subject"), "is listed twice");
        }
        if !(s.max_marks.is_finite() && s.max_marks > 0.0) {
            errors.push(field("max_marks"), "must be greater than zero");
        }
        if !s.not_applicable && !(s.marks.is_finite() && s.marks >= 0.0 && s.marks <= s.max_marks) {
            errors.push(field("marks"), "must be between 0 and max_marks");
        }
    }
    errors.into_result()
}

pub fn validate_academic_year(year: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if !ACADEMIC_YEAR.is_match(year) {
        errors.push("academic_year", "must look like 2024-25");
    }
    errors.into_result()
}

pub fn validate_remark(remark: &Remark, today: NaiveDate) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    errors.require("subject", &remark.subject);
    errors.require("text", &remark.text);
    if remark.text.chars().count() > MAX_REMARK_LEN {
        errors.push(
            "text",
            format!("must be at most {} characters", MAX_REMARK_LEN),
        );
    }
    if remark.date > today {
        errors.push("date", "cannot be in the future");
    }
    errors.into_result()
}

pub fn validate_event(event: &Event) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    errors.require("title", &event.title);
    if let Some(end) = event.end_date {
        if end < event.start_date {
            errors.push("end_date", "cannot be before start_date");
        }
    }
    errors.into_result()
}

pub fn validate_financial_record(record: &FinancialRecord) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    errors.require("category", &record.category);
    if record.amount_cents <= 0 {
        errors.push("amount_cents", "must be positive");
    }
    if let Some(roll) = &record.roll_number {
        if !is_valid_roll_number(roll) {
            errors.push("roll_number", "must look like LKG-001");
        }
    }
    errors.into_result()
}

/// Entries must name students on the class roster, each at most once.
pub fn validate_attendance_entries(
    entries: &[AttendanceEntry],
    roster: &[String],
    date: NaiveDate,
    today: NaiveDate,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if date > today {
        errors.push("date", "attendance cannot be marked for a future date");
    }
    let mut seen = HashSet::new();
    for (i, e) in entries.iter().enumerate() {
        if !roster.iter().any(|r| r == &e.roll_number) {
            errors.push(
                format!("entries[{}].roll_number", i),
                format!("{} is not on the class roster", e.roll_number),
            );
        } else if !seen.insert(e.roll_number.as_str()) {
            errors.push(
                format!("entries[{}].roll_number", i),
                format!("{} is listed twice", e.roll_number),
            );
        }
    }
    errors.into_result()
}
