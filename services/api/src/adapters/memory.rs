//! services/api/src/adapters/memory.rs
//!
//! A process-local implementation of the `DatabaseService` port. Used by the
//! integration tests and for running the service without PostgreSQL
//! (`STORE_BACKEND=memory`). Semantics, including the optimistic attendance
//! writes, match the PostgreSQL adapter.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use preschool_core::domain::{
    AcademicReport, AttendanceRecord, ClassName, Event, FinancialRecord, NewUser, Remark, Role,
    Student, User, UserCredentials, UserPreferences,
};
use preschool_core::ports::{DatabaseService, PortError, PortResult, StudentFilter};
use preschool_core::roster::{format_roll_number, split_roll_number};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::Mutex;
use uuid::Uuid;

struct StoredUser {
    user: User,
    hashed_password: String,
}

#[derive(Default)]
struct MemoryState {
    users: HashMap<Uuid, StoredUser>,
    auth_sessions: HashMap<String, (Uuid, DateTime<Utc>)>,
    preferences: HashMap<Uuid, UserPreferences>,
    students: BTreeMap<String, Student>,
    attendance: BTreeMap<(ClassName, NaiveDate), AttendanceRecord>,
    reports: HashMap<Uuid, AcademicReport>,
    remarks: HashMap<Uuid, Remark>,
    events: HashMap<Uuid, Event>,
    finance: HashMap<Uuid, FinancialRecord>,
    /// Last roll sequence handed out or stored, per prefix.
    roll_sequences: HashMap<String, u32>,
}

#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<MemoryState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(what: &str, key: impl std::fmt::Display) -> PortError {
    PortError::NotFound(format!("{} {} not found", what, key))
}

#[async_trait]
impl DatabaseService for InMemoryStore {
    // --- Users & Auth ---
    async fn create_user(&self, user: NewUser) -> PortResult<User> {
        let mut state = self.state.lock().await;
        let email = user.email.trim().to_lowercase();
        if state.users.values().any(|u| u.user.email == email) {
            return Err(PortError::Conflict(format!("Email {} is already registered", email)));
        }
        let stored = User {
            user_id: Uuid::new_v4(),
            email,
            display_name: user.display_name,
            role: user.role,
            roll_number: user.roll_number,
        };
        state.users.insert(
            stored.user_id,
            StoredUser {
                user: stored.clone(),
                hashed_password: user.hashed_password,
            },
        );
        Ok(stored)
    }

    async fn get_user(&self, user_id: Uuid) -> PortResult<User> {
        let state = self.state.lock().await;
        state
            .users
            .get(&user_id)
            .map(|u| u.user.clone())
            .ok_or_else(|| not_found("User", user_id))
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let email = email.trim().to_lowercase();
        let state = self.state.lock().await;
        state
            .users
            .values()
            .find(|u| u.user.email == email)
            .map(|u| UserCredentials {
                user_id: u.user.user_id,
                email: u.user.email.clone(),
                hashed_password: u.hashed_password.clone(),
            })
            .ok_or_else(|| not_found("User", &email))
    }

    async fn list_users(&self, role: Option<Role>) -> PortResult<Vec<User>> {
        let state = self.state.lock().await;
        let mut users: Vec<User> = state
            .users
            .values()
            .filter(|u| role.map_or(true, |r| u.user.role == r))
            .map(|u| u.user.clone())
            .collect();
        users.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(users)
    }

    async fn count_users(&self) -> PortResult<u64> {
        Ok(self.state.lock().await.users.len() as u64)
    }

    async fn delete_user(&self, user_id: Uuid) -> PortResult<()> {
        let mut state = self.state.lock().await;
        state
            .users
            .remove(&user_id)
            .ok_or_else(|| not_found("User", user_id))?;
        state.auth_sessions.retain(|_, (owner, _)| *owner != user_id);
        state.preferences.remove(&user_id);
        Ok(())
    }

    async fn delete_users_for_roll_number(&self, roll_number: &str) -> PortResult<u64> {
        let mut state = self.state.lock().await;
        let doomed: Vec<Uuid> = state
            .users
            .values()
            .filter(|u| u.user.roll_number.as_deref() == Some(roll_number))
            .map(|u| u.user.user_id)
            .collect();
        for id in &doomed {
            state.users.remove(id);
            state.preferences.remove(id);
        }
        state.auth_sessions.retain(|_, (owner, _)| !doomed.contains(owner));
        Ok(doomed.len() as u64)
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        let mut state = self.state.lock().await;
        state
            .auth_sessions
            .insert(session_id.to_string(), (user_id, expires_at));
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let state = self.state.lock().await;
        match state.auth_sessions.get(session_id) {
            Some((user_id, expires_at)) if *expires_at > Utc::now() => Ok(*user_id),
            _ => Err(PortError::Unauthorized),
        }
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.state.lock().await.auth_sessions.remove(session_id);
        Ok(())
    }

    async fn get_preferences(&self, user_id: Uuid) -> PortResult<UserPreferences> {
        let state = self.state.lock().await;
        Ok(state
            .preferences
            .get(&user_id)
            .cloned()
            .unwrap_or_else(|| UserPreferences::new(user_id)))
    }

    async fn save_preferences(&self, prefs: &UserPreferences) -> PortResult<()> {
        let mut state = self.state.lock().await;
        state.preferences.insert(prefs.user_id, prefs.clone());
        Ok(())
    }

    // --- Students ---
    async fn create_student(&self, student: Student) -> PortResult<Student> {
        let mut state = self.state.lock().await;
        if state.students.contains_key(&student.roll_number) {
            return Err(PortError::Conflict(format!(
                "Roll number {} is already taken",
                student.roll_number
            )));
        }
        if let Some((prefix, sequence)) = split_roll_number(&student.roll_number) {
            let last = state.roll_sequences.entry(prefix.to_string()).or_insert(0);
            *last = (*last).max(sequence);
        }
        state
            .students
            .insert(student.roll_number.clone(), student.clone());
        Ok(student)
    }

    async fn allocate_roll_number(&self, class: ClassName) -> PortResult<String> {
        let mut state = self.state.lock().await;
        let last = state
            .roll_sequences
            .entry(class.roll_prefix().to_string())
            .or_insert(0);
        *last += 1;
        Ok(format_roll_number(class, *last))
    }

    async fn get_student_by_roll(&self, roll_number: &str) -> PortResult<Student> {
        let state = self.state.lock().await;
        state
            .students
            .get(roll_number)
            .cloned()
            .ok_or_else(|| not_found("Student", roll_number))
    }

    async fn list_students(&self, filter: StudentFilter) -> PortResult<Vec<Student>> {
        let state = self.state.lock().await;
        Ok(state
            .students
            .values()
            .filter(|s| filter.class.map_or(true, |c| s.class == c))
            .filter(|s| !filter.active_only || s.is_active)
            .cloned()
            .collect())
    }

    async fn update_student(&self, student: &Student) -> PortResult<()> {
        let mut state = self.state.lock().await;
        let slot = state
            .students
            .get_mut(&student.roll_number)
            .ok_or_else(|| not_found("Student", &student.roll_number))?;
        *slot = student.clone();
        Ok(())
    }

    async fn delete_student(&self, roll_number: &str) -> PortResult<()> {
        let mut state = self.state.lock().await;
        state
            .students
            .remove(roll_number)
            .map(|_| ())
            .ok_or_else(|| not_found("Student", roll_number))
    }

    // --- Attendance ---
    async fn get_attendance(
        &self,
        class: ClassName,
        date: NaiveDate,
    ) -> PortResult<Option<AttendanceRecord>> {
        Ok(self.state.lock().await.attendance.get(&(class, date)).cloned())
    }

    async fn list_attendance_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> PortResult<Vec<AttendanceRecord>> {
        let state = self.state.lock().await;
        Ok(state
            .attendance
            .values()
            .filter(|r| r.date >= start && r.date <= end)
            .cloned()
            .collect())
    }

    async fn save_attendance(
        &self,
        mut record: AttendanceRecord,
        expected_version: Option<i64>,
    ) -> PortResult<AttendanceRecord> {
        let mut state = self.state.lock().await;
        let key = (record.class, record.date);
        let current = state.attendance.get(&key).map(|r| r.version);
        if current != expected_version {
            return Err(PortError::Conflict(format!(
                "Attendance for {} on {} changed since it was loaded",
                record.class, record.date
            )));
        }
        record.version = current.unwrap_or(0) + 1;
        record.updated_at = Utc::now();
        state.attendance.insert(key, record.clone());
        Ok(record)
    }

    // --- Academic Reports ---
    async fn create_report(&self, report: AcademicReport) -> PortResult<AcademicReport> {
        let mut state = self.state.lock().await;
        if state.reports.values().any(|r| {
            r.roll_number == report.roll_number
                && r.term == report.term
                && r.academic_year == report.academic_year
        }) {
            return Err(PortError::Conflict(format!(
                "{} already has a {} report for {}",
                report.roll_number,
                report.term.as_str(),
                report.academic_year
            )));
        }
        state.reports.insert(report.id, report.clone());
        Ok(report)
    }

    async fn get_report(&self, report_id: Uuid) -> PortResult<AcademicReport> {
        let state = self.state.lock().await;
        state
            .reports
            .get(&report_id)
            .cloned()
            .ok_or_else(|| not_found("Report", report_id))
    }

    async fn list_reports_for_student(&self, roll_number: &str) -> PortResult<Vec<AcademicReport>> {
        let state = self.state.lock().await;
        let mut reports: Vec<AcademicReport> = state
            .reports
            .values()
            .filter(|r| r.roll_number == roll_number)
            .cloned()
            .collect();
        reports.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(reports)
    }

    async fn update_report(&self, report: &AcademicReport) -> PortResult<()> {
        let mut state = self.state.lock().await;
        let slot = state
            .reports
            .get_mut(&report.id)
            .ok_or_else(|| not_found("Report", report.id))?;
        *slot = report.clone();
        Ok(())
    }

    async fn delete_report(&self, report_id: Uuid) -> PortResult<()> {
        let mut state = self.state.lock().await;
        state
            .reports
            .remove(&report_id)
            .map(|_| ())
            .ok_or_else(|| not_found("Report", report_id))
    }

    // --- Remarks ---
    async fn create_remark(&self, remark: Remark) -> PortResult<Remark> {
        let mut state = self.state.lock().await;
        state.remarks.insert(remark.id, remark.clone());
        Ok(remark)
    }

    async fn list_remarks_for_student(&self, roll_number: &str) -> PortResult<Vec<Remark>> {
        let state = self.state.lock().await;
        let mut remarks: Vec<Remark> = state
            .remarks
            .values()
            .filter(|r| r.roll_number == roll_number)
            .cloned()
            .collect();
        remarks.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(remarks)
    }

    async fn delete_remark(&self, remark_id: Uuid) -> PortResult<()> {
        let mut state = self.state.lock().await;
        state
            .remarks
            .remove(&remark_id)
            .map(|_| ())
            .ok_or_else(|| not_found("Remark", remark_id))
    }

    // --- Events ---
    async fn create_event(&self, event: Event) -> PortResult<Event> {
        let mut state = self.state.lock().await;
        state.events.insert(event.id, event.clone());
        Ok(event)
    }

    async fn get_event(&self, event_id: Uuid) -> PortResult<Event> {
        let state = self.state.lock().await;
        state
            .events
            .get(&event_id)
            .cloned()
            .ok_or_else(|| not_found("Event", event_id))
    }

    async fn list_events(&self, from: Option<NaiveDate>) -> PortResult<Vec<Event>> {
        let state = self.state.lock().await;
        let mut events: Vec<Event> = state
            .events
            .values()
            .filter(|e| from.map_or(true, |f| e.end_date.unwrap_or(e.start_date) >= f))
            .cloned()
            .collect();
        events.sort_by(|a, b| a.start_date.cmp(&b.start_date));
        Ok(events)
    }

    async fn update_event(&self, event: &Event) -> PortResult<()> {
        let mut state = self.state.lock().await;
        let slot = state
            .events
            .get_mut(&event.id)
            .ok_or_else(|| not_found("Event", event.id))?;
        *slot = event.clone();
        Ok(())
    }

    async fn delete_event(&self, event_id: Uuid) -> PortResult<()> {
        let mut state = self.state.lock().await;
        state
            .events
            .remove(&event_id)
            .map(|_| ())
            .ok_or_else(|| not_found("Event", event_id))
    }

    // --- Finance ---
    async fn create_financial_record(&self, record: FinancialRecord) -> PortResult<FinancialRecord> {
        let mut state = self.state.lock().await;
        state.finance.insert(record.id, record.clone());
        Ok(record)
    }

    async fn list_financial_records(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> PortResult<Vec<FinancialRecord>> {
        let state = self.state.lock().await;
        let mut records: Vec<FinancialRecord> = state
            .finance
            .values()
            .filter(|r| r.date >= start && r.date <= end)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(records)
    }

    async fn delete_financial_record(&self, record_id: Uuid) -> PortResult<()> {
        let mut state = self.state.lock().await;
        state
            .finance
            .remove(&record_id)
            .map(|_| ())
            .ok_or_else(|| not_found("Financial record", record_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use preschool_core::domain::{AttendanceEntry, MarkedStatus, ParentInfo, Term, UserSnapshot};

    fn record(version: i64) -> AttendanceRecord {
        AttendanceRecord {
            class: ClassName::Lkg,
            date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            entries: vec![AttendanceEntry {
                roll_number: "LKG-001".to_string(),
                status: MarkedStatus::Present,
                remarks: None,
            }],
            marked_by: Uuid::new_v4(),
            version,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn stale_attendance_writes_are_rejected() {
        let store = InMemoryStore::new();
        let first = store.save_attendance(record(0), None).await.unwrap();
        assert_eq!(first.version, 1);

        // A second writer that also believed no record existed loses.
        assert!(matches!(
            store.save_attendance(record(0), None).await,
            Err(PortError::Conflict(_))
        ));

        let second = store.save_attendance(record(1), Some(1)).await.unwrap();
        assert_eq!(second.version, 2);
        assert!(matches!(
            store.save_attendance(record(1), Some(1)).await,
            Err(PortError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn emails_are_unique_case_insensitively() {
        let store = InMemoryStore::new();
        let new_user = |email: &str| NewUser {
            email: email.to_string(),
            hashed_password: "x".to_string(),
            display_name: "T".to_string(),
            role: Role::Teacher,
            roll_number: None,
        };
        store.create_user(new_user("t@school.test")).await.unwrap();
        assert!(matches!(
            store.create_user(new_user("T@School.test")).await,
            Err(PortError::Conflict(_))
        ));
        assert_eq!(store.count_users().await.unwrap(), 1);
    }

    fn student(roll: &str, class: ClassName) -> Student {
        Student {
            id: Uuid::new_v4(),
            roll_number: roll.to_string(),
            first_name: "Asha".to_string(),
            last_name: "Rao".to_string(),
            class,
            age: 4,
            parent: ParentInfo {
                father_name: "Ravi".to_string(),
                mother_name: "Mira".to_string(),
                phone: "+919800000000".to_string(),
                email: None,
                address: None,
            },
            admission_date: NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
            is_active: true,
        }
    }

    #[tokio::test]
    async fn roll_numbers_are_never_reissued() {
        let store = InMemoryStore::new();
        let first = store.allocate_roll_number(ClassName::Lkg).await.unwrap();
        assert_eq!(first, "LKG-001");
        store.create_student(student(&first, ClassName::Lkg)).await.unwrap();
        store.delete_student(&first).await.unwrap();
        assert_eq!(store.allocate_roll_number(ClassName::Lkg).await.unwrap(), "LKG-002");

        // An explicitly chosen number moves the sequence past it.
        store.create_student(student("LKG-010", ClassName::Lkg)).await.unwrap();
        assert_eq!(store.allocate_roll_number(ClassName::Lkg).await.unwrap(), "LKG-011");
        assert_eq!(store.allocate_roll_number(ClassName::Ukg).await.unwrap(), "UKG-001");
    }

    #[tokio::test]
    async fn second_report_for_the_same_term_conflicts() {
        let store = InMemoryStore::new();
        let report = |term: Term| AcademicReport {
            id: Uuid::new_v4(),
            roll_number: "LKG-001".to_string(),
            term,
            academic_year: "2024-25".to_string(),
            subjects: Vec::new(),
            created_by: UserSnapshot {
                user_id: Uuid::new_v4(),
                display_name: "T".to_string(),
                role: Role::Teacher,
            },
            updated_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        store.create_report(report(Term::Term1)).await.unwrap();
        assert!(matches!(
            store.create_report(report(Term::Term1)).await,
            Err(PortError::Conflict(_))
        ));
        store.create_report(report(Term::Term2)).await.unwrap();
        assert_eq!(store.list_reports_for_student("LKG-001").await.unwrap().len(), 2);
    }
}
