//! Attendance aggregation.
//!
//! Joins class rosters against the attendance record stored for each
//! (class, date). A roster student without an entry in that record resolves
//! to [`AttendanceStatus::Missed`]; a class with students but no record at all
//! counts every student as missed. Entries for roll numbers that are no longer
//! on the roster are ignored, so for every class and day
//! `present + absent + late + missed == total == roster size`.

use crate::dates::{self, DateError};
use crate::domain::{AttendanceRecord, AttendanceStatus, ClassName, MarkedStatus};
use crate::ports::{DatabaseService, PortError, StudentFilter};
use crate::roster::Roster;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, thiserror::Error)]
pub enum AttendanceError {
    #[error(transparent)]
    Date(#[from] DateError),
    #[error(transparent)]
    Port(#[from] PortError),
}

//=========================================================================================
// Per-student resolution
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedEntry {
    pub roll_number: String,
    pub status: AttendanceStatus,
    pub remarks: Option<String>,
}

/// Resolves every roster student against an optional record.
/// Duplicate entries for one roll number keep the last one.
pub fn resolve_statuses(roster: &[String], record: Option<&AttendanceRecord>) -> Vec<ResolvedEntry> {
    let marked: HashMap<&str, (MarkedStatus, Option<&String>)> = record
        .map(|r| {
            r.entries
                .iter()
                .map(|e| (e.roll_number.as_str(), (e.status, e.remarks.as_ref())))
                .collect()
        })
        .unwrap_or_default();

    roster
        .iter()
        .map(|roll| match marked.get(roll.as_str()) {
            Some((status, remarks)) => ResolvedEntry {
                roll_number: roll.clone(),
                status: (*status).into(),
                remarks: (*remarks).cloned(),
            },
            None => ResolvedEntry {
                roll_number: roll.clone(),
                status: AttendanceStatus::Missed,
                remarks: None,
            },
        })
        .collect()
}

//=========================================================================================
// Counters
//=========================================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClassDayStats {
    pub total: u32,
    pub present: u32,
    pub absent: u32,
    pub late: u32,
    pub missed: u32,
}

impl ClassDayStats {
    /// Stats for a day on which the class has no record.
    pub fn unrecorded(total: u32) -> Self {
        Self {
            total,
            missed: total,
            ..Self::default()
        }
    }

    pub fn tally(&mut self, status: AttendanceStatus) {
        self.total += 1;
        match status {
            AttendanceStatus::Present => self.present += 1,
            AttendanceStatus::Absent => self.absent += 1,
            AttendanceStatus::Late => self.late += 1,
            AttendanceStatus::Missed => self.missed += 1,
        }
    }

    /// `round((present + late) / total * 100)`, 0 for an empty class.
    pub fn percentage(&self) -> u32 {
        attendance_percentage(self.present + self.late, self.total)
    }
}

pub fn attendance_percentage(attended: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (f64::from(attended) * 100.0 / f64::from(total)).round() as u32
}

pub fn class_day_stats(roster: &[String], record: Option<&AttendanceRecord>) -> ClassDayStats {
    let Some(record) = record else {
        return ClassDayStats::unrecorded(roster.len() as u32);
    };
    let mut stats = ClassDayStats::default();
    for entry in resolve_statuses(roster, Some(record)) {
        stats.tally(entry.status);
    }
    stats
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClassSummary {
    pub total: u32,
    pub present: u32,
    pub absent: u32,
    pub late: u32,
    pub missed: u32,
    pub days_with_attendance: u32,
}

impl ClassSummary {
    fn add(&mut self, day: &ClassDayStats, recorded: bool) {
        self.total += day.total;
        self.present += day.present;
        self.absent += day.absent;
        self.late += day.late;
        self.missed += day.missed;
        if recorded {
            self.days_with_attendance += 1;
        }
    }

    pub fn percentage(&self) -> u32 {
        attendance_percentage(self.present + self.late, self.total)
    }
}

//=========================================================================================
// Aggregates
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayReport {
    pub date: NaiveDate,
    pub classes: BTreeMap<ClassName, ClassDayStats>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RangeReport {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days: Vec<DayReport>,
    pub summary: BTreeMap<ClassName, ClassSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthReport {
    pub year: i32,
    pub month: u32,
    pub working_days: u32,
    #[serde(flatten)]
    pub range: RangeReport,
}

type RecordIndex<'a> = HashMap<(ClassName, NaiveDate), &'a AttendanceRecord>;

fn index_records(records: &[AttendanceRecord]) -> RecordIndex<'_> {
    records.iter().map(|r| ((r.class, r.date), r)).collect()
}

fn day_report(roster: &Roster, index: &RecordIndex<'_>, date: NaiveDate) -> DayReport {
    let classes = roster
        .classes()
        .map(|(class, rolls)| (class, class_day_stats(rolls, index.get(&(class, date)).copied())))
        .collect();
    DayReport { date, classes }
}

/// Per-class stats for one date. Records for other dates are ignored.
pub fn daily_stats(roster: &Roster, records: &[AttendanceRecord], date: NaiveDate) -> DayReport {
    day_report(roster, &index_records(records), date)
}

/// Per-day stats for every day in `[start, end]` plus per-class running totals.
pub fn range_stats(
    roster: &Roster,
    records: &[AttendanceRecord],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<RangeReport, DateError> {
    dates::checked_range(start, end)?;
    let index = index_records(records);

    let mut summary: BTreeMap<ClassName, ClassSummary> = roster
        .classes()
        .map(|(class, _)| (class, ClassSummary::default()))
        .collect();
    let mut days = Vec::new();

    for date in dates::days_inclusive(start, end) {
        let report = day_report(roster, &index, date);
        for (class, stats) in &report.classes {
            let recorded = index.contains_key(&(*class, date));
            summary.entry(*class).or_default().add(stats, recorded);
        }
        days.push(report);
    }

    Ok(RangeReport {
        start,
        end,
        days,
        summary,
    })
}

pub fn month_stats(
    roster: &Roster,
    records: &[AttendanceRecord],
    year: i32,
    month: u32,
) -> Result<MonthReport, DateError> {
    let (first, last) = dates::month_bounds(year, month)?;
    Ok(MonthReport {
        year,
        month,
        working_days: dates::working_days(first, last),
        range: range_stats(roster, records, first, last)?,
    })
}

/// A single student's attendance over a range, counted only on days with a
/// record for them: one that marks them, in whatever class they were in then,
/// or else one for their current class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StudentSummary {
    pub recorded_days: u32,
    pub present: u32,
    pub absent: u32,
    pub late: u32,
    pub missed: u32,
    pub percentage: u32,
}

pub fn student_summary(
    roll_number: &str,
    class: ClassName,
    records: &[AttendanceRecord],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<StudentSummary, DateError> {
    dates::checked_range(start, end)?;
    // Per day, prefer a record that marks the student, then one for the current class.
    let mut days: BTreeMap<NaiveDate, (bool, bool, &AttendanceRecord)> = BTreeMap::new();
    for record in records.iter().filter(|r| r.date >= start && r.date <= end) {
        let marked = record.entries.iter().any(|e| e.roll_number == roll_number);
        let current = record.class == class;
        if !marked && !current {
            continue;
        }
        let rank = (marked, current);
        let outranked = days
            .get(&record.date)
            .map_or(false, |(m, c, _)| (*m, *c) >= rank);
        if !outranked {
            days.insert(record.date, (marked, current, record));
        }
    }

    let single = [roll_number.to_string()];
    let mut s = StudentSummary::default();
    for (_, _, record) in days.into_values() {
        let stats = class_day_stats(&single, Some(record));
        s.recorded_days += 1;
        s.present += stats.present;
        s.absent += stats.absent;
        s.late += stats.late;
        s.missed += stats.missed;
    }
    s.percentage = attendance_percentage(s.present + s.late, s.recorded_days);
    Ok(s)
}

//=========================================================================================
// Store-backed entry points
//=========================================================================================

async fn load(
    db: &dyn DatabaseService,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<(Roster, Vec<AttendanceRecord>), PortError> {
    let (students, records) = futures::try_join!(
        db.list_students(StudentFilter::active()),
        db.list_attendance_between(start, end),
    )?;
    Ok((Roster::from_students(&students), records))
}

pub async fn load_daily(db: &dyn DatabaseService, date: NaiveDate) -> Result<DayReport, AttendanceError> {
    let (roster, records) = load(db, date, date).await?;
    Ok(daily_stats(&roster, &records, date))
}

pub async fn load_range(
    db: &dyn DatabaseService,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<RangeReport, AttendanceError> {
    dates::checked_range(start, end)?;
    let (roster, records) = load(db, start, end).await?;
    Ok(range_stats(&roster, &records, start, end)?)
}

pub async fn load_month(
    db: &dyn DatabaseService,
    year: i32,
    month: u32,
) -> Result<MonthReport, AttendanceError> {
    let (first, last) = dates::month_bounds(year, month)?;
    let (roster, records) = load(db, first, last).await?;
    Ok(month_stats(&roster, &records, year, month)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AttendanceEntry;
    use crate::roster::fixtures::class_of;
    use chrono::Utc;
    use uuid::Uuid;

    fn date(s: &str) -> NaiveDate {
        dates::parse_date(s).unwrap()
    }

    fn record(class: ClassName, on: &str, marks: &[(&str, MarkedStatus)]) -> AttendanceRecord {
        AttendanceRecord {
            class,
            date: date(on),
            entries: marks
                .iter()
                .map(|(roll, status)| AttendanceEntry {
                    roll_number: roll.to_string(),
                    status: *status,
                    remarks: None,
                })
                .collect(),
            marked_by: Uuid::new_v4(),
            version: 1,
            updated_at: Utc::now(),
        }
    }

    fn assert_balanced(stats: &ClassDayStats) {
        assert_eq!(
            stats.present + stats.absent + stats.late + stats.missed,
            stats.total,
            "{stats:?}"
        );
    }

    #[test]
    fn class_without_a_record_is_entirely_missed() {
        let roster = Roster::from_students(&class_of(ClassName::Lkg, 10));
        let report = daily_stats(&roster, &[], date("2024-01-10"));
        assert_eq!(
            report.classes[&ClassName::Lkg],
            ClassDayStats {
                total: 10,
                present: 0,
                absent: 0,
                late: 0,
                missed: 10
            }
        );
    }

    #[test]
    fn students_without_an_entry_are_missed() {
        let roster = Roster::from_students(&class_of(ClassName::Nursery, 5));
        let rec = record(
            ClassName::Nursery,
            "2024-01-10",
            &[
                ("NUR-001", MarkedStatus::Present),
                ("NUR-002", MarkedStatus::Present),
                ("NUR-003", MarkedStatus::Present),
                ("NUR-004", MarkedStatus::Absent),
            ],
        );
        let stats = daily_stats(&roster, &[rec], date("2024-01-10")).classes[&ClassName::Nursery];
        assert_eq!(
            stats,
            ClassDayStats {
                total: 5,
                present: 3,
                absent: 1,
                late: 0,
                missed: 1
            }
        );
        assert_eq!(stats.percentage(), 60);
    }

    #[test]
    fn stale_and_duplicate_entries_never_push_missed_below_zero() {
        let roster = Roster::from_students(&class_of(ClassName::Ukg, 2));
        let rec = record(
            ClassName::Ukg,
            "2024-01-10",
            &[
                ("UKG-001", MarkedStatus::Absent),
                ("UKG-001", MarkedStatus::Late),
                ("UKG-002", MarkedStatus::Present),
                ("UKG-099", MarkedStatus::Present),
            ],
        );
        let stats = class_day_stats(roster.class(ClassName::Ukg), Some(&rec));
        assert_balanced(&stats);
        assert_eq!((stats.present, stats.late, stats.absent, stats.missed), (1, 1, 0, 0));
    }

    #[test]
    fn resolution_exposes_missed_explicitly() {
        let roster = Roster::from_students(&class_of(ClassName::Play, 2));
        let rec = record(ClassName::Play, "2024-01-10", &[("PG-002", MarkedStatus::Late)]);
        let resolved = resolve_statuses(roster.class(ClassName::Play), Some(&rec));
        assert_eq!(resolved[0].status, AttendanceStatus::Missed);
        assert_eq!(resolved[1].status, AttendanceStatus::Late);
    }

    #[test]
    fn empty_classes_are_omitted_and_empty_totals_are_zero_percent() {
        let roster = Roster::from_students(&class_of(ClassName::Lkg, 1));
        let report = daily_stats(&roster, &[], date("2024-01-10"));
        assert!(!report.classes.contains_key(&ClassName::First));
        assert_eq!(ClassDayStats::default().percentage(), 0);
    }

    #[test]
    fn range_summary_totals_equal_the_sum_of_days() {
        let mut students = class_of(ClassName::Lkg, 4);
        students.extend(class_of(ClassName::Ukg, 3));
        let roster = Roster::from_students(&students);
        let records = vec![
            record(ClassName::Lkg, "2024-01-08", &[("LKG-001", MarkedStatus::Present)]),
            record(
                ClassName::Lkg,
                "2024-01-09",
                &[("LKG-001", MarkedStatus::Late), ("LKG-002", MarkedStatus::Absent)],
            ),
            record(ClassName::Ukg, "2024-01-09", &[("UKG-003", MarkedStatus::Present)]),
            // outside the range
            record(ClassName::Ukg, "2024-01-20", &[("UKG-001", MarkedStatus::Present)]),
        ];

        let report = range_stats(&roster, &records, date("2024-01-08"), date("2024-01-10")).unwrap();
        assert_eq!(report.days.len(), 3);

        for class in [ClassName::Lkg, ClassName::Ukg] {
            let summed: u32 = report.days.iter().map(|d| d.classes[&class].total).sum();
            let summary = report.summary[&class];
            assert_eq!(summary.total, summed);
            assert!(summary.days_with_attendance <= 3);
            for day in &report.days {
                assert_balanced(&day.classes[&class]);
            }
        }

        let lkg = report.summary[&ClassName::Lkg];
        assert_eq!(lkg.days_with_attendance, 2);
        assert_eq!((lkg.total, lkg.present, lkg.late, lkg.absent, lkg.missed), (12, 1, 1, 1, 9));
        assert_eq!(report.summary[&ClassName::Ukg].days_with_attendance, 1);
    }

    #[test]
    fn inverted_range_is_rejected() {
        let roster = Roster::default();
        assert!(range_stats(&roster, &[], date("2024-01-10"), date("2024-01-09")).is_err());
    }

    #[test]
    fn month_mode_counts_working_days() {
        let roster = Roster::from_students(&class_of(ClassName::First, 2));
        let report = month_stats(&roster, &[], 2024, 2).unwrap();
        assert_eq!(report.range.days.len(), 29);
        assert_eq!(report.working_days, 21);
        assert_eq!(report.range.summary[&ClassName::First].missed, 58);
    }

    #[test]
    fn student_summary_counts_only_recorded_days() {
        let records = vec![
            record(ClassName::Lkg, "2024-01-08", &[("LKG-001", MarkedStatus::Present)]),
            record(ClassName::Lkg, "2024-01-09", &[("LKG-002", MarkedStatus::Present)]),
            record(ClassName::Lkg, "2024-01-10", &[("LKG-001", MarkedStatus::Late)]),
            record(ClassName::Ukg, "2024-01-10", &[("LKG-001", MarkedStatus::Absent)]),
        ];
        let s = student_summary("LKG-001", ClassName::Lkg, &records, date("2024-01-01"), date("2024-01-31"))
            .unwrap();
        assert_eq!((s.recorded_days, s.present, s.late, s.missed, s.absent), (3, 1, 1, 1, 0));
        assert_eq!(s.percentage, 67);
    }

    #[test]
    fn student_summary_keeps_history_from_a_previous_class() {
        // LKG-002 moved from lkg to ukg on the 10th and kept their roll number.
        let records = vec![
            record(ClassName::Lkg, "2024-01-08", &[("LKG-002", MarkedStatus::Present)]),
            record(ClassName::Lkg, "2024-01-09", &[("LKG-002", MarkedStatus::Absent)]),
            record(ClassName::Lkg, "2024-01-10", &[("LKG-001", MarkedStatus::Present)]),
            record(ClassName::Ukg, "2024-01-10", &[("LKG-002", MarkedStatus::Present)]),
            record(ClassName::Ukg, "2024-01-11", &[("UKG-001", MarkedStatus::Present)]),
        ];
        let s = student_summary("LKG-002", ClassName::Ukg, &records, date("2024-01-01"), date("2024-01-31"))
            .unwrap();
        assert_eq!((s.recorded_days, s.present, s.absent, s.missed), (4, 2, 1, 1));
        assert_eq!(s.percentage, 50);
    }
}
