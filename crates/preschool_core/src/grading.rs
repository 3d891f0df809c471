//! Grade bands and report rollups.
//!
//! Percentages are computed as `marks * 100 / max_marks` so the band cut-offs
//! (which are inclusive) are hit exactly for whole-number inputs.

use crate::domain::{AcademicReport, SubjectMarks};
use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Grade {
    APlus,
    A,
    BPlus,
    B,
    CPlus,
    C,
    D,
}

const BANDS: [(f64, Grade); 6] = [
    (90.0, Grade::APlus),
    (80.0, Grade::A),
    (70.0, Grade::BPlus),
    (60.0, Grade::B),
    (50.0, Grade::CPlus),
    (40.0, Grade::C),
];

impl Grade {
    pub fn from_percentage(percentage: f64) -> Grade {
        BANDS
            .iter()
            .find(|(cutoff, _)| percentage >= *cutoff)
            .map(|(_, grade)| *grade)
            .unwrap_or(Grade::D)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::D => "D",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Grade {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

pub const NOT_APPLICABLE: &str = "N/A";

pub fn percentage(marks: f64, max_marks: f64) -> f64 {
    if max_marks <= 0.0 {
        return 0.0;
    }
    marks * 100.0 / max_marks
}

/// The grade label shown for one subject; `N/A` subjects never get a band.
pub fn subject_grade_label(subject: &SubjectMarks) -> String {
    if subject.not_applicable {
        NOT_APPLICABLE.to_string()
    } else {
        Grade::from_percentage(percentage(subject.marks, subject.max_marks)).to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradedSubject {
    pub subject: String,
    pub marks: f64,
    pub max_marks: f64,
    pub not_applicable: bool,
    pub percentage: Option<f64>,
    pub grade: String,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub subjects: Vec<GradedSubject>,
    pub obtained: f64,
    pub maximum: f64,
    /// `None` when every subject is N/A.
    pub percentage: Option<f64>,
    pub grade: String,
}

pub fn summarize_subjects(subjects: &[SubjectMarks]) -> ReportSummary {
    let graded = subjects
        .iter()
        .map(|s| GradedSubject {
            subject: s.subject.clone(),
            marks: s.marks,
            max_marks: s.max_marks,
            not_applicable: s.not_applicable,
            percentage: (!s.not_applicable).then(|| percentage(s.marks, s.max_marks)),
            grade: subject_grade_label(s),
            remarks: s.remarks.clone(),
        })
        .collect();

    let (obtained, maximum) = subjects
        .iter()
        .filter(|s| !s.not_applicable)
        .fold((0.0, 0.0), |(o, m), s| (o + s.marks, m + s.max_marks));

    let overall = (maximum > 0.0).then(|| percentage(obtained, maximum));
    let grade = overall
        .map(|p| Grade::from_percentage(p).to_string())
        .unwrap_or_else(|| NOT_APPLICABLE.to_string());

    ReportSummary {
        subjects: graded,
        obtained,
        maximum,
        percentage: overall,
        grade,
    }
}

pub fn summarize_report(report: &AcademicReport) -> ReportSummary {
    summarize_subjects(&report.subjects)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject(name: &str, marks: f64, max_marks: f64, not_applicable: bool) -> SubjectMarks {
        SubjectMarks {
            subject: name.to_string(),
            marks,
            max_marks,
            remarks: None,
            not_applicable,
        }
    }

    #[test]
    fn band_cutoffs_are_inclusive() {
        assert_eq!(Grade::from_percentage(90.0), Grade::APlus);
        assert_eq!(Grade::from_percentage(89.999), Grade::A);
        assert_eq!(Grade::from_percentage(80.0), Grade::A);
        assert_eq!(Grade::from_percentage(70.0), Grade::BPlus);
        assert_eq!(Grade::from_percentage(60.0), Grade::B);
        assert_eq!(Grade::from_percentage(50.0), Grade::CPlus);
        assert_eq!(Grade::from_percentage(40.0), Grade::C);
        assert_eq!(Grade::from_percentage(39.99), Grade::D);
        assert_eq!(Grade::from_percentage(0.0), Grade::D);
    }

    #[test]
    fn marks_at_exactly_ninety_percent_earn_a_plus() {
        assert_eq!(Grade::from_percentage(percentage(45.0, 50.0)), Grade::APlus);
        assert_eq!(Grade::from_percentage(percentage(9.0, 10.0)), Grade::APlus);
        assert_eq!(Grade::from_percentage(percentage(89.999, 100.0)), Grade::A);
    }

    #[test]
    fn not_applicable_subjects_are_excluded_from_the_rollup() {
        let summary = summarize_subjects(&[
            subject("English", 45.0, 50.0, false),
            subject("Drawing", 0.0, 100.0, true),
        ]);
        assert_eq!(summary.percentage, Some(90.0));
        assert_eq!(summary.grade, "A+");
        assert_eq!(summary.maximum, 50.0);
        assert_eq!(summary.subjects[1].grade, "N/A");
        assert_eq!(summary.subjects[1].percentage, None);
    }

    #[test]
    fn all_subjects_not_applicable_has_no_overall_grade() {
        let summary = summarize_subjects(&[subject("Music", 0.0, 10.0, true)]);
        assert_eq!(summary.percentage, None);
        assert_eq!(summary.grade, NOT_APPLICABLE);
    }

    #[test]
    fn grade_serializes_as_its_label() {
        assert_eq!(serde_json::to_string(&Grade::BPlus).unwrap(), "\"B+\"");
    }
}
