//! Class rosters and roll-number allocation.

use crate::domain::{ClassName, Student};
use std::collections::BTreeMap;

/// Active students grouped by class, each class sorted by roll number.
/// Classes without students are absent from the map.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    by_class: BTreeMap<ClassName, Vec<String>>,
}

impl Roster {
    pub fn from_students<'a>(students: impl IntoIterator<Item = &'a Student>) -> Self {
        let mut by_class: BTreeMap<ClassName, Vec<String>> = BTreeMap::new();
        for s in students.into_iter().filter(|s| s.is_active) {
            by_class
                .entry(s.class)
                .or_default()
                .push(s.roll_number.clone());
        }
        for rolls in by_class.values_mut() {
            rolls.sort();
            rolls.dedup();
        }
        Self { by_class }
    }

    pub fn class(&self, class: ClassName) -> &[String] {
        self.by_class.get(&class).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn classes(&self) -> impl Iterator<Item = (ClassName, &[String])> {
        self.by_class.iter().map(|(c, rolls)| (*c, rolls.as_slice()))
    }

    pub fn size(&self, class: ClassName) -> u32 {
        self.class(class).len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.by_class.is_empty()
    }
}

/// Splits a roll number such as `LKG-004` into its prefix and sequence number.
/// Returns `None` for anything not shaped `PREFIX-digits`.
pub fn split_roll_number(roll: &str) -> Option<(&str, u32)> {
    let (prefix, digits) = roll.split_once('-')?;
    if prefix.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((prefix, digits.parse().ok()?))
}

/// Roll number `sequence` of a class, zero-padded to three digits.
pub fn format_roll_number(class: ClassName, sequence: u32) -> String {
    format!("{}-{:03}", class.roll_prefix(), sequence)
}

/// Highest sequence number seen for `prefix` among `rolls`, or 0.
pub fn highest_sequence<'a>(prefix: &str, rolls: impl IntoIterator<Item = &'a str>) -> u32 {
    rolls
        .into_iter()
        .filter_map(split_roll_number)
        .filter(|(p, _)| *p == prefix)
        .map(|(_, n)| n)
        .max()
        .unwrap_or(0)
}
