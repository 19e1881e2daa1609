//! Name ordering shared by every store and by the intersected keyword path.
//!
//! Follows the document store's `en` collation at secondary strength with
//! numeric ordering. Base letters decide first, with case and accents folded
//! away, so `Éclair` sorts between `Apex` and `Fusion`. Accents break ties
//! next and case is ignored. Runs of ASCII digits compare by numeric value,
//! so `b2` sorts before `b10`.

use std::cmp::Ordering;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

pub fn compare_names(left: &str, right: &str) -> Ordering {
    collation_units(left, Strength::Primary)
        .cmp(&collation_units(right, Strength::Primary))
        .then_with(|| {
            collation_units(left, Strength::Secondary)
                .cmp(&collation_units(right, Strength::Secondary))
        })
        .then_with(|| left.cmp(right))
}

pub fn sort_by_name<T>(items: &mut [T], name: impl Fn(&T) -> &str) {
    items.sort_by(|left, right| compare_names(name(left), name(right)));
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strength {
    /// Base letters only.
    Primary,
    /// Base letters plus accents.
    Secondary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Unit {
    Digits(String),
    Char(char),
}

impl Ord for Unit {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Unit::Digits(left), Unit::Digits(right)) => compare_digit_runs(left, right),
            (Unit::Char(left), Unit::Char(right)) => left.cmp(right),
            // Spaces and punctuation come before digits, digits before letters.
            (Unit::Digits(_), Unit::Char(ch)) => {
                if ch.is_alphanumeric() {
                    Ordering::Less
                } else {
                    Ordering::Greater
                }
            }
            (Unit::Char(_), Unit::Digits(_)) => other.cmp(self).reverse(),
        }
    }
}

impl PartialOrd for Unit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn collation_units(name: &str, strength: Strength) -> Vec<Unit> {
    let mut units = Vec::with_capacity(name.len());
    let mut digits = String::new();

    for ch in name.nfd() {
        if strength == Strength::Primary && is_combining_mark(ch) {
            continue;
        }
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }
        if !digits.is_empty() {
            units.push(digit_run(&digits));
            digits.clear();
        }
        units.extend(ch.to_lowercase().map(Unit::Char));
    }
    if !digits.is_empty() {
        units.push(digit_run(&digits));
    }

    units
}

fn digit_run(digits: &str) -> Unit {
    Unit::Digits(digits.trim_start_matches('0').to_string())
}

/// Runs arrive without leading zeros, so length decides magnitude.
fn compare_digit_runs(left: &str, right: &str) -> Ordering {
    left.len().cmp(&right.len()).then_with(|| left.cmp(right))
}
