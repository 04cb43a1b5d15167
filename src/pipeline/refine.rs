//! Client-side refinement of an already loaded page.
//!
//! Used for predicates the backend query string cannot express. It only ever
//! sees the rows it is given; rows on other pages are never consulted, so a
//! filtered page can hold fewer rows than `itemsPerPage` even when more
//! matches exist server-side.

use std::cmp::Ordering;

use super::query::{SortOrder, SortSpec};

/// A value a row exposes for sorting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortValue<'a> {
    Missing,
    Number(f64),
    Text(&'a str),
}

impl<'a> From<Option<&'a str>> for SortValue<'a> {
    fn from(value: Option<&'a str>) -> Self {
        value.map(SortValue::Text).unwrap_or(SortValue::Missing)
    }
}

impl<'a> From<Option<SortValue<'a>>> for SortValue<'a> {
    fn from(value: Option<SortValue<'a>>) -> Self {
        value.unwrap_or(SortValue::Missing)
    }
}

impl SortValue<'_> {
    fn rank(&self) -> u8 {
        match self {
            SortValue::Missing => 0,
            SortValue::Number(_) => 1,
            SortValue::Text(_) => 2,
        }
    }

    /// Missing sorts first, numbers numerically, text case-insensitively.
    pub fn compare(&self, other: &SortValue<'_>) -> Ordering {
        match (self, other) {
            (SortValue::Number(a), SortValue::Number(b)) => a.total_cmp(b),
            (SortValue::Text(a), SortValue::Text(b)) => cmp_ignore_case(a, b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    let lower_a = a.chars().flat_map(char::to_lowercase);
    let lower_b = b.chars().flat_map(char::to_lowercase);
    lower_a.cmp(lower_b)
}

fn contains_ignore_case(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

/// Rows that can be searched, matched and sorted locally.
pub trait Refinable {
    /// Fields consulted by free-text search.
    fn searchable(&self) -> Vec<&str>;

    /// Text of a named field, for field predicates.
    fn field(&self, name: &str) -> Option<&str>;

    fn sort_value(&self, key: &str) -> SortValue<'_>;
}

/// Case-insensitive substring match of `needle` against one named field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMatch {
    pub field: String,
    pub needle: String,
}

impl FieldMatch {
    pub fn new(field: impl Into<String>, needle: impl Into<String>) -> Self {
        Self { field: field.into(), needle: needle.into() }
    }
}

/// Everything the refiner applies, in order: search, field matches, sort.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Refinement {
    pub search: Option<String>,
    pub matches: Vec<FieldMatch>,
    pub sort: Option<SortSpec>,
}

impl Refinement {
    pub fn is_identity(&self) -> bool {
        self.search.as_deref().map_or(true, |s| s.trim().is_empty())
            && self.matches.is_empty()
            && self.sort.is_none()
    }
}

/// Filters and stably sorts `rows`, returning a new vector.
///
/// Equal keys keep their input order whichever direction is requested, so
/// sorting the same input ascending, then descending, then ascending again
/// reproduces the first result.
pub fn refine<T: Refinable + Clone>(rows: &[T], refinement: &Refinement) -> Vec<T> {
    let search = refinement
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);
    let matches: Vec<(&str, String)> = refinement
        .matches
        .iter()
        .filter(|m| !m.needle.trim().is_empty())
        .map(|m| (m.field.as_str(), m.needle.trim().to_lowercase()))
        .collect();

    let mut out: Vec<T> = rows
        .iter()
        .filter(|row| {
            search.as_deref().map_or(true, |needle| {
                row.searchable().iter().any(|f| contains_ignore_case(f, needle))
            })
        })
        .filter(|row| {
            matches.iter().all(|(field, needle)| {
                row.field(field).map_or(false, |value| contains_ignore_case(value, needle))
            })
        })
        .cloned()
        .collect();

    if let Some(spec) = &refinement.sort {
        // slice::sort_by is stable
        out.sort_by(|a, b| {
            let ordering = a.sort_value(&spec.key).compare(&b.sort_value(&spec.key));
            match spec.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });
    }
    out
}
