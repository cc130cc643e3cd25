//! Struct field lookup.
//!
//! Built once when a struct's frame is compiled, then reused unchanged by
//! every decode call against that type — the whole point of doing this
//! lookup table construction at plan-compile time instead of per call.

use std::collections::HashMap;

use crate::plan::StructField;

/// Precomputed exact and case-insensitive name lookup for one struct frame.
pub struct FieldIndex {
    exact: HashMap<&'static str, usize>,
    /// Lowercased name to first-declared matching field index — built so
    /// that when several fields case-insensitively collide, the earliest
    /// declared one wins.
    lower: HashMap<String, usize>,
}

impl FieldIndex {
    pub fn build(fields: &[StructField]) -> Self {
        let mut exact = HashMap::with_capacity(fields.len());
        let mut lower: HashMap<String, usize> = HashMap::with_capacity(fields.len());
        for (i, field) in fields.iter().enumerate() {
            exact.insert(field.name, i);
            lower.entry(field.name.to_lowercase()).or_insert(i);
        }
        Self { exact, lower }
    }

    /// Resolves a member name to a field index: exact match first, then
    /// (unless the caller has disabled it) a case-insensitive fallback.
    pub fn lookup(&self, name: &str, allow_case_insensitive: bool) -> Option<usize> {
        if let Some(&i) = self.exact.get(name) {
            return Some(i);
        }
        if !allow_case_insensitive {
            return None;
        }
        self.lower.get(name.to_lowercase().as_str()).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(names: &[&'static str]) -> Vec<StructField> {
        names.iter().map(|&name| StructField { name, frame: 0 }).collect()
    }

    #[test]
    fn exact_match_wins_over_case_insensitive() {
        let idx = FieldIndex::build(&fields(&["Name", "name"]));
        assert_eq!(idx.lookup("name", true), Some(1));
        assert_eq!(idx.lookup("Name", true), Some(0));
    }

    #[test]
    fn case_insensitive_fallback_picks_first_declared() {
        let idx = FieldIndex::build(&fields(&["Name", "NAME"]));
        assert_eq!(idx.lookup("nAmE", true), Some(0));
    }

    #[test]
    fn case_insensitive_disabled_rejects_mismatch() {
        let idx = FieldIndex::build(&fields(&["Name"]));
        assert_eq!(idx.lookup("name", false), None);
    }

    #[test]
    fn unknown_name_is_not_found() {
        let idx = FieldIndex::build(&fields(&["Name"]));
        assert_eq!(idx.lookup("Other", true), None);
    }
}
