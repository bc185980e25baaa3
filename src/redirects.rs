//! Longest-prefix path rewriting keyed on the compiling module (spec.md
//! §4.8). Grounded on `examples/original_source/Yama/internal/Redirects.cpp`:
//! both maps are kept in ascending lexicographic key order so that, among
//! two entries where one key is a prefix of the other, the more specific
//! one always sorts after the less specific one — `compute` relies on that
//! ordering to let more-specific subjects shadow less-specific ones, and
//! `RedirectSet::resolve` relies on it to try the most specific `before`
//! first by iterating in reverse.

use std::collections::BTreeMap;

/// A projected, path-only view of [`Redirects`] for a specific compiling
/// module, computed by [`Redirects::compute`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectSet {
    // before -> after
    by_before: BTreeMap<String, String>,
}

impl RedirectSet {
    /// Rewrites `path` by its longest matching `before` prefix, or returns
    /// it unchanged if no redirect applies.
    pub fn resolve(&self, path: &str) -> String {
        for (before, after) in self.by_before.iter().rev() {
            if let Some(rest) = path.strip_prefix(before.as_str()) {
                return format!("{after}{rest}");
            }
        }
        path.to_string()
    }
}

/// The full set of redirect rules bound into a domain. Immutable for the
/// duration of a load session once a parcel is bound (spec.md §5).
#[derive(Debug, Clone, Default)]
pub struct Redirects {
    // (subject, before) -> after
    by_subject_before: BTreeMap<(String, String), String>,
}

impl Redirects {
    pub fn new() -> Self {
        Self::default()
    }

    /// `subject` must be a path, not a type fullname (spec.md §9 Open
    /// Questions: "implementations should reject non-path subjects").
    /// Callers are expected to have already normalized `subject`, `before`
    /// and `after` as paths via the [`crate::specifier`] solver; this
    /// method only asserts they carry no type-only syntax (`:`/`::`/`[`).
    pub fn add(&mut self, subject: impl Into<String>, before: impl Into<String>, after: impl Into<String>) {
        let (subject, before, after) = (subject.into(), before.into(), after.into());
        debug_assert!(is_plain_path(&subject), "redirect subject must be a path");
        debug_assert!(is_plain_path(&before), "redirect before must be a path");
        debug_assert!(is_plain_path(&after), "redirect after must be a path");
        self.by_subject_before.insert((subject, before), after);
    }

    /// Projects the rules whose `subject` is a prefix of `path` into a
    /// [`RedirectSet`]. Entries are folded in ascending `(subject, before)`
    /// order so a more-specific subject's `before -> after` mapping
    /// overwrites a less-specific subject's mapping of the same `before`.
    pub fn compute(&self, path: &str) -> RedirectSet {
        let mut by_before = BTreeMap::new();
        for ((subject, before), after) in &self.by_subject_before {
            if path.starts_with(subject.as_str()) {
                by_before.insert(before.clone(), after.clone());
            }
        }
        RedirectSet { by_before }
    }
}

fn is_plain_path(s: &str) -> bool {
    !s.contains(':') && !s.contains('[')
}
