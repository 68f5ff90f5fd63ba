//! Canonicalisation of domain phrasing and numeric formatting, applied before tokenisation.
//!
//! Disclosure filings and user questions spell the same financial term with or
//! without internal spaces ("발행 금액" / "발행금액") and write amounts with
//! thousands separators ("100,000"). Both are collapsed here so the lexical index
//! sees a single surface form.

use std::sync::LazyLock;

use regex::Regex;

/// Ordered `(pattern, canonical)` literal substitutions.
///
/// Applied sequentially. No earlier pattern may be a substring of a later one,
/// otherwise the earlier rewrite masks the later entry.
pub const TERM_REPLACEMENTS: &[(&str, &str)] = &[
    ("신용평가 등급", "신용평가등급"),
    ("상환 기일", "상환기일"),
    ("발행 금액", "발행금액"),
    ("총 발행금액", "총발행금액"),
    ("인수 기관", "인수기관"),
];

static THOUSANDS_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d),(\d)").expect("static regex"));

/// Full normalisation: term table, then numeric separators.
pub fn normalize(s: &str) -> String {
    collapse_thousands_separators(&normalize_terms(s))
}

pub fn normalize_terms(s: &str) -> String {
    let mut out = s.to_string();
    for (pattern, canonical) in TERM_REPLACEMENTS {
        if out.contains(pattern) {
            out = out.replace(pattern, canonical);
        }
    }
    out
}

/// `100,000` -> `100000`. Repeats until stable so `1,2,3` also collapses fully.
pub fn collapse_thousands_separators(s: &str) -> String {
    let mut out = s.to_string();
    while THOUSANDS_SEPARATOR.is_match(&out) {
        out = THOUSANDS_SEPARATOR.replace_all(&out, "$1$2").into_owned();
    }
    out
}

/// CRLF and lone CR become LF so line-anchored section markers behave the same everywhere.
pub fn normalize_newlines(s: &str) -> String {
    s.replace("\r\n", "\n").replace('\r', "\n")
}
