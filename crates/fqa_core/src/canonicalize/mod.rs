//! Rewrites colloquial questions into the fixed keyword the index recalls reliably.

use crate::normalize::normalize;

/// One canonicalisation rule: any surface pattern found in the query selects `keyword`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryRule {
    pub keyword: &'static str,
    pub patterns: &'static [&'static str],
}

/// Declaration order is significant: the first rule with a matching pattern wins.
pub const QUERY_RULES: &[QueryRule] = &[
    QueryRule {
        keyword: "총발행금액",
        patterns: &["총발행금액", "발행금액", "발행 금액", "총 발행금액"],
    },
    QueryRule {
        keyword: "신용평가등급",
        patterns: &["신용평가등급", "신용평가 등급", "등급"],
    },
    QueryRule {
        keyword: "상환기일",
        patterns: &["상환기일", "상환 기일", "만기", "만기일"],
    },
    QueryRule {
        keyword: "인수기관",
        patterns: &["인수기관", "인수 기관", "주관사", "인수사"],
    },
];

/// Canonicalise with the built-in rule table.
pub fn canonicalize_query(query: &str) -> String {
    canonicalize_with(QUERY_RULES, query)
}

/// Normalise `query`, then return the keyword of the first rule whose pattern occurs in it.
/// Without a match the normalised query is returned as is.
pub fn canonicalize_with(rules: &[QueryRule], query: &str) -> String {
    let normalized = normalize(query);
    rules
        .iter()
        .find(|rule| rule.patterns.iter().any(|p| normalized.contains(p)))
        .map(|rule| rule.keyword.to_string())
        .unwrap_or(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn maps_colloquial_question_to_keyword() {
        assert_eq!(canonicalize_query("총발행금액은 얼마야?"), "총발행금액");
        assert_eq!(canonicalize_query("만기가 언제야?"), "상환기일");
        assert_eq!(canonicalize_query("대표 주관사는 어디?"), "인수기관");
        assert_eq!(canonicalize_query("신용평가 등급 알려줘"), "신용평가등급");
    }

    #[test]
    fn earlier_rule_wins_over_earlier_occurrence() {
        // "만기일" appears first in the text but its rule is declared later.
        assert_eq!(canonicalize_query("만기일과 발행금액을 알려줘"), "총발행금액");
    }

    #[test]
    fn unmatched_query_is_normalized_only() {
        assert_eq!(canonicalize_query("이자율은 1,000 bp?"), "이자율은 1000 bp?");
    }

    #[test]
    fn custom_rule_table() {
        const RULES: &[QueryRule] = &[QueryRule {
            keyword: "이자율",
            patterns: &["금리", "이자"],
        }];
        assert_eq!(canonicalize_with(RULES, "표면 금리는?"), "이자율");
        assert_eq!(canonicalize_with(RULES, "발행금액"), "발행금액");
    }

    #[test]
    fn patterns_of_a_rule_never_mask_later_rules() {
        for (i, earlier) in QUERY_RULES.iter().enumerate() {
            for later in &QUERY_RULES[i + 1..] {
                for p in earlier.patterns {
                    for q in later.patterns {
                        assert!(!q.contains(p), "'{p}' ({}) masks '{q}' ({})", earlier.keyword, later.keyword);
                    }
                }
            }
        }
    }
}
