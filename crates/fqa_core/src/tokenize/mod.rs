//! Lexical tokeniser for Korean disclosure text.
//!
//! A token is a maximal run of Hangul syllables, a maximal run of ASCII Latin
//! letters, or a maximal run of digits. Everything else separates tokens.

use crate::normalize::normalize;

/// High-frequency filler that pollutes scores when kept.
pub const STOP_WORDS: &[&str] = &[
    "입니다", "합니다", "관한", "사항", "보고서", "주식회사", "회사", "회차",
];

pub const MIN_TOKEN_CHARS: usize = 2;

/// Trailing postpositions/copulas stripped by [`analyze`], longest first.
const HANGUL_SUFFIXES: &[&str] = &[
    "으로서", "으로", "에서", "에게", "까지", "부터", "이다", "이며", "이고", "은", "는", "이",
    "가", "을", "를", "의", "에", "와", "과", "도", "로", "만",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Hangul,
    Latin,
    Digit,
    Other,
}

fn classify(c: char) -> CharClass {
    match c {
        '가'..='힣' => CharClass::Hangul,
        'a'..='z' | 'A'..='Z' => CharClass::Latin,
        '0'..='9' => CharClass::Digit,
        _ => CharClass::Other,
    }
}

fn keep(token: &str) -> bool {
    token.chars().count() >= MIN_TOKEN_CHARS && !STOP_WORDS.contains(&token)
}

/// Normalise, lowercase and split `text` into searchable tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = normalize(text).to_lowercase();
    let mut out = Vec::new();
    let mut current = String::new();
    let mut current_class = CharClass::Other;

    for c in lowered.chars() {
        let class = classify(c);
        if class != current_class && !current.is_empty() {
            if keep(&current) {
                out.push(std::mem::take(&mut current));
            } else {
                current.clear();
            }
        }
        current_class = class;
        if class != CharClass::Other {
            current.push(c);
        }
    }
    if !current.is_empty() && keep(&current) {
        out.push(current);
    }
    out
}

/// Tokens used for ranking: [`tokenize`] output plus particle-stripped stems of Hangul tokens.
///
/// `총발행금액은` yields both `총발행금액은` and `총발행금액`, so a bare keyword query
/// still meets the inflected form written in a filing.
pub fn analyze(text: &str) -> Vec<String> {
    let tokens = tokenize(text);
    let mut out = Vec::with_capacity(tokens.len() * 2);
    for token in tokens {
        let stem = hangul_stem(&token).map(str::to_string);
        out.push(token);
        if let Some(stem) = stem {
            out.push(stem);
        }
    }
    out
}

fn hangul_stem(token: &str) -> Option<&str> {
    if !token.chars().all(|c| classify(c) == CharClass::Hangul) {
        return None;
    }
    HANGUL_SUFFIXES.iter().find_map(|suffix| {
        token
            .strip_suffix(suffix)
            .filter(|stem| keep(stem))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn splits_scripts_and_digits_into_separate_tokens() {
        assert_eq!(
            tokenize("ABC은행 2026년 KRW100"),
            vec!["abc", "은행", "2026", "krw", "100"]
        );
    }

    #[test]
    fn drops_stop_words_and_short_tokens() {
        assert_eq!(tokenize("주식회사 a 1 가 보고서 공시"), vec!["공시"]);
    }

    #[test]
    fn normalizes_before_splitting() {
        assert_eq!(tokenize("총 발행금액 100,000원"), vec!["총발행금액", "100000"]);
        assert_eq!(tokenize("신용평가 등급"), vec!["신용평가등급"]);
    }

    #[test]
    fn empty_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("  . , ! Ⅰ").is_empty());
    }

    #[test]
    fn analyze_adds_particle_stems() {
        assert_eq!(
            analyze("총발행금액은 상환기일"),
            vec!["총발행금액은", "총발행금액", "상환기일"]
        );
        // Stem would be a single character.
        assert_eq!(analyze("원이다"), vec!["원이다"]);
        // Latin and digit tokens are never stemmed.
        assert_eq!(analyze("bond 100"), vec!["bond", "100"]);
    }
}
