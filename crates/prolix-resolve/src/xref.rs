//! Cross-references inside definition bodies.
//!
//! Definition text marks related words and phrases with braces, e.g.
//! `See {Bank}, n.` or `{Savings bank}`. Front ends use these to jump from
//! one definition to the next.

use prolix_core::capitalize;

const WORD_PUNCTUATION: &[char] = &['\'', '-'];
const PHRASE_PUNCTUATION: &[char] = &['\'', '-', ' '];

/// Braced phrases in `text`, cleaned up, in order of first appearance.
pub fn cross_references(text: &str) -> Vec<String> {
    let mut refs: Vec<String> = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            break;
        };
        let phrase = strip_phrase(&after[..close]);
        if !phrase.is_empty() && !refs.contains(&phrase) {
            refs.push(phrase);
        }
        rest = &after[close + 1..];
    }
    refs
}

/// The word or braced phrase covering character column `column` of `line`.
///
/// Single words come back capitalized, the way headwords are stored;
/// phrases keep their own casing.
pub fn word_at(line: &str, column: usize) -> Option<String> {
    let chars: Vec<char> = line.chars().collect();
    let column = column.min(chars.len());

    let prev_curly = chars[..column].iter().rposition(|&c| c == '{');
    if let Some(open) = prev_curly {
        if let Some(close) = chars[open..].iter().position(|&c| c == '}').map(|p| p + open) {
            if column <= close {
                let phrase: String = chars[open..close].iter().collect();
                let phrase = strip_phrase(&phrase);
                return (!phrase.is_empty()).then_some(phrase);
            }
        }
    }

    let start = chars[..column]
        .iter()
        .rposition(|&c| c == ' ')
        .unwrap_or(0);
    let end = chars
        .iter()
        .skip(start + 1)
        .position(|&c| c == ' ')
        .map(|p| p + start + 1)
        .unwrap_or(chars.len());
    let raw: String = chars[start..end.max(start)].iter().collect();
    let word = strip_word(&raw);
    (!word.is_empty()).then_some(word)
}

fn strip_phrase(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_alphabetic() || PHRASE_PUNCTUATION.contains(c))
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_word(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_alphabetic() || WORD_PUNCTUATION.contains(c))
        .collect();
    capitalize(&kept)
}
