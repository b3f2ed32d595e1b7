//! Math-aware formatting: merged blocks → final paragraphs.
//!
//! ## Rule Order
//!
//! All blocks are joined into one stream and re-split on bullet markers, so
//! a marker buried in the middle of a merged block still opens a paragraph.
//! Each segment then goes through the spacing rules below, strictly in this
//! order. Later rules undo parts of earlier ones on purpose: rule 2 puts
//! spaces around *every* bracket, rules 6 and 7 take them back where they
//! hurt readability (`( x )` → `(x)`, `f (x)` → `f(x)`).
//!
//! 1. Strip control characters, recompose to NFC
//! 2. Surround every math symbol with spaces
//! 3. Exactly one space on each side of `-`, `+`, `=`
//! 4. Collapse runs of whitespace ([`SpaceCollapse`])
//! 5. Rejoin letter–digit and digit–letter pairs (`a 1` → `a1`)
//! 6. No space after `(` or before `)`
//! 7. No space between a letter and `(`; one space between `)` and a word
//! 8. Canonical `) - (`
//! 9. Trim

use crate::config::{ParagraphStyle, SpaceCollapse};
use crate::pipeline::normalize::{clean_line, strip_control_chars};
use crate::pipeline::reconstruct::Block;
use crate::pipeline::symbols::{char_class, is_marker, MATH_SYMBOLS};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

/// One output paragraph with its display attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    pub text: String,
    /// Run font size in half-points.
    pub font_size_half_points: usize,
    /// Space after the paragraph in twips.
    pub spacing_after_twips: u32,
}

impl Paragraph {
    pub fn new(text: impl Into<String>, style: ParagraphStyle) -> Self {
        Self {
            text: text.into(),
            font_size_half_points: style.font_size_half_points,
            spacing_after_twips: style.spacing_after_twips,
        }
    }
}

/// Format merged blocks into paragraphs.
pub fn format_blocks(
    blocks: &[Block],
    collapse: SpaceCollapse,
    style: ParagraphStyle,
) -> Vec<Paragraph> {
    let combined = blocks
        .iter()
        .map(Block::text)
        .collect::<Vec<_>>()
        .join(" ");

    split_markers(&combined)
        .iter()
        .map(|segment| format_segment(segment, collapse))
        .filter(|text| !text.is_empty())
        .map(|text| Paragraph::new(text, style))
        .collect()
}

/// Plain mode: one paragraph per cleaned line, no merging or respacing.
pub fn format_plain<I, S>(lines: I, style: ParagraphStyle) -> Vec<Paragraph>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .map(|line| clean_line(line.as_ref()))
        .filter(|line| !line.is_empty())
        .map(|line| Paragraph::new(line, style))
        .collect()
}

/// Split on bullet markers. Each marker opens a new segment and stays at its
/// start; segments that are blank after trimming are dropped.
///
/// A marker followed by text is not emitted as a paragraph of its own; only a
/// marker with nothing after it stands alone.
pub fn split_markers(text: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();

    for c in text.chars() {
        if is_marker(c) {
            segments.push(std::mem::take(&mut current));
        }
        current.push(c);
    }
    segments.push(current);

    segments
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// ── Rule regexes ─────────────────────────────────────────────────────────────

static RE_MATH_SYMBOL: Lazy<Regex> = Lazy::new(|| Regex::new(&char_class(MATH_SYMBOLS)).unwrap());

static RE_CORE_OPERATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*([-+=])\s*").unwrap());

static RE_MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());

static RE_LETTER_DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\p{L})\s+(\d)").unwrap());

static RE_DIGIT_LETTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d)\s+(\p{L})").unwrap());

static RE_AFTER_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(\s+").unwrap());

static RE_BEFORE_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+\)").unwrap());

static RE_LETTER_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\p{L})\s+\(").unwrap());

static RE_CLOSE_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\)\s*([\p{L}\p{N}])").unwrap());

static RE_GROUP_MINUS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\)\s*-\s*\(").unwrap());

/// Apply rules 1–9 to one segment.
pub fn format_segment(segment: &str, collapse: SpaceCollapse) -> String {
    // 1
    let s: String = strip_control_chars(segment).nfc().collect();
    // 2
    let s = RE_MATH_SYMBOL.replace_all(&s, " ${0} ");
    // 3
    let s = RE_CORE_OPERATOR.replace_all(&s, " ${1} ");
    // 4
    let s = match collapse {
        SpaceCollapse::All => RE_MULTI_SPACE.replace_all(&s, " "),
        SpaceCollapse::FirstRunOnly => RE_MULTI_SPACE.replace(&s, " "),
    };
    // 5
    let s = RE_LETTER_DIGIT.replace_all(&s, "${1}${2}");
    let s = RE_DIGIT_LETTER.replace_all(&s, "${1}${2}");
    // 6
    let s = RE_AFTER_OPEN.replace_all(&s, "(");
    let s = RE_BEFORE_CLOSE.replace_all(&s, ")");
    // 7
    let s = RE_LETTER_OPEN.replace_all(&s, "${1}(");
    let s = RE_CLOSE_WORD.replace_all(&s, ") ${1}");
    // 8
    let s = RE_GROUP_MINUS.replace_all(&s, ") - (");
    // 9
    s.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::reconstruct::reconstruct;

    fn fmt(s: &str) -> String {
        format_segment(s, SpaceCollapse::All)
    }

    #[test]
    fn operators_get_single_spaces() {
        assert_eq!(fmt("x=y+2"), "x = y + 2");
        assert_eq!(fmt("a  -   b"), "a - b");
    }

    #[test]
    fn letter_digit_pairs_rejoin() {
        assert_eq!(fmt("a 1 + b 2"), "a1 + b2");
        assert_eq!(fmt("2 x"), "2x");
    }

    #[test]
    fn parentheses_hug_their_content() {
        assert_eq!(fmt("f ( x )"), "f(x)");
        assert_eq!(fmt("g(x+1)"), "g(x + 1)");
        assert_eq!(fmt("2(x+1)"), "2 (x + 1)");
    }

    #[test]
    fn closing_paren_then_word_gets_one_space() {
        assert_eq!(fmt("(a)b"), "(a) b");
        assert_eq!(fmt("(a)    7"), "(a) 7");
    }

    #[test]
    fn grouped_subtraction_is_canonical() {
        assert_eq!(fmt("(a+b)-(c+d)"), "(a + b) - (c + d)");
        assert_eq!(fmt("(a)   -(b)"), "(a) - (b)");
    }

    #[test]
    fn set_and_logic_symbols_are_spaced() {
        assert_eq!(fmt("x∈A∧y∉B"), "x ∈ A ∧ y ∉ B");
        assert_eq!(fmt("p⇒q"), "p ⇒ q");
        assert_eq!(fmt("AB∥CD"), "AB ∥ CD");
    }

    #[test]
    fn control_chars_are_stripped_again() {
        assert_eq!(fmt("x\u{0007}=1"), "x = 1");
    }

    #[test]
    fn first_run_only_collapse_leaves_later_runs() {
        let text = "alpha   beta    gamma";
        assert_eq!(
            format_segment(text, SpaceCollapse::FirstRunOnly),
            "alpha beta    gamma"
        );
        assert_eq!(format_segment(text, SpaceCollapse::All), "alpha beta gamma");
    }

    #[test]
    fn markers_open_paragraphs() {
        let segments = split_markers("intro text ● item one ● item two");
        assert_eq!(segments, vec!["intro text", "● item one", "● item two"]);
    }

    #[test]
    fn lone_marker_is_kept() {
        assert_eq!(split_markers("a •"), vec!["a", "•"]);
        assert_eq!(split_markers("►◦"), vec!["►", "◦"]);
        assert!(split_markers("   ").is_empty());
    }

    #[test]
    fn marker_with_text_is_not_emitted_alone() {
        let segments = split_markers("● item");
        assert_eq!(segments, vec!["● item"]);
        assert!(!segments.iter().any(|s| s == "●"));
    }

    #[test]
    fn format_blocks_joins_then_splits() {
        let blocks = reconstruct(["intro text", "● item one", "• item two"]);
        let paragraphs = format_blocks(&blocks, SpaceCollapse::All, ParagraphStyle::default());
        let texts: Vec<&str> = paragraphs.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["intro text", "● item one", "• item two"]);
        assert!(paragraphs.iter().all(|p| p.font_size_half_points == 24));
        assert!(paragraphs.iter().all(|p| p.spacing_after_twips == 200));
    }

    #[test]
    fn end_to_end_formula() {
        let blocks = reconstruct(["f", "=", "x", "+ 1"]);
        let paragraphs = format_blocks(&blocks, SpaceCollapse::All, ParagraphStyle::default());
        assert_eq!(paragraphs.len(), 1);
        assert_eq!(paragraphs[0].text, "f = x + 1");
    }

    #[test]
    fn plain_mode_keeps_lines() {
        let style = ParagraphStyle {
            font_size_half_points: 20,
            spacing_after_twips: 0,
        };
        let paragraphs = format_plain(["x=1", "", " y "], style);
        let texts: Vec<&str> = paragraphs.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["x=1", "y"]);
        assert_eq!(paragraphs[0].font_size_half_points, 20);
    }

    #[test]
    fn empty_blocks_produce_nothing() {
        assert!(format_blocks(&[], SpaceCollapse::All, ParagraphStyle::default()).is_empty());
    }
}
