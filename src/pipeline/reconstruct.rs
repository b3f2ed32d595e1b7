//! Paragraph reconstruction: rejoin lines that PDF extraction broke apart.
//!
//! Text layers and OCR both emit one line per visual line, so a formula
//! typeset as
//!
//! ```text
//! f
//! =
//! x
//! + 1
//! ```
//!
//! arrives as four lines. A single greedy left-to-right pass classifies each
//! incoming line against the text accumulated so far and either appends it to
//! the last [`Block`] or opens a new one. There is no backtracking: a line
//! that looks like a continuation is merged even if it really started a new
//! paragraph. That false-positive rate is the price of repairing formulas.

use crate::pipeline::symbols::is_math_symbol;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// How an incoming line relates to the text accumulated so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenClass {
    /// Letters only, e.g. a variable name on its own line.
    IdentifierOnly,
    /// Opens with an operator or bracket: `=`, `+ 1`, `) ∧ (b`.
    SymbolLed,
    /// Previous text ends alphanumeric and this line starts alphanumeric.
    AlnumContinuation,
    /// None of the above; starts a new block.
    Ordinary,
}

impl TokenClass {
    /// Whether a line of this class is appended to the previous block.
    pub fn merges(self) -> bool {
        !matches!(self, TokenClass::Ordinary)
    }
}

/// One logical run of text (a sentence or an expression) before formatting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    text: String,
    lines: usize,
}

impl Block {
    fn start(line: &str) -> Self {
        Self {
            text: line.to_string(),
            lines: 1,
        }
    }

    fn append(&mut self, line: &str) {
        self.text.push(' ');
        self.text.push_str(line);
        self.lines += 1;
    }

    /// Accumulated text, lines joined by single spaces.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of source lines merged into this block.
    pub fn line_count(&self) -> usize {
        self.lines
    }

    fn last_char(&self) -> Option<char> {
        self.text.chars().next_back()
    }
}

static RE_IDENTIFIER_ONLY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\p{L}+\s*$").unwrap());

/// Classify `line` given the last character of the accumulated text.
///
/// `prev_tail` is `None` when no block exists yet; in that case every line is
/// [`TokenClass::Ordinary`], so the first line always opens block 1.
///
/// Rules are tried in precedence order: identifier-only, symbol-led,
/// alphanumeric continuation.
pub fn classify(prev_tail: Option<char>, line: &str) -> TokenClass {
    let Some(tail) = prev_tail else {
        return TokenClass::Ordinary;
    };

    if RE_IDENTIFIER_ONLY.is_match(line) {
        return TokenClass::IdentifierOnly;
    }

    let Some(head) = line.chars().next() else {
        return TokenClass::Ordinary;
    };

    if is_math_symbol(head) {
        return TokenClass::SymbolLed;
    }

    if tail.is_alphanumeric() && head.is_alphanumeric() {
        return TokenClass::AlnumContinuation;
    }

    TokenClass::Ordinary
}

/// Merge cleaned lines into blocks.
///
/// Empty lines are skipped; they can neither open nor extend a block.
pub fn reconstruct<I, S>(lines: I) -> Vec<Block>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut blocks: Vec<Block> = Vec::new();

    for line in lines {
        let line = line.as_ref();
        if line.is_empty() {
            continue;
        }

        let tail = blocks.last().and_then(Block::last_char);
        if classify(tail, line).merges() {
            if let Some(last) = blocks.last_mut() {
                last.append(line);
                continue;
            }
        }
        blocks.push(Block::start(line));
    }

    blocks
}
