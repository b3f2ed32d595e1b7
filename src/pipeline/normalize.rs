//! Line normalisation: raw extracted text → ordered, cleaned lines.
//!
//! Control characters leak out of both pdfium text layers (form feeds
//! between pages, stray `\u{0002}` from broken ToUnicode maps) and OCR
//! output. They are removed here, before any token classification, because a
//! single invisible byte at the end of a line turns "x" into a line that is
//! no longer identifier-only.
//!
//! NFC composition guards the downstream regexes against visually identical
//! but differently encoded text (`e` + U+0301 versus `é`).

use unicode_normalization::UnicodeNormalization;

/// Invisible format characters removed together with C0/C1 controls.
const INVISIBLE: [char; 6] = [
    '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
];

/// Split raw text into cleaned lines.
///
/// Per line, in order: strip control and invisible characters, compose to
/// NFC, trim. Lines that end up empty are dropped.
pub fn normalize(raw: &str) -> Vec<String> {
    normalise_line_endings(raw)
        .split('\n')
        .map(clean_line)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Clean a single line (no splitting).
pub fn clean_line(line: &str) -> String {
    let stripped = strip_control_chars(line);
    let composed: String = stripped.nfc().collect();
    composed.trim().to_string()
}

/// Remove C0 (`U+0000–U+001F`), DEL and C1 (`U+0080–U+009F`) controls plus
/// zero-width/BOM/soft-hyphen format characters.
pub fn strip_control_chars(input: &str) -> String {
    input
        .chars()
        .filter(|&c| !is_control(c) && !INVISIBLE.contains(&c))
        .collect()
}

fn is_control(c: char) -> bool {
    matches!(c, '\u{0000}'..='\u{001F}' | '\u{007F}'..='\u{009F}')
}

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}
