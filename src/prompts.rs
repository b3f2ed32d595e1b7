//! Prompts for the vision OCR backend.
//!
//! The vision model is used as a pure transcriber: the paragraph
//! reconstructor and math formatter run on its output exactly as they run on
//! a pdfium text layer, so the prompt asks for raw lines and nothing else.
//!
//! Callers can override the default via [`crate::config::ConversionConfig::system_prompt`];
//! the language hint is always sent as a second system message.

/// Default system prompt for transcribing one page image to plain text.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are an OCR engine. Transcribe the text of the page image exactly as printed.

Follow these rules precisely:

1. TEXT
   - Transcribe ALL visible text, in reading order
   - Keep one output line per printed line
   - Do not correct spelling, grammar or punctuation

2. FORMULAS
   - Write mathematical expressions with the Unicode symbols printed on the page
     (×, ÷, ≤, ≥, ≠, ∈, ∉, ⊂, ∪, ∩, ∧, ∨, ¬, →, ⇒, ∥, ⊥, √, ∑, ∫)
   - Do NOT use LaTeX, MathML or any markup

3. LISTS
   - Keep bullet glyphs (●, •, ◦, ►) as printed

4. OUTPUT FORMAT
   - Output ONLY the transcribed text
   - No Markdown, no code fences, no headings markup
   - No commentary, no "Page X" markers
   - If the page has no text, output nothing"#;

/// Second system message naming the expected document language.
///
/// `language` is a Tesseract-style code such as `eng` or `eng+fra`.
pub fn language_hint(language: &str) -> String {
    let codes: Vec<&str> = language.split('+').filter(|c| !c.is_empty()).collect();
    format!(
        "The page is written in the language(s) with ISO 639-2 code(s): {}. Transcribe it in that language; do not translate.",
        codes.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_prompt_forbids_markup() {
        assert!(DEFAULT_SYSTEM_PROMPT.contains("No Markdown"));
        assert!(DEFAULT_SYSTEM_PROMPT.contains("Do NOT use LaTeX"));
    }

    #[test]
    fn language_hint_lists_codes() {
        let hint = language_hint("eng+fra");
        assert!(hint.contains("eng, fra"));
        assert!(hint.contains("do not translate"));
    }
}
