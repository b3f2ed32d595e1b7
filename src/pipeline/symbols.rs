//! Character classes shared by the reconstructor and the formatter.
//!
//! Both sets are plain `&[char]` constants so they can be listed, tested and
//! extended without touching the regexes that consume them. The formatter
//! builds its character class from [`MATH_SYMBOLS`] at first use.

/// Mathematical and logical operator characters.
///
/// Grouped by family; order inside the slice carries no meaning.
pub const MATH_SYMBOLS: &[char] = &[
    // arithmetic
    '+', '-', '*', '/', '=', '×', '÷', '±', '∓', '·', '√', '∑', '∏', '∫', '∂', '∞',
    // comparison
    '<', '>', '≤', '≥', '≠', '≈', '≡', '∝',
    // set
    '∈', '∉', '∋', '⊂', '⊃', '⊆', '⊇', '∪', '∩', '∅', '∖',
    // logic
    '∧', '∨', '¬', '∀', '∃', '∄', '⊤', '⊢', '⊨',
    // arrows
    '→', '←', '↔', '⇒', '⇐', '⇔', '↦',
    // parallel / orthogonal
    '∥', '∦', '⊥',
    // grouping
    '(', ')', '[', ']', '{', '}',
];

/// Bullet glyphs that act as paragraph delimiters.
pub const MARKERS: &[char] = &['●', '►', '•', '◦'];

/// True if `c` belongs to [`MATH_SYMBOLS`].
pub fn is_math_symbol(c: char) -> bool {
    MATH_SYMBOLS.contains(&c)
}

/// True if `c` belongs to [`MARKERS`].
pub fn is_marker(c: char) -> bool {
    MARKERS.contains(&c)
}

/// A regex character class (`[...]`) matching any of `chars`.
///
/// Every character is escaped, so `-`, `]` and `^` are safe in any position.
pub(crate) fn char_class(chars: &[char]) -> String {
    let mut class = String::from("[");
    for &c in chars {
        class.push_str(&regex::escape(c.encode_utf8(&mut [0u8; 4])));
    }
    class.push(']');
    class
}
