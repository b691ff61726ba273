//! Script classification helpers for Japanese text.

/// First katakana letter with a hiragana counterpart (ァ).
const KATAKANA_FIRST: char = '\u{30A1}';

/// Last katakana letter with a hiragana counterpart (ヶ).
const KATAKANA_LAST: char = '\u{30F6}';

/// Distance between a katakana letter and its hiragana counterpart.
const KANA_OFFSET: u32 = 0x60;

/// Whether `c` is in the hiragana block.
pub fn is_hiragana(c: char) -> bool {
    matches!(c, '\u{3041}'..='\u{309F}')
}

/// Whether `c` is in the katakana block.
pub fn is_katakana(c: char) -> bool {
    matches!(c, '\u{30A1}'..='\u{30FF}')
}

/// Whether every character is hiragana or katakana (vacuously true for "").
pub fn is_kana_only(text: &str) -> bool {
    text.chars().all(|c| is_hiragana(c) || is_katakana(c))
}

/// Convert katakana letters to hiragana, leaving everything else alone.
pub fn kata_to_hira(text: &str) -> String {
    text.chars()
        .map(|c| {
            if (KATAKANA_FIRST..=KATAKANA_LAST).contains(&c) {
                char::from_u32(c as u32 - KANA_OFFSET).unwrap_or(c)
            } else {
                c
            }
        })
        .collect()
}

/// Whether `text` is non-empty and made only of letters and digits, i.e. it
/// is worth looking up in a dictionary.
pub fn is_lexical(text: &str) -> bool {
    !text.is_empty() && text.chars().all(char::is_alphanumeric)
}
