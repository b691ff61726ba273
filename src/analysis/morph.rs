//! Morphological tokens produced by the external analyzer.

use serde::{Deserialize, Serialize};

use crate::analysis::kana::{is_lexical, kata_to_hira};

/// Part-of-speech tag of verbs.
pub const VERB: &str = "動詞";

/// Part-of-speech tag of adjectives.
pub const ADJECTIVE: &str = "形容詞";

/// Part-of-speech tag of auxiliary verbs.
pub const AUXILIARY_VERB: &str = "助動詞";

/// Part-of-speech tag of nouns.
pub const NOUN: &str = "名詞";

/// Leading character shared by the auxiliary categories (particles and
/// auxiliary verbs).
pub const AUXILIARY_PREFIX: char = '助';

/// Verbs that behave as auxiliaries when they follow a conjugating word.
pub const AUXILIARY_VERB_LEXEMES: &[&str] = &["れる", "られる", "いる", "おる"];

/// Lexemes never absorbed into a preceding conjugation chain.
pub const NEVER_ABSORBED: &[&str] = &["という", "と", "が", "の", "に", "は", "から"];

/// The light verb attached to verbal nouns.
pub const LIGHT_VERB: &str = "する";

/// Copula stripped from base forms when it does not occur in the surface.
pub const COPULA: &str = "だ";

/// A single analyzer token.
///
/// `reading` and `base_reading` are always hiragana when present.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MorphToken {
    /// Text as it appears in the input.
    pub surface: String,
    /// Part-of-speech category.
    pub form: Option<String>,
    /// Dictionary form.
    pub base: Option<String>,
    /// Reading of the surface.
    pub reading: Option<String>,
    /// Reading of the base form.
    pub base_reading: Option<String>,
}

impl MorphToken {
    /// Create a token with only a surface.
    pub fn new<S: Into<String>>(surface: S) -> Self {
        MorphToken {
            surface: surface.into(),
            ..Default::default()
        }
    }

    /// Set the part-of-speech category.
    pub fn with_form<S: Into<String>>(mut self, form: S) -> Self {
        self.form = Some(form.into());
        self
    }

    /// Set the base form.
    pub fn with_base<S: Into<String>>(mut self, base: S) -> Self {
        self.base = Some(base.into());
        self
    }

    /// Set the surface reading (normalized to hiragana).
    pub fn with_reading<S: AsRef<str>>(mut self, reading: S) -> Self {
        self.reading = Some(kata_to_hira(reading.as_ref()));
        self
    }

    /// Set the base reading (normalized to hiragana).
    pub fn with_base_reading<S: AsRef<str>>(mut self, reading: S) -> Self {
        self.base_reading = Some(kata_to_hira(reading.as_ref()));
        self
    }

    /// Whether the category is `form`.
    pub fn has_form(&self, form: &str) -> bool {
        self.form.as_deref() == Some(form)
    }

    /// Particles and auxiliary verbs.
    pub fn is_auxiliary(&self) -> bool {
        self.form
            .as_deref()
            .is_some_and(|f| f.starts_with(AUXILIARY_PREFIX))
    }

    /// Whether this token opens a conjugation chain.
    pub fn starts_conjugation(&self) -> bool {
        matches!(
            self.form.as_deref(),
            Some(VERB) | Some(ADJECTIVE) | Some(AUXILIARY_VERB)
        )
    }

    /// Whether the base form is one of `lexemes`.
    pub fn base_in(&self, lexemes: &[&str]) -> bool {
        self.base
            .as_deref()
            .is_some_and(|base| lexemes.contains(&base))
    }

    /// The lookup key for this token, if its base form is lexical.
    pub fn word(&self) -> Option<String> {
        let base = self.base.as_deref().filter(|b| is_lexical(b))?;
        Some(word_key(base, self.base_reading.as_deref()))
    }
}

/// Build a Word: the base form, followed by ` [reading]` when the reading
/// cannot be derived from the base by kana normalization.
pub fn word_key(base: &str, base_reading: Option<&str>) -> String {
    match base_reading {
        Some(reading) if !reading.is_empty() && reading != kata_to_hira(base) => {
            format!("{base} [{reading}]")
        }
        _ => base.to_string(),
    }
}
