//! Re-merging of morphological tokens into semantic words.
//!
//! The analyzer splits text more finely than a dictionary does: inflected
//! verbs come out as a stem plus a chain of auxiliaries, and compounds come
//! out as their parts. [`TokenMerger`] undoes both in two passes:
//!
//! 1. [`TokenMerger::collapse`] folds auxiliary tokens into the conjugating
//!    word they follow.
//! 2. [`TokenMerger::dict_collapse`] walks the result and greedily joins a
//!    token with its followers whenever the dictionary knows the joined
//!    string under exactly one entry.

use std::collections::VecDeque;

use log::trace;

use crate::analysis::kana::{is_kana_only, kata_to_hira};
use crate::analysis::morph::{AUXILIARY_VERB_LEXEMES, LIGHT_VERB, MorphToken, NEVER_ABSORBED, VERB};
use crate::dictionary::entry::{DictEntry, EntryLookup};

/// Default lookahead window of the dictionary pass.
pub const DEFAULT_MAX_DISTANCE: usize = 5;

/// Trailing particle turning a kana adverb into a `to`-adverb.
const ADVERBIAL_PARTICLE: char = 'と';

/// Knobs of the merge passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOptions {
    /// How many following tokens the dictionary pass may absorb.
    pub max_distance: usize,
    /// Whether auxiliaries are folded into conjugation chains (and passed
    /// through untouched by the dictionary pass).
    pub auxiliary: bool,
    /// Whether dictionary candidates must agree with the analyzer's reading.
    pub reading_check: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        MergeOptions {
            max_distance: DEFAULT_MAX_DISTANCE,
            auxiliary: true,
            reading_check: false,
        }
    }
}

impl MergeOptions {
    /// Cap the number of following tokens a dictionary merge may absorb.
    pub fn with_max_distance(mut self, max_distance: usize) -> Self {
        self.max_distance = max_distance;
        self
    }

    /// Toggle folding auxiliaries into conjugation chains.
    pub fn with_auxiliary(mut self, auxiliary: bool) -> Self {
        self.auxiliary = auxiliary;
        self
    }

    /// Require dictionary candidates to agree with the analyzer's reading.
    pub fn with_reading_check(mut self, reading_check: bool) -> Self {
        self.reading_check = reading_check;
        self
    }
}

/// Pick the single winner among `candidates`.
///
/// A lone candidate wins. Otherwise the candidates flagged by `popular` are
/// considered, and win only if there is exactly one of them. Anything else
/// is ambiguous and yields `None`.
pub fn resolve<T, F>(candidates: Vec<T>, popular: F) -> Option<T>
where
    F: Fn(&T) -> bool,
{
    if candidates.len() == 1 {
        return candidates.into_iter().next();
    }
    let mut popular: Vec<T> = candidates.into_iter().filter(|c| popular(c)).collect();
    if popular.len() == 1 { popular.pop() } else { None }
}

/// Merges analyzer tokens against a dictionary.
pub struct TokenMerger<'a> {
    dict: &'a dyn EntryLookup,
    options: MergeOptions,
}

impl<'a> TokenMerger<'a> {
    pub fn new(dict: &'a dyn EntryLookup) -> Self {
        TokenMerger {
            dict,
            options: MergeOptions::default(),
        }
    }

    pub fn with_options(mut self, options: MergeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &MergeOptions {
        &self.options
    }

    /// Run both passes.
    pub fn merge(&self, tokens: Vec<MorphToken>) -> Vec<MorphToken> {
        self.dict_collapse(self.collapse(tokens))
    }

    /// Fold auxiliaries into the conjugation chain they follow.
    ///
    /// The surface of an absorbed token is appended to the open token; its
    /// reading is appended only when both readings are known, and the open
    /// reading is dropped otherwise.
    pub fn collapse(&self, tokens: Vec<MorphToken>) -> Vec<MorphToken> {
        let mut merged = Vec::with_capacity(tokens.len());
        let mut open: Option<MorphToken> = None;
        let mut in_conjugation = false;

        for token in tokens {
            let absorbable = token.is_auxiliary()
                || (token.has_form(VERB) && token.base_in(AUXILIARY_VERB_LEXEMES));
            let joins = in_conjugation
                && self.options.auxiliary
                && absorbable
                && !token.base_in(NEVER_ABSORBED);

            match open.as_mut() {
                Some(current) if joins => {
                    current.surface.push_str(&token.surface);
                    current.reading = match (current.reading.take(), token.reading) {
                        (Some(mut reading), Some(tail)) => {
                            reading.push_str(&tail);
                            Some(reading)
                        }
                        _ => None,
                    };
                }
                _ => {
                    in_conjugation = token.starts_conjugation();
                    if let Some(done) = open.replace(token) {
                        push_non_empty(&mut merged, done);
                    }
                }
            }
        }
        if let Some(done) = open {
            push_non_empty(&mut merged, done);
        }
        merged
    }

    /// Dictionary-assisted re-segmentation.
    pub fn dict_collapse(&self, tokens: Vec<MorphToken>) -> Vec<MorphToken> {
        let mut pending: VecDeque<MorphToken> = tokens.into();
        let mut out = Vec::with_capacity(pending.len());

        while let Some(mut token) = pending.pop_front() {
            if self.options.auxiliary && token.is_auxiliary() {
                out.push(token);
                continue;
            }

            self.backfill_base_reading(&mut token);
            self.split_adverbial(&mut token);

            if let Some(last) = self.absorb_following(&mut token, &pending) {
                pending.drain(..=last);
            }

            if token.reading.is_none() && is_kana_only(&token.surface) {
                token.reading = Some(kata_to_hira(&token.surface));
            }
            out.push(token);
        }
        out
    }

    fn backfill_base_reading(&self, token: &mut MorphToken) {
        if has_text(&token.base_reading) {
            return;
        }
        if let (Some(base), Some(reading)) = (&token.base, &token.reading) {
            if let Some(entry) = self.dict.entry_with_reading(base, reading) {
                token.base_reading = entry.reading;
            }
        }
        if has_text(&token.base_reading) {
            return;
        }
        if let Some(base) = &token.base {
            if let Some(reading) = self.unique_reading(base) {
                token.base_reading = reading;
            }
        }
        if has_text(&token.base_reading) {
            return;
        }
        if let Some(reading) = &token.reading {
            if let Some(found) = self.unique_reading(reading) {
                token.base_reading = found;
            }
        }
    }

    /// The single reading recorded under `key`, if exactly one is.
    fn unique_reading(&self, key: &str) -> Option<Option<String>> {
        let mut readings = self.dict.readings(key);
        if readings.len() == 1 {
            readings.pop_first()
        } else {
            None
        }
    }

    /// Kana adverbs followed by the particle are often left whole by the
    /// analyzer even though only the bare adverb is a dictionary word.
    fn split_adverbial(&self, token: &mut MorphToken) {
        let Some(stem) = token.surface.strip_suffix(ADVERBIAL_PARTICLE) else {
            return;
        };
        let undistinguished = match &token.base {
            None => true,
            Some(base) => *base == token.surface,
        };
        if !stem.is_empty()
            && is_kana_only(&token.surface)
            && undistinguished
            && !self.dict.has_entries(&token.surface)
            && self.dict.has_entries(stem)
        {
            let stem = stem.to_string();
            token.base = Some(stem.clone());
            token.base_reading = Some(stem);
        }
    }

    /// Greedily join `token` with up to `max_distance` of the pending tokens.
    /// Returns the index of the last absorbed pending token.
    fn absorb_following(&self, token: &mut MorphToken, pending: &VecDeque<MorphToken>) -> Option<usize> {
        let mut last = None;
        let mut trial = token.surface.clone();
        let mut trial_reading = token.reading.clone();

        for (j, next) in pending.iter().take(self.options.max_distance).enumerate() {
            let (trial_base, trial_base_reading) = match &next.base {
                Some(base) => {
                    let reading = match (&trial_reading, &next.base_reading) {
                        (Some(r), Some(br)) => Some(format!("{r}{br}")),
                        _ => None,
                    };
                    (Some(format!("{trial}{base}")), reading)
                }
                None => (None, None),
            };

            trial.push_str(&next.surface);
            trial_reading = match (trial_reading, &next.reading) {
                (Some(mut r), Some(tail)) => {
                    r.push_str(tail);
                    Some(r)
                }
                _ => None,
            };

            let mut candidates = self.dict.entries(&trial);
            if candidates.is_empty() {
                if let Some(alt) = &trial_base {
                    candidates = self.dict.entries(alt);
                }
            }

            if self.options.reading_check {
                if let Some(reading) = &trial_reading {
                    candidates.retain(|entry| {
                        let primary = entry.primary_reading();
                        primary == reading || trial_base_reading.as_deref() == Some(primary)
                    });
                }
            }

            if candidates.is_empty() {
                continue;
            }
            if next.has_form(VERB) && next.base.as_deref() == Some(LIGHT_VERB) {
                continue;
            }

            let count = candidates.len();
            let Some(entry) = resolve(candidates, DictEntry::is_popular) else {
                trace!("{count} candidates for {trial:?}, not merging");
                continue;
            };

            token.surface = trial.clone();
            token.form = next.form.clone();
            token.base = Some(entry.headword);
            token.reading = trial_reading.clone();
            token.base_reading = entry.reading;
            last = Some(j);
        }
        last
    }
}

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

fn push_non_empty(out: &mut Vec<MorphToken>, token: MorphToken) {
    if !token.surface.is_empty() {
        out.push(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::morph::{AUXILIARY_VERB, NOUN};
    use crate::dictionary::{EdictDictionary, NoDictionary};

    fn verb(surface: &str, base: &str, reading: &str) -> MorphToken {
        MorphToken::new(surface)
            .with_form(VERB)
            .with_base(base)
            .with_reading(reading)
    }

    fn aux(surface: &str) -> MorphToken {
        MorphToken::new(surface)
            .with_form(AUXILIARY_VERB)
            .with_base(surface)
            .with_reading(surface)
    }

    fn particle(surface: &str) -> MorphToken {
        MorphToken::new(surface)
            .with_form("助詞")
            .with_base(surface)
            .with_reading(surface)
    }

    fn noun(surface: &str, reading: &str) -> MorphToken {
        MorphToken::new(surface)
            .with_form(NOUN)
            .with_base(surface)
            .with_reading(reading)
            .with_base_reading(reading)
    }

    fn entry(headword: &str, reading: Option<&str>, definition: &str) -> DictEntry {
        DictEntry::new(headword, reading.map(str::to_string), definition)
    }

    fn dict(entries: Vec<DictEntry>) -> EdictDictionary {
        let mut dict = EdictDictionary::new();
        for e in entries {
            dict.insert(e);
        }
        dict
    }

    fn surfaces(tokens: &[MorphToken]) -> Vec<&str> {
        tokens.iter().map(|t| t.surface.as_str()).collect()
    }

    #[test]
    fn test_resolve() {
        assert_eq!(resolve(vec![1], |_| false), Some(1));
        assert_eq!(resolve(Vec::<i32>::new(), |_| true), None);
        assert_eq!(resolve(vec![1, 2, 3], |x| *x == 2), Some(2));
        assert_eq!(resolve(vec![1, 2, 3], |x| *x >= 2), None);
        assert_eq!(resolve(vec![1, 2], |_| false), None);
    }

    #[test]
    fn test_collapse_conjugation_chain() {
        let merger = TokenMerger::new(&NoDictionary);
        let period = MorphToken::new("。").with_form("記号").with_base("。");
        let tokens = vec![verb("守り", "守る", "マモリ"), aux("ます"), period];
        let merged = merger.collapse(tokens);

        assert_eq!(surfaces(&merged), vec!["守ります", "。"]);
        assert_eq!(merged[0].base.as_deref(), Some("守る"));
        assert_eq!(merged[0].reading.as_deref(), Some("まもります"));
    }

    #[test]
    fn test_collapse_auxiliary_verb_lexeme() {
        let merger = TokenMerger::new(&NoDictionary);
        let tokens = vec![
            verb("食べ", "食べる", "タベ"),
            particle("て"),
            verb("いる", "いる", "イル"),
            noun("猫", "ねこ"),
        ];
        let merged = merger.collapse(tokens);
        assert_eq!(surfaces(&merged), vec!["食べている", "猫"]);
    }

    #[test]
    fn test_collapse_never_absorbs_connectives() {
        let merger = TokenMerger::new(&NoDictionary);
        let tokens = vec![verb("行く", "行く", "イク"), particle("と"), particle("が")];
        let merged = merger.collapse(tokens);
        assert_eq!(surfaces(&merged), vec!["行く", "と", "が"]);
    }

    #[test]
    fn test_collapse_requires_open_conjugation() {
        let merger = TokenMerger::new(&NoDictionary);
        let tokens = vec![noun("猫", "ねこ"), particle("を"), aux("です")];
        let merged = merger.collapse(tokens);
        assert_eq!(surfaces(&merged), vec!["猫", "を", "です"]);
    }

    #[test]
    fn test_collapse_disabled_auxiliary() {
        let merger = TokenMerger::new(&NoDictionary).with_options(MergeOptions::default().with_auxiliary(false));
        let tokens = vec![verb("守り", "守る", "マモリ"), aux("ます")];
        assert_eq!(merger.collapse(tokens).len(), 2);
    }

    #[test]
    fn test_collapse_drops_reading_when_one_is_missing() {
        let merger = TokenMerger::new(&NoDictionary);
        let tokens = vec![verb("守り", "守る", "マモリ"), MorphToken::new("ッ").with_form("助詞")];
        let merged = merger.collapse(tokens);
        assert_eq!(merged[0].surface, "守りッ");
        assert_eq!(merged[0].reading, None);
    }

    #[test]
    fn test_dict_collapse_joins_compound() {
        let dict = dict(vec![entry("日本語", Some("にほんご"), "/(n) Japanese/(P)/")]);
        let merger = TokenMerger::new(&dict);
        let merged = merger.merge(vec![noun("日本", "にほん"), noun("語", "ご"), particle("を")]);

        assert_eq!(surfaces(&merged), vec!["日本語", "を"]);
        assert_eq!(merged[0].base.as_deref(), Some("日本語"));
        assert_eq!(merged[0].reading.as_deref(), Some("にほんご"));
        assert_eq!(merged[0].base_reading.as_deref(), Some("にほんご"));
        assert_eq!(merged[0].word().as_deref(), Some("日本語 [にほんご]"));
    }

    #[test]
    fn test_dict_collapse_refuses_ambiguous_candidates() {
        let dict = dict(vec![
            entry("日本語", Some("にほんご"), "/(n) Japanese/"),
            entry("日本語", Some("にっぽんご"), "/(n) Japanese/"),
        ]);
        let merger = TokenMerger::new(&dict);
        let merged = merger.merge(vec![noun("日本", "にほん"), noun("語", "ご")]);
        assert_eq!(surfaces(&merged), vec!["日本", "語"]);
    }

    #[test]
    fn test_dict_collapse_popular_tie_break() {
        let dict = dict(vec![
            entry("日本語", Some("にほんご"), "/(n) Japanese/(P)/"),
            entry("日本語", Some("にっぽんご"), "/(n) Japanese/"),
        ]);
        let merger = TokenMerger::new(&dict);
        let merged = merger.merge(vec![noun("日本", "にほん"), noun("語", "ご")]);
        assert_eq!(surfaces(&merged), vec!["日本語"]);
        assert_eq!(merged[0].base_reading.as_deref(), Some("にほんご"));
    }

    #[test]
    fn test_dict_collapse_weighs_each_store_record() {
        use crate::dictionary::{DictionaryBuilder, DictionaryOptions, DictionaryStore, IndexCache};
        use std::sync::Arc;
        use tempfile::TempDir;

        let dir = TempDir::new().unwrap();
        let options = DictionaryOptions::default().with_cache(Arc::new(IndexCache::new(4)));

        let homonyms = dir.path().join("homonyms");
        DictionaryBuilder::new()
            .add_entry("生物", "/(n) living thing/")
            .add_entry("生物", "/(n) raw food/")
            .write(&homonyms)
            .unwrap();
        let store = DictionaryStore::open(&homonyms, &options).unwrap();
        assert_eq!(store.lookup("生物").len(), 2);

        let tokens = vec![noun("生", "なま"), noun("物", "もの")];
        let merged = TokenMerger::new(&store).merge(tokens.clone());
        assert_eq!(surfaces(&merged), vec!["生", "物"]);

        let popular = dir.path().join("popular");
        DictionaryBuilder::new()
            .add_entry("生物", "/(n) living thing/(P)/")
            .add_entry("生物", "/(n) raw food/")
            .write(&popular)
            .unwrap();
        let store = DictionaryStore::open(&popular, &options).unwrap();
        let merged = TokenMerger::new(&store).merge(tokens);
        assert_eq!(surfaces(&merged), vec!["生物"]);
    }

    #[test]
    fn test_dict_collapse_ambiguity_with_several_popular_entries() {
        let dict = dict(vec![
            entry("生物", Some("せいぶつ"), "/(n) living thing/(P)/"),
            entry("生物", Some("なまもの"), "/(n) raw food/(P)/"),
        ]);
        let merger = TokenMerger::new(&dict);
        let merged = merger.merge(vec![noun("生", "なま"), noun("物", "もの")]);
        assert_eq!(surfaces(&merged), vec!["生", "物"]);
    }

    #[test]
    fn test_reading_check_filters_candidates() {
        let dict = dict(vec![
            entry("生物", Some("せいぶつ"), "/(n) living thing/(P)/"),
            entry("生物", Some("なまもの"), "/(n) raw food/(P)/"),
        ]);
        let options = MergeOptions::default().with_reading_check(true);
        let merger = TokenMerger::new(&dict).with_options(options);
        let merged = merger.merge(vec![noun("生", "なま"), noun("物", "もの")]);

        assert_eq!(surfaces(&merged), vec!["生物"]);
        assert_eq!(merged[0].base_reading.as_deref(), Some("なまもの"));
    }

    #[test]
    fn test_light_verb_is_not_merged() {
        let dict = dict(vec![entry("勉強する", Some("べんきょうする"), "/(vs) to study/(P)/")]);
        let merger = TokenMerger::new(&dict);
        let tokens = vec![
            noun("勉強", "べんきょう"),
            verb("する", "する", "スル"),
        ];
        let merged = merger.merge(tokens);
        assert_eq!(surfaces(&merged), vec!["勉強", "する"]);
    }

    #[test]
    fn test_lookahead_window_is_bounded() {
        let dict = dict(vec![entry("あいうえおか", None, "/(exp) too long/(P)/")]);
        let tokens: Vec<MorphToken> = "あいうえおか"
            .chars()
            .map(|c| MorphToken::new(c.to_string()).with_form("名詞"))
            .collect();

        let merger = TokenMerger::new(&dict).with_options(MergeOptions::default().with_max_distance(4));
        assert_eq!(merger.merge(tokens.clone()).len(), 6);

        let merger = TokenMerger::new(&dict);
        let merged = merger.merge(tokens);
        assert_eq!(surfaces(&merged), vec!["あいうえおか"]);
        assert_eq!(merged[0].reading.as_deref(), Some("あいうえおか"));
    }

    #[test]
    fn test_backfill_base_reading() {
        let dict = dict(vec![entry("守る", Some("まもる"), "/(v5r) to protect/(P)/")]);
        let merger = TokenMerger::new(&dict);
        let merged = merger.merge(vec![verb("守り", "守る", "マモリ"), aux("ます")]);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].base_reading.as_deref(), Some("まもる"));
        assert_eq!(merged[0].word().as_deref(), Some("守る [まもる]"));
    }

    #[test]
    fn test_backfill_skips_ambiguous_readings() {
        let dict = dict(vec![
            entry("辛い", Some("からい"), "/(adj-i) spicy/(P)/"),
            entry("辛い", Some("つらい"), "/(adj-i) painful/(P)/"),
        ]);
        let merger = TokenMerger::new(&dict);
        let token = MorphToken::new("辛い").with_form("形容詞").with_base("辛い");
        let merged = merger.merge(vec![token]);
        assert_eq!(merged[0].base_reading, None);
    }

    #[test]
    fn test_adverbial_particle_is_split_off() {
        let dict = dict(vec![entry("ゆっくり", None, "/(adv) slowly/(P)/")]);
        let merger = TokenMerger::new(&dict);
        let merged = merger.merge(vec![MorphToken::new("ゆっくりと").with_form("副詞")]);

        assert_eq!(merged[0].surface, "ゆっくりと");
        assert_eq!(merged[0].base.as_deref(), Some("ゆっくり"));
        assert_eq!(merged[0].base_reading.as_deref(), Some("ゆっくり"));
        assert_eq!(merged[0].reading.as_deref(), Some("ゆっくりと"));
    }

    #[test]
    fn test_auxiliaries_pass_through_dictionary_pass() {
        let dict = dict(vec![entry("をする", None, "/(exp) nonsense/(P)/")]);
        let merger = TokenMerger::new(&dict);
        let merged = merger.dict_collapse(vec![particle("を"), noun("す", "す"), noun("る", "る")]);
        assert_eq!(merged[0].surface, "を");
    }
}
