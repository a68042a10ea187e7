//! Two phase search over a [`MappingTable`].
//!
//! The exact phase looks the query up by deobfuscated, obfuscated, intermediary
//! and simple class name. Only if that finds nothing does the fuzzy phase run,
//! scoring the candidates the fragment index suggests.
use std::cmp::Ordering;

use indexmap::IndexSet;
use itertools::Itertools;
use log::{debug, trace};
use serde_derive::Serialize;

use crate::config::{SearchConfig, HARD_LIMIT};
use crate::entry::MappingEntry;
use crate::error::InvalidArgument;
use crate::table::{EntryIndex, MappingTable};
use crate::{MinecraftVersion, Namespace};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Fuzzy
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub namespace: Namespace,
    pub version: MinecraftVersion,
    pub limit: usize
}
impl SearchQuery {
    #[inline]
    pub fn new<S: Into<String>>(namespace: Namespace, version: MinecraftVersion, text: S, limit: usize) -> SearchQuery {
        SearchQuery { text: text.into(), namespace, version, limit }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct SearchHit {
    /// The index of the matching entry in its table
    pub index: EntryIndex,
    pub match_kind: MatchKind,
    /// From zero to one, exact matches always score one
    pub score: f32
}

/// Ranked references into a table, best first
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchResult {
    hits: Vec<SearchHit>
}
impl SearchResult {
    #[inline]
    pub fn hits(&self) -> &[SearchHit] {
        &self.hits
    }
    #[inline]
    pub fn len(&self) -> usize {
        self.hits.len()
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
    /// Whether these are exact or fuzzy matches, or `None` if nothing matched
    #[inline]
    pub fn match_kind(&self) -> Option<MatchKind> {
        self.hits.first().map(|hit| hit.match_kind)
    }
    /// Resolve the hits against the table they came from
    pub fn entries<'a>(&'a self, table: &'a MappingTable) -> impl Iterator<Item=(&'a MappingEntry, &'a SearchHit)> + 'a {
        self.hits.iter().filter_map(move |hit| table.get(hit.index).map(|entry| (entry, hit)))
    }
}

/// The matches of the exact phase, before ranking
#[derive(Debug)]
pub struct ExactPhase {
    matches: Vec<EntryIndex>
}
impl ExactPhase {
    /// If the exact phase found anything, the fuzzy phase must not run
    #[inline]
    pub fn is_conclusive(&self) -> bool {
        !self.matches.is_empty()
    }
    #[inline]
    pub fn len(&self) -> usize {
        self.matches.len()
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
    fn into_result(mut self, table: &MappingTable, limit: usize) -> SearchResult {
        let entries = table.entries();
        self.matches.sort_by(|&first, &second| {
            let (a, b) = (&entries[first as usize], &entries[second as usize]);
            a.kind.priority().cmp(&b.kind.priority())
                .then_with(|| a.owner.cmp(&b.owner))
                .then(first.cmp(&second))
        });
        self.matches.truncate(limit);
        let hits = self.matches.into_iter()
            .map(|index| SearchHit { index, match_kind: MatchKind::Exact, score: 1.0 })
            .collect();
        SearchResult { hits }
    }
}

#[derive(Clone, Debug, Default)]
pub struct SearchEngine {
    config: SearchConfig
}
impl SearchEngine {
    #[inline]
    pub fn new(config: SearchConfig) -> SearchEngine {
        SearchEngine { config }
    }
    #[inline]
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }
    #[inline]
    fn max_limit(&self) -> usize {
        self.config.max_limit.min(HARD_LIMIT)
    }
    /// Check the query text and limit, returning the trimmed text
    pub fn validate<'a>(&self, text: &'a str, limit: usize) -> Result<&'a str, InvalidArgument> {
        let text = text.trim();
        if text.is_empty() {
            return Err(InvalidArgument("The query must not be empty".into()))
        }
        if limit == 0 || limit > self.max_limit() {
            return Err(InvalidArgument(format!(
                "The limit must be between 1 and {}, not {}", self.max_limit(), limit
            )))
        }
        Ok(text)
    }
    pub fn search(&self, table: &MappingTable, query: &SearchQuery) -> Result<SearchResult, InvalidArgument> {
        let text = self.validate(&query.text, query.limit)?;
        let exact = self.exact_phase(table, text);
        if exact.is_conclusive() {
            trace!("Found {} exact matches for {:?}", exact.len(), text);
            return Ok(exact.into_result(table, query.limit))
        }
        Ok(self.fuzzy_phase(table, &text.to_lowercase(), query.limit))
    }
    /// Find every entry with a name exactly equal to the text.
    ///
    /// Dotted and slashed class names are considered equivalent,
    /// since Mojang uses `net.minecraft.World` while Yarn uses `net/minecraft/World`.
    pub fn exact_phase(&self, table: &MappingTable, text: &str) -> ExactPhase {
        let swapped = swap_separators(text);
        let keys = Some(text).into_iter().chain(swapped.as_ref().map(String::as_str));
        let matches = keys
            .flat_map(|key| {
                table.exact_matches(key).iter()
                    .chain(table.obfuscated_matches(key))
                    .chain(table.intermediary_matches(key))
                    .chain(table.simple_name_matches(key))
            })
            .cloned()
            .unique()
            .collect();
        ExactPhase { matches }
    }
    /// Score the fragment index candidates against the lowercased query
    pub fn fuzzy_phase(&self, table: &MappingTable, query: &str, limit: usize) -> SearchResult {
        let candidates = self.fuzzy_candidates(table, query);
        let entries = table.entries();
        let mut scored: Vec<(f32, EntryIndex)> = candidates.into_iter()
            .filter_map(|index| {
                let entry = &entries[index as usize];
                let mut score = similarity(query, &entry.deobfuscated.to_lowercase());
                if entry.simple_name().len() != entry.deobfuscated.len() {
                    score = score.max(similarity(query, &entry.simple_name().to_lowercase()));
                }
                if score >= self.config.min_fuzzy_score && score > 0.0 {
                    Some((score, index))
                } else {
                    None
                }
            })
            .collect();
        scored.sort_by(|&(first_score, first), &(second_score, second)| {
            let (a, b) = (&entries[first as usize], &entries[second as usize]);
            second_score.partial_cmp(&first_score).unwrap_or(Ordering::Equal)
                .then_with(|| a.kind.priority().cmp(&b.kind.priority()))
                .then_with(|| a.deobfuscated.len().cmp(&b.deobfuscated.len()))
                .then(first.cmp(&second))
        });
        scored.truncate(limit);
        trace!("Found {} fuzzy matches for {:?}", scored.len(), query);
        let hits = scored.into_iter()
            .map(|(score, index)| SearchHit { index, match_kind: MatchKind::Fuzzy, score })
            .collect();
        SearchResult { hits }
    }
    /// Entries with a fragment that contains the query or is contained in it
    fn fuzzy_candidates(&self, table: &MappingTable, query: &str) -> IndexSet<EntryIndex> {
        let cap = self.config.fuzzy_candidate_cap;
        let mut candidates = IndexSet::new();
        'fragments: for (fragment, indexes) in table.fragments() {
            if !fragment.contains(query) && !query.contains(fragment) {
                continue
            }
            for &index in indexes {
                candidates.insert(index);
                if candidates.len() >= cap {
                    debug!("Reached the cap of {} fuzzy candidates for {:?}", cap, query);
                    break 'fragments;
                }
            }
        }
        candidates
    }
}

fn swap_separators(text: &str) -> Option<String> {
    match (text.contains('.'), text.contains('/')) {
        (true, false) => Some(text.replace('.', "/")),
        (false, true) => Some(text.replace('/', ".")),
        _ => None
    }
}

/// How similar two (lowercased) names are, from zero to one.
///
/// Identical names score one and names with nothing in common score zero.
/// A name containing the query always beats an unrelated name of the same length.
pub fn similarity(query: &str, name: &str) -> f32 {
    if query == name {
        return 1.0
    }
    let query_length = query.chars().count();
    let name_length = name.chars().count();
    if query_length == 0 || name_length == 0 {
        return 0.0
    }
    if name.contains(query) {
        let ratio = query_length as f32 / name_length as f32;
        return if name.starts_with(query) {
            0.55 + 0.45 * ratio
        } else {
            0.5 + 0.5 * ratio
        }
    }
    let distance = levenshtein(query, name);
    1.0 - distance as f32 / query_length.max(name_length) as f32
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.chars().enumerate() {
        let mut previous = row[0];
        row[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == cb {
                previous
            } else {
                1 + previous.min(row[j]).min(above)
            };
            previous = above;
        }
    }
    row[b.len()]
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::entry::EntryKind;
    use crate::format::{proguard, tiny};

    const WORLD: &str = "net.minecraft.World -> a:\n    void tick() -> a\n";

    fn query(text: &str, limit: usize) -> SearchQuery {
        SearchQuery::new(Namespace::Mojang, MinecraftVersion::release(1, 20, Some(4)), text, limit)
    }
    fn names<'a>(result: &'a SearchResult, table: &'a MappingTable) -> Vec<&'a str> {
        result.entries(table).map(|(entry, _)| entry.deobfuscated.as_str()).collect()
    }
    #[test]
    fn exact_scenario() {
        let table = proguard::parse(WORLD).unwrap();
        let result = SearchEngine::default().search(&table, &query("tick", 10)).unwrap();
        assert_eq!(result.len(), 1);
        let (entry, hit) = result.entries(&table).next().unwrap();
        assert_eq!(entry.kind, EntryKind::Method);
        assert_eq!(entry.deobfuscated, "tick");
        assert_eq!(hit.match_kind, MatchKind::Exact);
        assert_eq!(hit.score, 1.0);
    }
    #[test]
    fn fuzzy_scenario() {
        let table = proguard::parse(WORLD).unwrap();
        let result = SearchEngine::default().search(&table, &query("tic", 10)).unwrap();
        assert_eq!(result.len(), 1);
        let (entry, hit) = result.entries(&table).next().unwrap();
        assert_eq!(entry.deobfuscated, "tick");
        assert_eq!(entry.kind, EntryKind::Method);
        assert_eq!(hit.match_kind, MatchKind::Fuzzy);
        assert!(hit.score > 0.1);
        assert!(hit.score < 1.0);
    }
    #[test]
    fn exact_matches_short_circuit() {
        let table = proguard::parse("\
net.minecraft.World -> a:
    void tick() -> b
    void ticker() -> c
    void tickWorld() -> d
").unwrap();
        let engine = SearchEngine::default();
        assert!(engine.exact_phase(&table, "tick").is_conclusive());
        let result = engine.search(&table, &query("tick", 10)).unwrap();
        assert_eq!(names(&result, &table), vec!["tick"]);
        assert!(result.hits().iter().all(|hit| hit.match_kind == MatchKind::Exact));
        // Without an exact match the fuzzy phase finds all of them
        assert!(!engine.exact_phase(&table, "tic").is_conclusive());
        let fuzzy = engine.search(&table, &query("tic", 10)).unwrap();
        assert_eq!(fuzzy.match_kind(), Some(MatchKind::Fuzzy));
        assert_eq!(names(&fuzzy, &table), vec!["tick", "ticker", "tickWorld"]);
    }
    #[test]
    fn exact_obfuscated_ranking() {
        let table = proguard::parse("\
net.minecraft.World -> a:
    int time -> a
    void tick() -> a
net.minecraft.Level -> b:
    void save() -> a
").unwrap();
        let result = SearchEngine::default().search(&table, &query("a", 10)).unwrap();
        let ranked: Vec<(EntryKind, &str)> = result.entries(&table)
            .map(|(entry, _)| (entry.kind, entry.deobfuscated.as_str()))
            .collect();
        assert_eq!(ranked, vec![
            (EntryKind::Class, "net.minecraft.World"),
            (EntryKind::Method, "save"),
            (EntryKind::Method, "tick"),
            (EntryKind::Field, "time"),
        ]);
        let limited = SearchEngine::default().search(&table, &query("a", 2)).unwrap();
        assert_eq!(names(&limited, &table), vec!["net.minecraft.World", "save"]);
    }
    #[test]
    fn class_name_forms() {
        let mojang = proguard::parse(WORLD).unwrap();
        let yarn = tiny::parse("\
tiny\t2\t0\tintermediary\tnamed
c\tnet/minecraft/class_1\tnet/minecraft/world/World
").unwrap();
        let engine = SearchEngine::default();
        for text in &["net/minecraft/World", "net.minecraft.World", "World"] {
            let result = engine.search(&mojang, &query(text, 10)).unwrap();
            assert_eq!(result.match_kind(), Some(MatchKind::Exact), "{}", text);
            assert_eq!(names(&result, &mojang), vec!["net.minecraft.World"]);
        }
        for text in &["net.minecraft.world.World", "net/minecraft/class_1", "World"] {
            let result = engine.search(&yarn, &query(text, 10)).unwrap();
            assert_eq!(result.match_kind(), Some(MatchKind::Exact), "{}", text);
        }
    }
    #[test]
    fn exact_is_case_sensitive() {
        let table = proguard::parse(WORLD).unwrap();
        let result = SearchEngine::default().search(&table, &query("TICK", 10)).unwrap();
        assert_eq!(result.match_kind(), Some(MatchKind::Fuzzy));
        assert_eq!(result.hits()[0].score, 1.0);
    }
    #[test]
    fn fuzzy_tie_breaking() {
        let table = proguard::parse("\
a.b.Tick -> a:
    void tick() -> a
Tick -> b:
").unwrap();
        let result = SearchEngine::default().search(&table, &query("tic", 10)).unwrap();
        assert_eq!(names(&result, &table), vec!["Tick", "a.b.Tick", "tick"]);
    }
    #[test]
    fn no_match_is_empty() {
        let table = proguard::parse(WORLD).unwrap();
        let result = SearchEngine::default().search(&table, &query("zzzz", 10)).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.match_kind(), None);
        let empty = proguard::parse("").unwrap();
        assert!(SearchEngine::default().search(&empty, &query("tick", 10)).unwrap().is_empty());
    }
    #[test]
    fn invalid_arguments() {
        let table = proguard::parse(WORLD).unwrap();
        let engine = SearchEngine::default();
        for &(text, limit) in &[("", 10), ("   ", 10), ("tick", 0), ("tick", 101)] {
            assert!(engine.search(&table, &query(text, limit)).is_err(), "{:?} {}", text, limit);
        }
        assert!(engine.search(&table, &query(" tick ", 100)).is_ok());
        assert!(engine.search(&table, &query("tick", 1)).is_ok());
        let strict = SearchEngine::new(SearchConfig { max_limit: 5, default_limit: 5, ..SearchConfig::default() });
        assert!(strict.search(&table, &query("tick", 6)).is_err());
    }
    #[test]
    fn candidate_cap() {
        let mut text = String::from("net.minecraft.World -> a:\n");
        for i in 0..50 {
            text.push_str(&format!("    void tick{}() -> m{}\n", i, i));
        }
        let table = proguard::parse(&text).unwrap();
        let config = SearchConfig { fuzzy_candidate_cap: 7, ..SearchConfig::default() };
        let result = SearchEngine::new(config).search(&table, &query("tic", 100)).unwrap();
        assert_eq!(result.len(), 7);
        let uncapped = SearchEngine::default().search(&table, &query("tic", 100)).unwrap();
        assert_eq!(uncapped.len(), 50);
    }
    #[test]
    fn minimum_score() {
        let table = proguard::parse("\
net.minecraft.World -> a:
    void tickEverythingInTheWorldRightNow() -> a
").unwrap();
        let config = SearchConfig { min_fuzzy_score: 0.9, ..SearchConfig::default() };
        assert!(SearchEngine::new(config).search(&table, &query("tic", 10)).unwrap().is_empty());
        assert_eq!(SearchEngine::default().search(&table, &query("tic", 10)).unwrap().len(), 1);
    }
    #[test]
    fn similarity_bounds() {
        assert_eq!(similarity("tick", "tick"), 1.0);
        assert_eq!(similarity("abcd", "wxyz"), 0.0);
        assert_eq!(similarity("", "tick"), 0.0);
        for &(query, containing, unrelated) in &[
            ("tic", "tick", "bark"),
            ("world", "serverworld", "blockstates"),
            ("state", "getblockstate", "fromnbtcodecs"),
        ] {
            assert_eq!(containing.len(), unrelated.len());
            let contained = similarity(query, containing);
            assert!(contained > similarity(query, unrelated), "{} {}", query, containing);
            assert!(contained < 1.0);
        }
    }
    #[test]
    fn edit_distance() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("tick", "tick"), 0);
    }
}
