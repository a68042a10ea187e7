//! The unified symbol table both mapping formats are parsed into.
//!
//! A table is built exactly once by a [`TableBuilder`] and never modified afterwards,
//! so it can be shared between any number of concurrent searches.
use indexmap::IndexMap;
use indexmap::map::Entry;
use log::debug;

use crate::entry::{EntryKind, MappingEntry};

/// The position of an entry inside its table
pub type EntryIndex = u32;

type NameIndex = IndexMap<String, Vec<EntryIndex>>;

#[derive(Debug, Default, PartialEq)]
pub struct MappingTable {
    entries: Vec<MappingEntry>,
    /// Deobfuscated name (case sensitive) -> entries
    exact: NameIndex,
    obfuscated: NameIndex,
    intermediary: NameIndex,
    /// Class names without their package
    simple_names: NameIndex,
    /// Lowercased name fragments -> entries, used to find fuzzy candidates
    fragments: NameIndex,
}
impl MappingTable {
    #[inline]
    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }
    #[inline]
    pub fn get(&self, index: EntryIndex) -> Option<&MappingEntry> {
        self.entries.get(index as usize)
    }
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    pub fn count(&self, kind: EntryKind) -> usize {
        self.entries.iter().filter(|entry| entry.kind == kind).count()
    }
    #[inline]
    pub fn exact_matches(&self, deobfuscated: &str) -> &[EntryIndex] {
        lookup(&self.exact, deobfuscated)
    }
    #[inline]
    pub fn obfuscated_matches(&self, obfuscated: &str) -> &[EntryIndex] {
        lookup(&self.obfuscated, obfuscated)
    }
    #[inline]
    pub fn intermediary_matches(&self, intermediary: &str) -> &[EntryIndex] {
        lookup(&self.intermediary, intermediary)
    }
    #[inline]
    pub fn simple_name_matches(&self, simple_name: &str) -> &[EntryIndex] {
        lookup(&self.simple_names, simple_name)
    }
    /// All the fragments in the order they were first seen
    #[inline]
    pub fn fragments(&self) -> impl Iterator<Item=(&str, &[EntryIndex])> + '_ {
        self.fragments.iter().map(|(key, indexes)| (key.as_str(), indexes.as_slice()))
    }
    #[inline]
    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }
}
#[inline]
fn lookup<'a>(index: &'a NameIndex, key: &str) -> &'a [EntryIndex] {
    index.get(key).map_or(&[], Vec::as_slice)
}
fn push_index(index: &mut NameIndex, key: &str, value: EntryIndex) {
    if let Some(values) = index.get_mut(key) {
        values.push(value);
    } else {
        index.insert(key.to_owned(), vec![value]);
    }
}

/// Identifies logically identical entries
#[derive(Debug, Eq, PartialEq, Hash)]
struct EntryIdentity {
    kind: EntryKind,
    owner: String,
    obfuscated: String,
    descriptor: Option<String>,
}
impl<'a> From<&'a MappingEntry> for EntryIdentity {
    #[inline]
    fn from(entry: &'a MappingEntry) -> Self {
        EntryIdentity {
            kind: entry.kind,
            owner: entry.owner.clone(),
            obfuscated: entry.obfuscated.clone(),
            descriptor: entry.descriptor.clone()
        }
    }
}

/// Collects entries from a parser, keeping only the first of any duplicates
#[derive(Debug, Default)]
pub struct TableBuilder {
    entries: IndexMap<EntryIdentity, MappingEntry>,
    duplicates: usize,
}
impl TableBuilder {
    #[inline]
    pub fn new() -> TableBuilder {
        TableBuilder::default()
    }
    /// Add the entry unless an identical one is already present,
    /// returning whether it was added.
    pub fn push(&mut self, entry: MappingEntry) -> bool {
        match self.entries.entry(EntryIdentity::from(&entry)) {
            Entry::Occupied(_) => {
                self.duplicates += 1;
                false
            },
            Entry::Vacant(vacant) => {
                vacant.insert(entry);
                true
            }
        }
    }
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    pub fn build(self) -> MappingTable {
        let duplicates = self.duplicates;
        let entries: Vec<MappingEntry> = self.entries.into_values().collect();
        let mut table = MappingTable::default();
        for (index, entry) in entries.iter().enumerate() {
            let index = index as EntryIndex;
            push_index(&mut table.exact, &entry.deobfuscated, index);
            if !entry.obfuscated.is_empty() {
                push_index(&mut table.obfuscated, &entry.obfuscated, index);
            }
            if let Some(ref intermediary) = entry.intermediary {
                push_index(&mut table.intermediary, intermediary, index);
            }
            let simple_name = entry.simple_name();
            if entry.kind == EntryKind::Class && simple_name != entry.deobfuscated {
                push_index(&mut table.simple_names, simple_name, index);
            }
            for fragment in name_fragments(simple_name) {
                push_index(&mut table.fragments, &fragment, index);
            }
        }
        table.entries = entries;
        debug!(
            "Built table with {} entries ({} duplicates dropped) and {} fragments",
            table.len(), duplicates, table.fragment_count()
        );
        table
    }
}
impl Extend<MappingEntry> for TableBuilder {
    fn extend<T: IntoIterator<Item=MappingEntry>>(&mut self, iter: T) {
        for entry in iter {
            self.push(entry);
        }
    }
}

/// Split a name into lowercase search fragments.
///
/// Names are split on anything that isn't alphanumeric and on case boundaries,
/// so `getBlockState` gives `get`, `block` and `state`, and `HTTPServer` gives
/// `http` and `server`. Single character pieces are dropped,
/// but the whole (lowercased) name is always included.
pub fn name_fragments(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut fragments: Vec<String> = Vec::new();
    let mut current = String::new();
    fn finish(current: &mut String, fragments: &mut Vec<String>) {
        if current.chars().count() >= 2 && !fragments.contains(current) {
            fragments.push(current.clone());
        }
        current.clear();
    }
    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            finish(&mut current, &mut fragments);
            continue;
        }
        if let Some(&prev) = i.checked_sub(1).and_then(|p| chars.get(p)) {
            let next = chars.get(i + 1).cloned();
            let boundary = (prev.is_lowercase() && c.is_uppercase())
                || (prev.is_alphabetic() && c.is_numeric())
                || (prev.is_numeric() && c.is_alphabetic())
                // The last capital of an acronym starts a new word (HTTPServer)
                || (prev.is_uppercase() && c.is_uppercase() && next.map_or(false, char::is_lowercase));
            if boundary {
                finish(&mut current, &mut fragments);
            }
        }
        current.extend(c.to_lowercase());
    }
    finish(&mut current, &mut fragments);
    let whole = name.to_lowercase();
    if !whole.is_empty() && !fragments.contains(&whole) {
        fragments.push(whole);
    }
    fragments
}
