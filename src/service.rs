use std::convert::TryFrom;
use std::sync::Arc;

use log::debug;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde_derive::Serialize;

use crate::cache::{RawMappingSupplier, TableCache};
use crate::config::SearchConfig;
use crate::entry::MappingEntry;
use crate::error::{InvalidArgument, SearchError};
use crate::search::{MatchKind, SearchEngine, SearchHit, SearchQuery, SearchResult};
use crate::table::MappingTable;
use crate::{MinecraftVersion, Namespace};

/// Searches the mappings of any namespace and version,
/// loading them from the supplier the first time they're needed.
pub struct MappingService<S: RawMappingSupplier> {
    cache: TableCache,
    supplier: S,
    engine: SearchEngine
}
impl<S: RawMappingSupplier> MappingService<S> {
    pub fn new(supplier: S, config: SearchConfig) -> MappingService<S> {
        MappingService {
            cache: TableCache::with_capacity(config.cache_capacity),
            supplier,
            engine: SearchEngine::new(config)
        }
    }
    #[inline]
    pub fn cache(&self) -> &TableCache {
        &self.cache
    }
    #[inline]
    pub fn engine(&self) -> &SearchEngine {
        &self.engine
    }
    #[inline]
    pub fn config(&self) -> &SearchConfig {
        self.engine.config()
    }
    /// Search the mappings for the text, returning at most `limit` results.
    ///
    /// The arguments are checked before anything is fetched,
    /// so invalid queries fail the same way whether or not the mappings exist.
    pub fn search(
        &self,
        namespace: Namespace,
        version: &MinecraftVersion,
        text: &str,
        limit: i64
    ) -> Result<SearchResponse, SearchError> {
        let limit = usize::try_from(limit).map_err(|_| InvalidArgument(format!(
            "The limit must not be negative: {}", limit
        )))?;
        let text = self.engine.validate(text, limit)?;
        let table = self.cache.get_or_build(namespace, version, &self.supplier)?;
        let query = SearchQuery::new(namespace, version.clone(), text, limit);
        let result = self.engine.search(&table, &query)?;
        debug!("Found {} results for {:?} in {} {}", result.len(), text, namespace, version);
        Ok(SearchResponse { table, result, query })
    }
    /// Search using the configured default limit
    #[inline]
    pub fn search_default(
        &self,
        namespace: Namespace,
        version: &MinecraftVersion,
        text: &str
    ) -> Result<SearchResponse, SearchError> {
        let limit = self.config().default_limit as i64;
        self.search(namespace, version, text, limit)
    }
}

/// The ranked results of a search, along with the table they refer to
#[derive(Clone, Debug)]
pub struct SearchResponse {
    table: Arc<MappingTable>,
    result: SearchResult,
    query: SearchQuery
}
impl SearchResponse {
    #[inline]
    pub fn table(&self) -> &Arc<MappingTable> {
        &self.table
    }
    #[inline]
    pub fn result(&self) -> &SearchResult {
        &self.result
    }
    #[inline]
    pub fn query(&self) -> &SearchQuery {
        &self.query
    }
    #[inline]
    pub fn len(&self) -> usize {
        self.result.len()
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.result.is_empty()
    }
    /// Whether the results came from the fuzzy phase
    #[inline]
    pub fn is_fuzzy(&self) -> bool {
        self.result.match_kind() == Some(MatchKind::Fuzzy)
    }
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item=(&MappingEntry, &SearchHit)> + '_ {
        self.result.entries(&self.table)
    }
}

#[derive(Serialize)]
struct ResponseEntry<'a> {
    #[serde(flatten)]
    entry: &'a MappingEntry,
    match_kind: MatchKind,
    score: f32
}

impl Serialize for SearchResponse {
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        let results: Vec<ResponseEntry> = self.iter()
            .map(|(entry, hit)| ResponseEntry { entry, match_kind: hit.match_kind, score: hit.score })
            .collect();
        let mut state = serializer.serialize_struct("SearchResponse", 6)?;
        state.serialize_field("query", &self.query.text)?;
        state.serialize_field("namespace", &self.query.namespace)?;
        state.serialize_field("version", &self.query.version)?;
        state.serialize_field("fuzzy", &self.is_fuzzy())?;
        state.serialize_field("total", &results.len())?;
        state.serialize_field("results", &results)?;
        state.end()
    }
}
