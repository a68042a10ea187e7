use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use failure::Error;
use failure_derive::Fail;
use serde_derive::{Serialize, Deserialize};

/// No search may ever return more results than this
pub const HARD_LIMIT: usize = 100;

/// Tunables for searching and caching, usually loaded from a JSON file.
///
/// Any missing fields take their default values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    /// The limit used when the caller doesn't give one
    pub default_limit: usize,
    /// The largest limit a caller may ask for, never more than [`HARD_LIMIT`]
    pub max_limit: usize,
    /// The most candidates the fuzzy phase will score for a single query
    pub fuzzy_candidate_cap: usize,
    /// Fuzzy matches scoring below this are dropped
    pub min_fuzzy_score: f32,
    /// The maximum number of cached tables, or zero for no limit
    pub cache_capacity: usize,
}
impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            default_limit: 10,
            max_limit: HARD_LIMIT,
            fuzzy_candidate_cap: 5000,
            min_fuzzy_score: 0.3,
            cache_capacity: 0
        }
    }
}
impl SearchConfig {
    pub fn from_reader<R: Read>(reader: R) -> Result<SearchConfig, Error> {
        let config: SearchConfig = ::serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }
    #[inline]
    pub fn load(path: &Path) -> Result<SearchConfig, Error> {
        SearchConfig::from_reader(BufReader::new(File::open(path)?))
    }
    pub fn validate(&self) -> Result<(), InvalidConfig> {
        if self.max_limit == 0 || self.max_limit > HARD_LIMIT {
            return Err(InvalidConfig(format!(
                "max_limit must be between 1 and {}, not {}", HARD_LIMIT, self.max_limit
            )))
        }
        if self.default_limit == 0 || self.default_limit > self.max_limit {
            return Err(InvalidConfig(format!(
                "default_limit must be between 1 and {}, not {}", self.max_limit, self.default_limit
            )))
        }
        if self.fuzzy_candidate_cap == 0 {
            return Err(InvalidConfig("fuzzy_candidate_cap must be positive".into()))
        }
        if !(0.0..=1.0).contains(&self.min_fuzzy_score) {
            return Err(InvalidConfig(format!(
                "min_fuzzy_score must be between 0 and 1, not {}", self.min_fuzzy_score
            )))
        }
        Ok(())
    }
}

#[derive(Debug, Fail)]
#[fail(display = "Invalid search config: {}", _0)]
pub struct InvalidConfig(String);

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn defaults() {
        let config = SearchConfig::default();
        assert_eq!(config.default_limit, 10);
        assert_eq!(config.max_limit, 100);
        assert_eq!(config.fuzzy_candidate_cap, 5000);
        assert!(config.validate().is_ok());
        assert_eq!(SearchConfig::from_reader(&b"{}"[..]).unwrap(), config);
    }
    #[test]
    fn partial_json() {
        let config = SearchConfig::from_reader(&br#"{"fuzzy_candidate_cap": 50, "cache_capacity": 4}"#[..]).unwrap();
        assert_eq!(config.fuzzy_candidate_cap, 50);
        assert_eq!(config.cache_capacity, 4);
        assert_eq!(config.default_limit, 10);
    }
    #[test]
    fn rejects_invalid() {
        for json in &[
            r#"{"max_limit": 101}"#,
            r#"{"max_limit": 0}"#,
            r#"{"default_limit": 20, "max_limit": 15}"#,
            r#"{"fuzzy_candidate_cap": 0}"#,
            r#"{"min_fuzzy_score": 1.5}"#,
            r#"{"unknown": true}"#,
        ] {
            assert!(SearchConfig::from_reader(json.as_bytes()).is_err(), "{}", json);
        }
    }
}
