//! Search Mojang and Yarn mappings for a minecraft version.
//!
//! Both formats are parsed into the same [`MappingTable`], which is cached per
//! namespace and version and searched in two phases: exact names first,
//! then fuzzy matching on name fragments.
extern crate indexmap;
extern crate failure;
extern crate failure_derive;
extern crate serde;
extern crate serde_derive;
extern crate serde_json;
extern crate itertools;
extern crate crossbeam;
extern crate parking_lot;
extern crate log;

mod version;
mod namespace;
mod utils;
pub mod error;
pub mod entry;
pub mod table;
pub mod format;
pub mod search;
pub mod config;
pub mod cache;
pub mod service;

pub use version::{MinecraftVersion, InvalidMinecraftVersion};
pub use namespace::{Namespace, InvalidNamespace};
pub use entry::{EntryKind, MappingEntry};
pub use table::MappingTable;
pub use format::MappingFormat;
pub use search::{MatchKind, SearchEngine, SearchQuery, SearchResult};
pub use config::SearchConfig;
pub use cache::{RawMappingSupplier, TableCache};
pub use service::{MappingService, SearchResponse};
pub use error::{InvalidArgument, ParseError, ParseErrorKind, FetchError, LoadError, SearchError};
