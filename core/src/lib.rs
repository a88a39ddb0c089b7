//! Reading aid for Russian text: wrap Cyrillic words in lookup markers and fetch, trim and cache
//! their dictionary entries.

pub mod augment;
pub mod cache;
pub mod collapse;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod html;
pub mod persist;
pub mod pipeline;
pub mod record;
pub mod source;
pub mod store;
pub mod throttle;
pub mod tokenizer;

pub use augment::Augmented;
pub use cache::DefinitionCache;
pub use config::{Backend, DataPaths, FetchConfig, StoreConfig};
pub use error::{FetchError, RetrievalError, SnapshotError, StoreError};
pub use fetcher::{Definition, DefinitionFetcher, Fetched};
pub use pipeline::{ContentPipeline, Processed, Rewritten, WordOccurrences};
pub use record::{DefinitionState, WordRecord};
pub use source::{PageSource, WiktionarySource};
