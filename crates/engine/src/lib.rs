// Folio engine: page storage, version history and tree maintenance.

pub mod config;
pub mod error;
pub mod history;
pub mod ids;
pub mod search;
pub mod service;
pub mod store;
pub mod tree;

pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use ids::{IdSource, SequentialIds, SnowflakeIds};
pub use search::SearchHit;
pub use service::{ContentService, EditOutcome};
pub use store::{MemoryStore, PageStore, SqliteStore};
pub use tree::{NewPage, PageTree};
