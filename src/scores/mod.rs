mod score_store;
mod store;

pub use score_store::ScoreStore;
pub use store::{JsonFileStore, KeyValueStore, MemoryStore, PersistenceError, default_data_dir};
