pub mod fuzzy;
pub mod models;
pub mod neo4j;
pub mod query;
pub mod redact;
pub mod sqlite;
pub mod store;

pub use models::{Command, CommandWithMetadata};
pub use neo4j::Neo4jStore;
pub use query::{QueryBuilder, SearchRequest};
pub use redact::redact_secrets;
pub use sqlite::SqliteStore;
pub use store::CommandStore;
