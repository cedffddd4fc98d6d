pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod utils;
pub mod version;

pub use api::{MemoryBox, MemoryBoxOptions};
pub use db::{Command, CommandWithMetadata, SearchRequest};
pub use error::{Error, Result};
pub use version::VERSION;
