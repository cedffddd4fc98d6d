//! The public entry point: one façade over whichever store is configured.

use uuid::Uuid;

use crate::config::{Backend, Settings};
use crate::db::fuzzy;
use crate::db::models::{Command, CommandWithMetadata, NewCommandRecord};
use crate::db::query::{QueryBuilder, SearchRequest, DEFAULT_FUZZY_THRESHOLD, DEFAULT_LIMIT};
use crate::db::redact::redact_secrets;
use crate::db::{CommandStore, Neo4jStore, SqliteStore};
use crate::error::{Error, Result};
use crate::utils::time;

/// Behaviour switches for a [`MemoryBox`]. Redaction and fuzzy search are
/// independent of each other.
#[derive(Debug, Clone)]
pub struct MemoryBoxOptions {
    pub redact_secrets: bool,
    /// Limit used by callers that leave it unset
    pub default_limit: usize,
    pub fuzzy_threshold: f64,
    pub fuzzy_candidate_pool: usize,
}

impl Default for MemoryBoxOptions {
    fn default() -> Self {
        Self {
            redact_secrets: true,
            default_limit: DEFAULT_LIMIT,
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            fuzzy_candidate_pool: 500,
        }
    }
}

impl From<&Settings> for MemoryBoxOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            redact_secrets: settings.search.redact_secrets,
            default_limit: settings.search.default_limit,
            fuzzy_threshold: settings.search.fuzzy_threshold,
            fuzzy_candidate_pool: settings.search.fuzzy_candidate_pool,
        }
    }
}

pub struct MemoryBox {
    store: Box<dyn CommandStore>,
    options: MemoryBoxOptions,
}

impl MemoryBox {
    /// Connects to the configured backend and prepares its schema.
    pub async fn connect(settings: &Settings) -> Result<Self> {
        let store: Box<dyn CommandStore> = match settings.backend {
            Backend::Neo4j => Box::new(Neo4jStore::connect(&settings.neo4j).await?),
            Backend::Sqlite => {
                let path = settings.sqlite.resolved_path();
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        Error::StoreUnavailable(format!("cannot create {}: {}", parent.display(), e))
                    })?;
                }
                Box::new(SqliteStore::new(path))
            }
        };
        Self::with_store(store, MemoryBoxOptions::from(settings)).await
    }

    /// Wraps an existing store and runs its idempotent schema setup.
    pub async fn with_store(
        store: Box<dyn CommandStore>,
        options: MemoryBoxOptions,
    ) -> Result<Self> {
        store.initialize().await?;
        Ok(Self { store, options })
    }

    pub fn options(&self) -> &MemoryBoxOptions {
        &self.options
    }

    /// Stores `command` and returns its new id.
    pub async fn add(&self, command: &Command) -> Result<String> {
        if command.command.trim().is_empty() {
            return Err(Error::Validation("command text cannot be empty".to_string()));
        }

        let text = if self.options.redact_secrets {
            redact_secrets(&command.command)
        } else {
            command.command.clone()
        };

        let record = NewCommandRecord {
            id: Uuid::new_v4().to_string(),
            command: text,
            description: command.description.clone(),
            os: command.os.clone(),
            project_type: command.project_type.clone(),
            context: command.context.clone(),
            category: command.category.clone(),
            tags: command.tag_set(),
            created_at: time::now(),
        };

        self.store.insert(&record).await?;
        tracing::info!(id = %record.id, tags = record.tags.len(), "command added");
        Ok(record.id)
    }

    /// Filtered search, optionally re-ranked by fuzzy similarity.
    ///
    /// In fuzzy mode the literal text filter is dropped and a wider candidate
    /// pool is fetched; the other filters still apply. Scoring then keeps at
    /// most `request.limit` results.
    pub async fn search(&self, request: &SearchRequest) -> Result<Vec<CommandWithMetadata>> {
        let threshold = request.fuzzy_threshold.unwrap_or(self.options.fuzzy_threshold);
        if request.limit == 0 {
            return Err(Error::Validation("limit must be greater than zero".to_string()));
        }
        if !(0.0..=100.0).contains(&threshold) {
            return Err(Error::Validation(format!(
                "fuzzy threshold must be between 0 and 100, got {}",
                threshold
            )));
        }

        let mut builder = QueryBuilder::from_request(request);
        let fuzzy_query = request.text().filter(|_| request.fuzzy);

        let Some(query) = fuzzy_query else {
            return self.store.search(&builder.build()).await;
        };

        let pool = request.limit.max(self.options.fuzzy_candidate_pool);
        let plan = builder.without_text().limit(pool).build();
        let candidates = self.store.search(&plan).await?;
        if candidates.is_empty() {
            return Ok(candidates);
        }
        Ok(fuzzy::rerank(query, candidates, threshold, request.limit))
    }

    /// Fetches a command and records the use. `None` if the id is unknown.
    pub async fn get(&self, id: &str) -> Result<Option<CommandWithMetadata>> {
        self.store.touch(id, time::now()).await
    }

    /// Removes a command and its tag links. `false` if the id is unknown.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let deleted = self.store.delete(id).await?;
        if deleted {
            tracing::info!(%id, "command deleted");
        }
        Ok(deleted)
    }

    pub async fn list_tags(&self) -> Result<Vec<String>> {
        self.store.tags().await
    }

    pub async fn list_categories(&self) -> Result<Vec<String>> {
        self.store.categories().await
    }

    /// Releases the store's connections.
    pub async fn close(self) -> Result<()> {
        self.store.close().await
    }
}
