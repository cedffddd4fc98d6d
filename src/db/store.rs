use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};

use super::models::{CommandWithMetadata, NewCommandRecord};
use super::query::SearchPlan;
use crate::error::{Error, Result};

/// A schema statement run at start-up. Statements that are not `required`
/// may fail (for example on a store edition without full-text indexes).
#[derive(Debug, Clone, Copy)]
pub struct SchemaStatement {
    pub name: &'static str,
    pub text: &'static str,
    pub required: bool,
}

impl SchemaStatement {
    /// What a failed statement means for start-up. Transport failures always
    /// propagate; otherwise a required statement is fatal and an optional one
    /// is logged and skipped.
    pub fn on_failure(&self, err: Error) -> Result<()> {
        match err {
            Error::StoreUnavailable(_) => Err(err),
            _ if self.required => Err(Error::SchemaSetup {
                statement: self.name.to_string(),
                reason: err.to_string(),
            }),
            _ => {
                tracing::warn!(
                    statement = self.name,
                    error = %err,
                    "optional schema statement skipped"
                );
                Ok(())
            }
        }
    }
}

/// Storage backend for commands and tags.
///
/// Implementations issue each operation as a single statement or
/// transaction on a session that is released before returning.
#[async_trait]
pub trait CommandStore: Send + Sync {
    /// Creates constraints and indexes. Safe to call repeatedly.
    async fn initialize(&self) -> Result<()>;

    /// Writes the command node, merges its tags and links them. Fails if the
    /// id already exists.
    async fn insert(&self, record: &NewCommandRecord) -> Result<()>;

    async fn search(&self, plan: &SearchPlan) -> Result<Vec<CommandWithMetadata>>;

    /// Increments `use_count` and sets `last_used` on the matching command,
    /// returning the updated record.
    async fn touch(&self, id: &str, now: DateTime<FixedOffset>)
        -> Result<Option<CommandWithMetadata>>;

    /// Detach-deletes the command. Tags are left in place.
    async fn delete(&self, id: &str) -> Result<bool>;

    async fn tags(&self) -> Result<Vec<String>>;

    async fn categories(&self) -> Result<Vec<String>>;

    /// Releases pooled connections.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIRED: SchemaStatement = SchemaStatement {
        name: "required",
        text: "",
        required: true,
    };
    const OPTIONAL: SchemaStatement = SchemaStatement {
        name: "optional",
        text: "",
        required: false,
    };

    #[test]
    fn test_optional_failure_is_skipped() {
        assert!(OPTIONAL.on_failure(Error::Store("no such module".into())).is_ok());
    }

    #[test]
    fn test_required_failure_is_schema_setup() {
        let err = REQUIRED.on_failure(Error::Store("denied".into())).unwrap_err();
        match err {
            Error::SchemaSetup { statement, reason } => {
                assert_eq!(statement, "required");
                assert!(reason.contains("denied"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unavailable_store_propagates_unchanged() {
        for statement in [REQUIRED, OPTIONAL] {
            let err = statement
                .on_failure(Error::StoreUnavailable("connection refused".into()))
                .unwrap_err();
            assert!(matches!(err, Error::StoreUnavailable(_)));
        }
    }
}
