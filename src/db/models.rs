use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// A command as supplied by the caller, before it is stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub command: String,
    pub description: String,
    pub os: Option<String>,
    pub project_type: Option<String>,
    pub context: Option<String>,
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Vec<String>,
}

impl Command {
    pub fn new(command: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_os(mut self, os: impl Into<String>) -> Self {
        self.os = Some(os.into());
        self
    }

    pub fn with_project_type(mut self, project_type: impl Into<String>) -> Self {
        self.project_type = Some(project_type.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Tags with blanks removed, sorted and deduplicated.
    pub fn tag_set(&self) -> Vec<String> {
        normalize_tags(self.tags.iter().map(String::as_str))
    }
}

/// A stored command together with the fields the store derives for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandWithMetadata {
    pub id: String,
    pub command: String,
    pub description: String,
    pub os: Option<String>,
    pub project_type: Option<String>,
    pub context: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<FixedOffset>,
    pub last_used: Option<DateTime<FixedOffset>>,
    pub use_count: i64,
}

/// Fully prepared row handed to a store on insert: already redacted, with
/// id and creation time assigned.
#[derive(Debug, Clone)]
pub struct NewCommandRecord {
    pub id: String,
    pub command: String,
    pub description: String,
    pub os: Option<String>,
    pub project_type: Option<String>,
    pub context: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<FixedOffset>,
}

pub(crate) fn normalize_tags<'a>(tags: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut tags: Vec<String> = tags
        .into_iter()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    tags.sort();
    tags.dedup();
    tags
}
