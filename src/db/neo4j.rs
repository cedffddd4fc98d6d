//! Neo4j backend over Bolt.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use neo4rs::{query, BoltNull, BoltType, ConfigBuilder, Graph, Node, Query, Row};
use serde::Deserialize;

use super::models::{CommandWithMetadata, NewCommandRecord};
use super::query::{CypherQuery, ParamValue, SearchPlan};
use super::store::{CommandStore, SchemaStatement};
use crate::config::Neo4jSettings;
use crate::error::{Error, Result};

const SCHEMA: &[SchemaStatement] = &[
    SchemaStatement {
        name: "command_id_unique",
        text: "CREATE CONSTRAINT command_id_unique IF NOT EXISTS \
               FOR (c:Command) REQUIRE c.id IS UNIQUE",
        required: true,
    },
    SchemaStatement {
        name: "command_text_index",
        text: "CREATE INDEX command_text_index IF NOT EXISTS \
               FOR (c:Command) ON (c.command, c.description)",
        required: true,
    },
    // Not every edition supports full-text indexes
    SchemaStatement {
        name: "command_fulltext",
        text: "CREATE FULLTEXT INDEX command_fulltext IF NOT EXISTS \
               FOR (c:Command) ON EACH [c.command, c.description, c.context]",
        required: false,
    },
];

const INSERT_COMMAND: &str = r#"
CREATE (c:Command {
    id: $id,
    command: $command,
    description: $description,
    os: $os,
    project_type: $project_type,
    context: $context,
    category: $category,
    created_at: datetime($created_at),
    last_used: NULL,
    use_count: 0
})
WITH c
UNWIND $tags AS tag_name
MERGE (t:Tag {name: tag_name})
MERGE (c)-[:TAGGED_WITH]->(t)
"#;

const TOUCH_COMMAND: &str = r#"
MATCH (c:Command {id: $id})
SET c.use_count = c.use_count + 1,
    c.last_used = datetime($now)
WITH c
OPTIONAL MATCH (c)-[:TAGGED_WITH]->(t:Tag)
WITH c, collect(t.name) AS tags
RETURN c, tags
"#;

const DELETE_COMMAND: &str = r#"
MATCH (c:Command {id: $id})
DETACH DELETE c
RETURN count(c) AS deleted
"#;

/// Graph store on a Neo4j database. The driver pools connections; each
/// operation borrows one for the duration of its statement.
pub struct Neo4jStore {
    graph: Graph,
}

impl Neo4jStore {
    pub async fn connect(settings: &Neo4jSettings) -> Result<Self> {
        let config = ConfigBuilder::default()
            .uri(settings.uri.as_str())
            .user(settings.user.as_str())
            .password(settings.password.as_str())
            .db(settings.database.as_str())
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        let graph = Graph::connect(config)
            .await
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?;

        tracing::debug!(uri = %settings.uri, database = %settings.database, "connected to neo4j");
        Ok(Self { graph })
    }

    async fn fetch(&self, q: Query) -> Result<Vec<Row>> {
        let mut result = self.graph.execute(q).await?;
        let mut rows = Vec::new();
        while let Some(row) = result.next().await? {
            rows.push(row);
        }
        Ok(rows)
    }
}

#[async_trait]
impl CommandStore for Neo4jStore {
    async fn initialize(&self) -> Result<()> {
        for statement in SCHEMA {
            if let Err(e) = self.graph.run(query(statement.text)).await {
                statement.on_failure(e.into())?;
            }
        }
        Ok(())
    }

    async fn insert(&self, record: &NewCommandRecord) -> Result<()> {
        let q = query(INSERT_COMMAND)
            .param("id", record.id.clone())
            .param("command", record.command.clone())
            .param("description", record.description.clone())
            .param("os", optional(&record.os))
            .param("project_type", optional(&record.project_type))
            .param("context", optional(&record.context))
            .param("category", optional(&record.category))
            .param("created_at", record.created_at.to_rfc3339())
            .param("tags", record.tags.clone());

        self.graph.run(q).await?;
        Ok(())
    }

    async fn search(&self, plan: &SearchPlan) -> Result<Vec<CommandWithMetadata>> {
        let cypher = plan.cypher();
        tracing::debug!(query = %cypher.text, "neo4j search");

        self.fetch(bind(&cypher))
            .await?
            .iter()
            .map(command_from_row)
            .collect()
    }

    async fn touch(
        &self,
        id: &str,
        now: DateTime<FixedOffset>,
    ) -> Result<Option<CommandWithMetadata>> {
        let q = query(TOUCH_COMMAND)
            .param("id", id.to_string())
            .param("now", now.to_rfc3339());

        match self.fetch(q).await?.first() {
            Some(row) => command_from_row(row).map(Some),
            None => Ok(None),
        }
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let q = query(DELETE_COMMAND).param("id", id.to_string());
        let deleted = match self.fetch(q).await?.first() {
            Some(row) => row.get::<i64>("deleted")?,
            None => 0,
        };
        Ok(deleted > 0)
    }

    async fn tags(&self) -> Result<Vec<String>> {
        let q = query("MATCH (t:Tag) RETURN t.name AS tag ORDER BY tag");
        self.fetch(q)
            .await?
            .iter()
            .map(|row| row.get::<String>("tag").map_err(Error::from))
            .collect()
    }

    async fn categories(&self) -> Result<Vec<String>> {
        let q = query(
            "MATCH (c:Command) WHERE c.category IS NOT NULL \
             RETURN DISTINCT c.category AS category ORDER BY category",
        );
        self.fetch(q)
            .await?
            .iter()
            .map(|row| row.get::<String>("category").map_err(Error::from))
            .collect()
    }
}

/// Turns a rendered query into a driver query with its parameters bound.
fn bind(cypher: &CypherQuery) -> Query {
    cypher
        .params
        .iter()
        .fold(query(&cypher.text), |q, (name, value)| match value {
            ParamValue::Text(text) => q.param(name, text.clone()),
            ParamValue::List(items) => q.param(name, items.clone()),
            ParamValue::Int(n) => q.param(name, *n),
        })
}

fn optional(value: &Option<String>) -> BoltType {
    match value {
        Some(v) => BoltType::from(v.clone()),
        None => BoltType::Null(BoltNull),
    }
}

fn command_from_row(row: &Row) -> Result<CommandWithMetadata> {
    let node: Node = row.get("c")?;
    let mut tags: Vec<String> = row.get("tags")?;
    tags.sort();

    Ok(CommandWithMetadata {
        id: node.get("id")?,
        command: node.get("command")?,
        description: node.get("description")?,
        os: property(&node, "os")?,
        project_type: property(&node, "project_type")?,
        context: property(&node, "context")?,
        category: property(&node, "category")?,
        tags,
        created_at: native_datetime(&node, "created_at")?
            .ok_or_else(|| Error::Conversion("command without created_at".to_string()))?,
        last_used: native_datetime(&node, "last_used")?,
        use_count: property(&node, "use_count")?.unwrap_or(0),
    })
}

/// A property that may be unset. Neo4j drops null properties, so a missing
/// key is `None`; a value of the wrong type is an error.
fn property<'a, T>(node: &'a Node, key: &str) -> Result<Option<T>>
where
    T: Deserialize<'a>,
{
    if !node.keys().iter().any(|k| *k == key) {
        return Ok(None);
    }
    node.get(key)
        .map(Some)
        .map_err(|e| Error::Conversion(format!("property `{}`: {}", key, e)))
}

/// The one place Bolt datetimes become chrono values.
fn native_datetime(node: &Node, key: &str) -> Result<Option<DateTime<FixedOffset>>> {
    property(node, key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use neo4rs::{BoltInteger, BoltList, BoltMap, BoltNode, BoltString};

    fn node(properties: &[(&str, BoltType)]) -> Node {
        let mut map = BoltMap::new();
        for (key, value) in properties {
            map.put(BoltString::from(*key), value.clone());
        }
        Node::new(BoltNode::new(BoltInteger::new(1), BoltList::new(), map))
    }

    #[test]
    fn test_missing_property_is_none() {
        let n = node(&[("os", BoltType::from("linux"))]);
        assert_eq!(property::<String>(&n, "os").unwrap().as_deref(), Some("linux"));
        assert_eq!(property::<String>(&n, "category").unwrap(), None);
        assert!(native_datetime(&n, "last_used").unwrap().is_none());
    }

    #[test]
    fn test_wrong_typed_property_is_conversion_error() {
        let n = node(&[
            ("os", BoltType::from(42_i64)),
            ("last_used", BoltType::from("yesterday")),
        ]);
        assert!(matches!(property::<String>(&n, "os"), Err(Error::Conversion(_))));
        assert!(matches!(native_datetime(&n, "last_used"), Err(Error::Conversion(_))));
    }

    #[test]
    fn test_native_datetime_keeps_offset() {
        let stamp = DateTime::parse_from_rfc3339("2024-01-01T12:00:00+02:00").unwrap();
        let n = node(&[("created_at", BoltType::from(stamp))]);
        assert_eq!(native_datetime(&n, "created_at").unwrap(), Some(stamp));
    }
}
