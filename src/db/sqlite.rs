use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row, TransactionBehavior};

use super::models::{CommandWithMetadata, NewCommandRecord};
use super::query::{Predicate, SearchPlan};
use super::store::{CommandStore, SchemaStatement};
use crate::error::{Error, Result};
use crate::utils::time::parse_datetime;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &[SchemaStatement] = &[
    SchemaStatement {
        name: "commands",
        text: "CREATE TABLE IF NOT EXISTS commands (
                id TEXT PRIMARY KEY,
                command TEXT NOT NULL,
                description TEXT NOT NULL,
                os TEXT,
                project_type TEXT,
                context TEXT,
                category TEXT,
                created_at TEXT NOT NULL,
                created_at_us INTEGER NOT NULL,
                last_used TEXT,
                use_count INTEGER NOT NULL DEFAULT 0
            )",
        required: true,
    },
    SchemaStatement {
        name: "tags",
        text: "CREATE TABLE IF NOT EXISTS tags (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE
            )",
        required: true,
    },
    SchemaStatement {
        name: "command_tags",
        text: "CREATE TABLE IF NOT EXISTS command_tags (
                command_id TEXT NOT NULL,
                tag_id INTEGER NOT NULL,
                PRIMARY KEY (command_id, tag_id),
                FOREIGN KEY (command_id) REFERENCES commands(id) ON DELETE CASCADE,
                FOREIGN KEY (tag_id) REFERENCES tags(id)
            )",
        required: true,
    },
    SchemaStatement {
        name: "idx_commands_text",
        text: "CREATE INDEX IF NOT EXISTS idx_commands_text ON commands(command, description)",
        required: true,
    },
    SchemaStatement {
        name: "commands_fts",
        text: "CREATE VIRTUAL TABLE IF NOT EXISTS commands_fts USING fts5(
                command, description, context, content='commands', content_rowid='rowid'
            );
            CREATE TRIGGER IF NOT EXISTS commands_fts_insert AFTER INSERT ON commands BEGIN
                INSERT INTO commands_fts(rowid, command, description, context)
                VALUES (new.rowid, new.command, new.description, new.context);
            END;
            CREATE TRIGGER IF NOT EXISTS commands_fts_delete AFTER DELETE ON commands BEGIN
                INSERT INTO commands_fts(commands_fts, rowid, command, description, context)
                VALUES ('delete', old.rowid, old.command, old.description, old.context);
            END;",
        required: false,
    },
];

const COMMAND_COLUMNS: &str = "c.id, c.command, c.description, c.os, c.project_type, \
     c.context, c.category, c.created_at, c.last_used, c.use_count";

/// Embedded store on a single SQLite file.
///
/// Commands, tags and the tagged-with edges map onto three tables. Every
/// operation opens its own connection on the blocking pool and drops it
/// when done.
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn session<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = Connection::open(&path)?;
            conn.busy_timeout(BUSY_TIMEOUT)?;
            conn.pragma_update(None, "foreign_keys", "ON")?;
            f(&mut conn)
        })
        .await
        .map_err(|e| Error::Store(format!("sqlite session aborted: {}", e)))?
    }
}

#[async_trait]
impl CommandStore for SqliteStore {
    async fn initialize(&self) -> Result<()> {
        self.session(|conn| run_schema(conn, SCHEMA)).await
    }

    async fn insert(&self, record: &NewCommandRecord) -> Result<()> {
        let record = record.clone();
        self.session(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            tx.execute(
                "INSERT INTO commands (id, command, description, os, project_type, context,
                                       category, created_at, created_at_us, last_used, use_count)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, NULL, 0)",
                (
                    &record.id,
                    &record.command,
                    &record.description,
                    &record.os,
                    &record.project_type,
                    &record.context,
                    &record.category,
                    &record.created_at.to_rfc3339(),
                    record.created_at.timestamp_micros(),
                ),
            )?;

            for tag in &record.tags {
                // Insert or get tag
                tx.execute("INSERT OR IGNORE INTO tags (name) VALUES (?1)", [tag])?;

                let tag_id: i64 =
                    tx.query_row("SELECT id FROM tags WHERE name = ?1", [tag], |row| {
                        row.get(0)
                    })?;

                // Link command to tag
                tx.execute(
                    "INSERT OR IGNORE INTO command_tags (command_id, tag_id) VALUES (?1, ?2)",
                    rusqlite::params![record.id, tag_id],
                )?;
            }

            tx.commit()?;
            Ok(())
        })
        .await
    }

    async fn search(&self, plan: &SearchPlan) -> Result<Vec<CommandWithMetadata>> {
        let (sql, values) = render_sql(plan);
        tracing::debug!(%sql, "sqlite search");

        self.session(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query(params_from_iter(values.iter()))?;
            let mut commands = Vec::new();
            while let Some(row) = rows.next()? {
                commands.push(command_from_row(row)?);
            }
            drop(rows);

            for command in &mut commands {
                command.tags = command_tags(conn, &command.id)?;
            }
            Ok(commands)
        })
        .await
    }

    async fn touch(
        &self,
        id: &str,
        now: DateTime<FixedOffset>,
    ) -> Result<Option<CommandWithMetadata>> {
        let id = id.to_string();
        self.session(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let updated = tx.execute(
                "UPDATE commands SET use_count = use_count + 1, last_used = ?2 WHERE id = ?1",
                (&id, now.to_rfc3339()),
            )?;
            if updated == 0 {
                return Ok(None);
            }

            let mut command = {
                let mut stmt = tx.prepare(&format!(
                    "SELECT {} FROM commands c WHERE c.id = ?1",
                    COMMAND_COLUMNS
                ))?;
                let mut rows = stmt.query([&id])?;
                let Some(row) = rows.next()? else {
                    return Ok(None);
                };
                command_from_row(row)?
            };
            command.tags = command_tags(&tx, &id)?;

            tx.commit()?;
            Ok(Some(command))
        })
        .await
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        self.session(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            tx.execute("DELETE FROM command_tags WHERE command_id = ?1", [&id])?;
            let rows_affected = tx.execute("DELETE FROM commands WHERE id = ?1", [&id])?;
            tx.commit()?;
            Ok(rows_affected > 0)
        })
        .await
    }

    async fn tags(&self) -> Result<Vec<String>> {
        self.session(|conn| {
            let mut stmt = conn.prepare("SELECT name FROM tags ORDER BY name")?;
            let tags = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(tags)
        })
        .await
    }

    async fn categories(&self) -> Result<Vec<String>> {
        self.session(|conn| {
            let mut stmt = conn.prepare(
                "SELECT DISTINCT category FROM commands
                 WHERE category IS NOT NULL
                 ORDER BY category",
            )?;
            let categories = stmt
                .query_map([], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(categories)
        })
        .await
    }
}

fn run_schema(conn: &Connection, statements: &[SchemaStatement]) -> Result<()> {
    for statement in statements {
        if let Err(e) = conn.execute_batch(statement.text) {
            statement.on_failure(e.into())?;
        }
    }
    Ok(())
}

/// Renders a plan as one SELECT with positional parameters.
pub fn render_sql(plan: &SearchPlan) -> (String, Vec<Value>) {
    let mut conditions = Vec::new();
    let mut values = Vec::new();

    if let Some(tags) = plan.tags() {
        let placeholders = vec!["?"; tags.len()].join(", ");
        conditions.push(format!(
            "c.id IN (SELECT ct.command_id FROM command_tags ct
                      JOIN tags t ON t.id = ct.tag_id
                      WHERE t.name IN ({})
                      GROUP BY ct.command_id
                      HAVING COUNT(*) = ?)",
            placeholders
        ));
        values.extend(tags.iter().cloned().map(Value::Text));
        values.push(Value::Integer(tags.len() as i64));
    }

    for predicate in plan.node_predicates() {
        match predicate {
            // instr() is literal and case-sensitive, unlike LIKE
            Predicate::TextContains(query) => {
                conditions.push(
                    "(instr(c.command, ?) > 0 OR instr(c.description, ?) > 0 \
                     OR instr(c.context, ?) > 0)"
                        .to_string(),
                );
                for _ in 0..3 {
                    values.push(Value::Text(query.clone()));
                }
            }
            Predicate::FieldEquals(field, value) => {
                conditions.push(format!("c.{} = ?", field.name()));
                values.push(Value::Text(value.clone()));
            }
            Predicate::HasAllTags(_) => {}
        }
    }

    let mut sql = format!("SELECT {} FROM commands c", COMMAND_COLUMNS);
    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }
    sql.push_str(" ORDER BY c.use_count DESC, c.created_at_us DESC, c.rowid DESC LIMIT ?");
    values.push(Value::Integer(plan.limit as i64));

    (sql, values)
}

fn command_tags(conn: &Connection, command_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT t.name
         FROM tags t
         JOIN command_tags ct ON ct.tag_id = t.id
         WHERE ct.command_id = ?1
         ORDER BY t.name",
    )?;

    let tags = stmt
        .query_map([command_id], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(tags)
}

fn command_from_row(row: &Row<'_>) -> Result<CommandWithMetadata> {
    Ok(CommandWithMetadata {
        id: row.get(0)?,
        command: row.get(1)?,
        description: row.get(2)?,
        os: row.get(3)?,
        project_type: row.get(4)?,
        context: row.get(5)?,
        category: row.get(6)?,
        tags: Vec::new(),
        created_at: stored_datetime(Some(row.get(7)?))?
            .ok_or_else(|| Error::Conversion("command without created_at".to_string()))?,
        last_used: stored_datetime(row.get(8)?)?,
        use_count: row.get(9)?,
    })
}

/// The one place SQLite timestamps become chrono values.
fn stored_datetime(value: Option<String>) -> Result<Option<DateTime<FixedOffset>>> {
    match value {
        None => Ok(None),
        Some(text) => parse_datetime(&text)
            .map(Some)
            .ok_or_else(|| Error::Conversion(format!("invalid timestamp '{}'", text))),
    }
}
