use std::env;
use std::fs;

use anyhow::Result;
use memory_box::config::{Backend, Settings, SqliteSettings};
use memory_box::{Error, MemoryBox};
use serial_test::serial;

const OVERRIDES: &[&str] = &[
    "NEO4J_URI",
    "NEO4J_USER",
    "NEO4J_PASSWORD",
    "NEO4J_DATABASE",
    "MEMORY_BOX_BACKEND",
    "MEMORY_BOX_SQLITE_PATH",
];

fn clear_overrides() {
    for key in OVERRIDES {
        env::remove_var(key);
    }
}

#[test]
#[serial]
fn test_load_explicit_file() -> Result<()> {
    clear_overrides();
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
        backend = "sqlite"

        [sqlite]
        path = "/var/lib/memory-box/box.db"

        [search]
        default_limit = 25
        redact_secrets = false
        "#,
    )?;

    let settings = Settings::load(Some(&path))?;
    assert_eq!(settings.backend, Backend::Sqlite);
    assert_eq!(
        settings.sqlite.resolved_path(),
        std::path::PathBuf::from("/var/lib/memory-box/box.db")
    );
    assert_eq!(settings.search.default_limit, 25);
    assert!(!settings.search.redact_secrets);
    assert_eq!(settings.search.fuzzy_threshold, 60.0);
    Ok(())
}

#[test]
#[serial]
fn test_missing_explicit_file_is_an_error() {
    clear_overrides();
    let err = Settings::load(Some(std::path::Path::new("/nonexistent/memory-box.toml")))
        .unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
#[serial]
fn test_environment_wins_over_file() -> Result<()> {
    clear_overrides();
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("config.toml");
    fs::write(&path, "[neo4j]\nuri = \"bolt://from-file:7687\"\n")?;

    env::set_var("NEO4J_URI", "bolt://from-env:7687");
    env::set_var("NEO4J_PASSWORD", "s3cret");
    let settings = Settings::load(Some(&path));
    clear_overrides();

    let settings = settings?;
    assert_eq!(settings.neo4j.uri, "bolt://from-env:7687");
    assert_eq!(settings.neo4j.password, "s3cret");
    assert_eq!(settings.neo4j.user, "neo4j");
    Ok(())
}

#[test]
#[serial]
fn test_invalid_backend_in_environment() -> Result<()> {
    clear_overrides();
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("config.toml");
    fs::write(&path, "")?;

    env::set_var("MEMORY_BOX_BACKEND", "mongodb");
    let result = Settings::load(Some(&path));
    clear_overrides();

    assert!(result.is_err());
    Ok(())
}

#[tokio::test]
#[serial]
async fn test_connect_sqlite_from_settings() -> Result<()> {
    clear_overrides();
    let dir = tempfile::tempdir()?;
    let db_path = dir.path().join("nested").join("box.db");

    let settings = Settings {
        backend: Backend::Sqlite,
        sqlite: SqliteSettings {
            path: Some(db_path.clone()),
        },
        ..Settings::default()
    };

    let vault = MemoryBox::connect(&settings).await?;
    assert!(db_path.exists());
    assert!(vault.list_tags().await?.is_empty());
    vault.close().await?;
    Ok(())
}
