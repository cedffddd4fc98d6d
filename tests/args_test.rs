use std::path::PathBuf;

use clap::Parser;
use memory_box::cli::{Cli, Commands};
use memory_box::config::Backend;

#[test]
fn test_parse_add() {
    let cli = Cli::parse_from([
        "memory-box", "add", "-d", "list files", "-t", "fs", "-t", "list", "--category", "files",
        "--", "ls", "-la",
    ]);
    match cli.command {
        Commands::Add {
            description,
            tags,
            command,
            category,
            os,
            ..
        } => {
            assert_eq!(description, "list files");
            assert_eq!(tags, vec!["fs", "list"]);
            assert_eq!(command, vec!["ls", "-la"]);
            assert_eq!(category.as_deref(), Some("files"));
            assert!(os.is_none());
        }
        _ => panic!("Expected Add command"),
    }
}

#[test]
fn test_parse_add_requires_description_and_command() {
    assert!(Cli::try_parse_from(["memory-box", "add", "--", "ls"]).is_err());
    assert!(Cli::try_parse_from(["memory-box", "add", "-d", "nothing"]).is_err());
}

#[test]
fn test_parse_search_defaults() {
    let cli = Cli::parse_from(["memory-box", "search"]);
    match cli.command {
        Commands::Search {
            query,
            tags,
            limit,
            fuzzy,
            threshold,
            json,
            ..
        } => {
            assert!(query.is_none());
            assert!(tags.is_empty());
            assert!(limit.is_none());
            assert!(!fuzzy);
            assert!(threshold.is_none());
            assert!(!json);
        }
        _ => panic!("Expected Search command"),
    }
}

#[test]
fn test_parse_search_with_filters() {
    let cli = Cli::parse_from([
        "memory-box", "search", "docker", "--os", "linux", "--project-type", "node", "-t", "ops",
        "-l", "5", "-f", "--threshold", "75", "--json",
    ]);
    match cli.command {
        Commands::Search {
            query,
            os,
            project_type,
            tags,
            limit,
            fuzzy,
            threshold,
            json,
            ..
        } => {
            assert_eq!(query.as_deref(), Some("docker"));
            assert_eq!(os.as_deref(), Some("linux"));
            assert_eq!(project_type.as_deref(), Some("node"));
            assert_eq!(tags, vec!["ops"]);
            assert_eq!(limit, Some(5));
            assert!(fuzzy);
            assert_eq!(threshold, Some(75.0));
            assert!(json);
        }
        _ => panic!("Expected Search command"),
    }
}

#[test]
fn test_parse_threshold_requires_fuzzy() {
    assert!(Cli::try_parse_from(["memory-box", "search", "x", "--threshold", "70"]).is_err());
}

#[test]
fn test_parse_get_and_delete() {
    let cli = Cli::parse_from(["memory-box", "get", "abc-123"]);
    match cli.command {
        Commands::Get { id, json } => {
            assert_eq!(id, "abc-123");
            assert!(!json);
        }
        _ => panic!("Expected Get command"),
    }

    let cli = Cli::parse_from(["memory-box", "delete", "abc-123", "-y"]);
    match cli.command {
        Commands::Delete { id, yes } => {
            assert_eq!(id, "abc-123");
            assert!(yes);
        }
        _ => panic!("Expected Delete command"),
    }
}

#[test]
fn test_parse_listings() {
    assert!(matches!(
        Cli::parse_from(["memory-box", "tags"]).command,
        Commands::Tags
    ));
    assert!(matches!(
        Cli::parse_from(["memory-box", "categories"]).command,
        Commands::Categories
    ));
}

#[test]
fn test_parse_global_options() {
    let cli = Cli::parse_from([
        "memory-box", "tags", "--backend", "sqlite", "--config", "/tmp/mb.toml",
    ]);
    assert_eq!(cli.backend, Some(Backend::Sqlite));
    assert_eq!(cli.config, Some(PathBuf::from("/tmp/mb.toml")));

    assert!(Cli::try_parse_from(["memory-box", "tags", "--backend", "postgres"]).is_err());
}
