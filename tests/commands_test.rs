use anyhow::Result;
use memory_box::cli::{self, Commands};
use memory_box::{Command, SearchRequest};

use test_utils::create_test_box;

fn add_args(words: &[&str], tags: &[&str]) -> Commands {
    Commands::Add {
        description: "test description".to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        os: None,
        project_type: None,
        context: None,
        category: Some("testing".to_string()),
        command: words.iter().map(|w| w.to_string()).collect(),
    }
}

fn search_args(query: Option<&str>) -> Commands {
    Commands::Search {
        query: query.map(str::to_string),
        os: None,
        project_type: None,
        category: None,
        tags: vec![],
        limit: None,
        fuzzy: false,
        threshold: None,
        json: false,
    }
}

#[tokio::test]
async fn test_handle_add_joins_words() -> Result<()> {
    let (vault, _dir) = create_test_box().await?;

    cli::handle_command(add_args(&["git", "commit", "-m", "wip"], &["git"]), &vault).await?;

    let results = vault.search(&SearchRequest::new()).await?;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].command, "git commit -m wip");
    assert_eq!(results[0].tags, vec!["git"]);
    assert_eq!(results[0].category.as_deref(), Some("testing"));
    Ok(())
}

#[tokio::test]
async fn test_handle_add_masks_password() -> Result<()> {
    let (vault, _dir) = create_test_box().await?;

    cli::handle_command(add_args(&["mysql", "--password", "hunter2"], &[]), &vault).await?;

    let results = vault.search(&SearchRequest::new()).await?;
    assert_eq!(results[0].command, "mysql --password ****");
    Ok(())
}

#[tokio::test]
async fn test_handle_search() -> Result<()> {
    let (vault, _dir) = create_test_box().await?;
    vault.add(&Command::new("echo hello", "greet")).await?;

    cli::handle_command(search_args(Some("hello")), &vault).await?;
    cli::handle_command(search_args(Some("absent")), &vault).await?;
    cli::handle_command(search_args(None), &vault).await?;
    Ok(())
}

#[tokio::test]
async fn test_handle_search_rejects_zero_limit() -> Result<()> {
    let (vault, _dir) = create_test_box().await?;

    let mut args = search_args(None);
    if let Commands::Search { limit, .. } = &mut args {
        *limit = Some(0);
    }
    assert!(cli::handle_command(args, &vault).await.is_err());
    Ok(())
}

#[tokio::test]
async fn test_handle_get_counts_use() -> Result<()> {
    let (vault, _dir) = create_test_box().await?;
    let id = vault.add(&Command::new("make test", "run tests")).await?;

    cli::handle_command(Commands::Get { id: id.clone(), json: true }, &vault).await?;
    cli::handle_command(Commands::Get { id: id.clone(), json: false }, &vault).await?;

    assert_eq!(vault.get(&id).await?.unwrap().use_count, 3);
    Ok(())
}

#[tokio::test]
async fn test_handle_get_unknown() -> Result<()> {
    let (vault, _dir) = create_test_box().await?;

    let err = cli::handle_command(
        Commands::Get {
            id: "missing".to_string(),
            json: false,
        },
        &vault,
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("Command not found"));
    Ok(())
}

#[tokio::test]
async fn test_handle_delete() -> Result<()> {
    let (vault, _dir) = create_test_box().await?;
    let id = vault.add(&Command::new("rm -rf target", "clean")).await?;

    cli::handle_command(
        Commands::Delete {
            id: id.clone(),
            yes: true,
        },
        &vault,
    )
    .await?;
    assert!(vault.get(&id).await?.is_none());

    let again = cli::handle_command(Commands::Delete { id, yes: true }, &vault).await;
    assert!(again.is_err());
    Ok(())
}

#[tokio::test]
async fn test_handle_listings() -> Result<()> {
    let (vault, _dir) = create_test_box().await?;

    cli::handle_command(Commands::Tags, &vault).await?;
    cli::handle_command(Commands::Categories, &vault).await?;

    cli::handle_command(add_args(&["ls"], &["fs"]), &vault).await?;
    cli::handle_command(Commands::Tags, &vault).await?;
    cli::handle_command(Commands::Categories, &vault).await?;

    assert_eq!(vault.list_tags().await?, vec!["fs"]);
    assert_eq!(vault.list_categories().await?, vec!["testing"]);
    Ok(())
}
