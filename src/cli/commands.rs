use anyhow::{bail, Result};
use colored::*;
use dialoguer::Confirm;

use super::args::Commands;
use crate::api::MemoryBox;
use crate::db::{Command, CommandWithMetadata, SearchRequest};
use crate::utils::time::format_local;

pub async fn handle_command(command: Commands, vault: &MemoryBox) -> Result<()> {
    match command {
        Commands::Add {
            description,
            tags,
            os,
            project_type,
            context,
            category,
            command,
        } => {
            let cmd = Command {
                command: command.join(" "),
                description,
                os,
                project_type,
                context,
                category,
                tags,
            };
            let id = vault.add(&cmd).await?;
            println!("Command saved with ID: {}", id.green());
        }
        Commands::Search {
            query,
            os,
            project_type,
            category,
            tags,
            limit,
            fuzzy,
            threshold,
            json,
        } => {
            let request = SearchRequest {
                query,
                os,
                project_type,
                category,
                tags,
                limit: limit.unwrap_or(vault.options().default_limit),
                fuzzy,
                fuzzy_threshold: threshold,
            };
            let commands = vault.search(&request).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&commands)?);
            } else {
                print_commands(&commands);
            }
        }
        Commands::Get { id, json } => match vault.get(&id).await? {
            Some(cmd) if json => println!("{}", serde_json::to_string_pretty(&cmd)?),
            Some(cmd) => print_commands(std::slice::from_ref(&cmd)),
            None => bail!("Command not found: {}", id),
        },
        Commands::Delete { id, yes } => {
            if !yes && !confirm_delete(&id)? {
                println!("Aborted");
                return Ok(());
            }
            if vault.delete(&id).await? {
                println!("Command {} deleted", id);
            } else {
                bail!("Command not found: {}", id);
            }
        }
        Commands::Tags => {
            let tags = vault.list_tags().await?;
            if tags.is_empty() {
                println!("No tags found");
            }
            for tag in tags {
                println!("{}", tag);
            }
        }
        Commands::Categories => {
            let categories = vault.list_categories().await?;
            if categories.is_empty() {
                println!("No categories found");
            }
            for category in categories {
                println!("{}", category);
            }
        }
    }
    Ok(())
}

fn confirm_delete(id: &str) -> Result<bool> {
    if !atty::is(atty::Stream::Stdin) {
        bail!("Refusing to delete without a terminal; pass --yes to confirm");
    }
    Ok(Confirm::new()
        .with_prompt(format!("Delete command {}?", id))
        .default(false)
        .interact()?)
}

fn print_commands(commands: &[CommandWithMetadata]) {
    if commands.is_empty() {
        println!("No matching commands found.");
        return;
    }

    println!("\nFound {} matching commands:", commands.len());
    println!("─────────────────────────────────────────────");

    for cmd in commands {
        println!("{}", cmd.command.bold());
        println!("    {}", cmd.description);
        println!("    ID: {}", cmd.id.dimmed());

        let mut facets = Vec::new();
        if let Some(os) = &cmd.os {
            facets.push(format!("os={}", os));
        }
        if let Some(project_type) = &cmd.project_type {
            facets.push(format!("project={}", project_type));
        }
        if let Some(category) = &cmd.category {
            facets.push(format!("category={}", category));
        }
        if !facets.is_empty() {
            println!("    {}", facets.join("  "));
        }

        if let Some(context) = &cmd.context {
            println!("    Context: {}", context);
        }

        // Show tags if present
        if !cmd.tags.is_empty() {
            println!("    Tags: {}", cmd.tags.join(", ").cyan());
        }

        let last_used = cmd
            .last_used
            .as_ref()
            .map(format_local)
            .unwrap_or_else(|| "never".to_string());
        println!(
            "    Used {} time{} (last: {}), added {}",
            cmd.use_count,
            if cmd.use_count == 1 { "" } else { "s" },
            last_used,
            format_local(&cmd.created_at)
        );

        println!("─────────────────────────────────────────────");
    }
}
