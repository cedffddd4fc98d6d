use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use memory_box::cli::{self, Cli};
use memory_box::config::Settings;
use memory_box::MemoryBox;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(backend) = cli.backend {
        settings.backend = backend;
    }

    let vault = MemoryBox::connect(&settings).await?;
    let result = cli::handle_command(cli.command, &vault).await;
    vault.close().await?;

    result
}
