mod config;
mod generate_cmd;
#[cfg(test)]
mod test_util;

use clap::{Parser, Subcommand};

use generate_cmd::GenerateArgs;

#[derive(Parser)]
#[command(
    name = "seedling",
    version,
    about = "Grow a multi-file project from a single prompt"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan, confirm and generate a project from a prompt
    Generate(GenerateArgs),
    /// Write a seedling config file template
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

/// Execute the `seedling init` command: write a config file template.
fn cmd_init(force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile::default();
    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  llm.base_url = {}", cfg.llm.base_url);
    println!("  llm.model = {}", cfg.llm.model);
    println!("  llm.max_tokens = {}", cfg.llm.max_tokens);
    println!("  retry.backoff_secs = {}", cfg.retry.backoff_secs);
    println!();
    println!(
        "Next: export {} or add `api_key` under [llm], then run `seedling generate`.",
        config::API_KEY_ENV
    );

    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate(args) => generate_cmd::run_generate(args).await,
        Commands::Init { force } => cmd_init(force),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}
