mod commands;
mod output;
mod table_io;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "catalogv")]
#[command(version, about = "Catalog Rules Engine CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a product catalog CSV file
    Validate {
        /// Path to the CSV file
        file: String,

        /// Marketplace (e.g. mercadolivre, amazon, shopee)
        #[arg(short, long)]
        marketplace: String,

        /// Product category
        #[arg(short, long)]
        category: Option<String>,

        /// Apply automatic fixes
        #[arg(long)]
        auto_fix: bool,

        /// Write the corrected CSV to this path (implies --auto-fix)
        #[arg(short, long)]
        output: Option<String>,

        /// Use YAML policies instead of the compiled rule engine
        #[arg(long)]
        policy: bool,

        /// Pipeline configuration file (YAML or TOML)
        #[arg(long)]
        config: Option<String>,

        /// Policy directory
        #[arg(long)]
        policies_dir: Option<String>,

        /// Ruleset directory
        #[arg(long)]
        rulesets_dir: Option<String>,

        /// Validate rows in concurrent batches of this size
        #[arg(long)]
        batch_size: Option<usize>,

        /// Fail on warnings as well as errors
        #[arg(short, long)]
        strict: bool,

        /// Output format: text, json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Check a policy file without validating data
    Check {
        /// Path to the policy file
        policy: String,

        /// Output format: text, json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Work with the policy directory
    Policies {
        #[command(subcommand)]
        action: PolicyAction,
    },
}

#[derive(Subcommand)]
enum PolicyAction {
    /// List available policies per marketplace
    List {
        /// Policy directory
        #[arg(short, long, default_value = "policies")]
        dir: String,

        /// Only list this marketplace
        #[arg(short, long)]
        marketplace: Option<String>,

        /// Output format: text, json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    // Execute command
    match cli.command {
        Commands::Validate {
            file,
            marketplace,
            category,
            auto_fix,
            output,
            policy,
            config,
            policies_dir,
            rulesets_dir,
            batch_size,
            strict,
            format,
        } => {
            let args = commands::validate::ValidateArgs {
                file,
                marketplace,
                category,
                auto_fix: auto_fix || output.is_some(),
                output,
                policy,
                config,
                policies_dir,
                rulesets_dir,
                batch_size,
                strict,
                format,
            };
            commands::validate::execute(args).await
        }

        Commands::Check { policy, format } => commands::check::execute(&policy, &format),

        Commands::Policies { action } => match action {
            PolicyAction::List {
                dir,
                marketplace,
                format,
            } => commands::policies::list(&dir, marketplace.as_deref(), &format),
        },
    }
}
