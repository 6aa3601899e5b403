use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use campaign_forge::config::CampaignConfig;
use campaign_forge::logging::{LogFormat, init_tracing};

mod cmd;

#[derive(Parser)]
#[command(name = "campaign-forge")]
#[command(version, about = "Drive a campaign brief through agent phases with human review gates")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Path to campaign.toml (default: ./campaign.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Snapshot directory. Overrides campaign.toml and CAMPAIGN_SNAPSHOT_DIR.
    #[arg(long, global = true)]
    pub snapshot_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a campaign from a brief in the terminal
    Run {
        /// The campaign brief
        brief: String,

        /// Pause for review after every phase
        #[arg(long)]
        manual_review: bool,

        /// Pause for sign-off before completing
        #[arg(long)]
        require_signoff: bool,

        /// Use built-in offline agents instead of the agent CLI
        #[arg(long)]
        offline: bool,

        /// Approve every review checkpoint without prompting
        #[arg(short, long)]
        yes: bool,
    },
    /// Serve the campaign HTTP API
    Serve {
        /// Port to serve on (default from campaign.toml)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind (default from campaign.toml)
        #[arg(long)]
        host: Option<String>,

        /// Enable dev mode (permissive CORS for a local frontend)
        #[arg(long)]
        dev: bool,

        /// Use built-in offline agents instead of the agent CLI
        #[arg(long)]
        offline: bool,
    },
    /// List stored campaigns
    List,
    /// Show a stored campaign
    Show {
        id: String,

        /// Print the raw JSON snapshot
        #[arg(long)]
        json: bool,
    },
    /// Approve a paused campaign and continue running it
    Resume {
        id: String,

        #[arg(long)]
        offline: bool,

        #[arg(short, long)]
        yes: bool,
    },
    /// Rerun the reviewed phase of a paused campaign with new instructions
    Refine {
        id: String,

        instructions: String,

        #[arg(long)]
        offline: bool,

        #[arg(short, long)]
        yes: bool,
    },
    /// Cancel a campaign and delete its snapshot
    Cancel { id: String },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Initialize a default campaign.toml file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };
    init_tracing(cli.verbose, format)?;

    if let Commands::Config { command } = &cli.command {
        return cmd::cmd_config(cli.config.as_deref(), command.clone());
    }

    let mut config = CampaignConfig::load(cli.config.as_deref())?;
    config.cli_snapshot_dir = cli.snapshot_dir.clone();

    match &cli.command {
        Commands::Run {
            brief,
            manual_review,
            require_signoff,
            offline,
            yes,
        } => {
            config.cli_manual_review = *manual_review;
            config.cli_require_signoff = *require_signoff;
            cmd::cmd_run(&config, brief, *offline, *yes, cli.verbose).await?;
        }
        Commands::Serve {
            port,
            host,
            dev,
            offline,
        } => {
            cmd::cmd_serve(&config, *port, host.clone(), *dev, *offline).await?;
        }
        Commands::List => cmd::cmd_list(&config)?,
        Commands::Show { id, json } => cmd::cmd_show(&config, id, *json)?,
        Commands::Resume { id, offline, yes } => {
            cmd::cmd_resume(&config, id, *offline, *yes, cli.verbose).await?;
        }
        Commands::Refine {
            id,
            instructions,
            offline,
            yes,
        } => {
            cmd::cmd_refine(&config, id, instructions, *offline, *yes, cli.verbose).await?;
        }
        Commands::Cancel { id } => cmd::cmd_cancel(&config, id).await?,
        Commands::Config { .. } => {}
    }

    Ok(())
}
