//! Main CLI application structure

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use super::context::{CommandContext, GlobalOptions};
use super::export::ExportType;
use super::output::{Output, OutputFormat};
use super::status::StatusCommands;
use super::tag::TagCommands;
use super::task::{AddArgs, ListFilter, UpdateArgs};
use super::{apply, config_cmd, export, nav, status, tag, task};
use crate::domain::Priority;
use crate::remote::DEFAULT_BASE_URL;
use crate::storage::ConfigUpdate;

#[derive(Parser)]
#[command(name = "task")]
#[command(author, version, about = "Command-line client for ClickUp tasks, statuses and tags")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Enable debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Settings file (defaults to ~/.task-cli/config.json)
    #[arg(long, global = true, env = "TASK_CLI_CONFIG")]
    pub config: Option<PathBuf>,

    /// API base URL
    #[arg(long, global = true, hide = true, env = "TASK_CLI_API_URL", default_value = DEFAULT_BASE_URL)]
    pub api_url: String,

    /// Delay between sibling subtasks during apply, in milliseconds
    #[arg(long, global = true, hide = true, env = "TASK_CLI_THROTTLE_MS", default_value_t = 1000)]
    pub throttle_ms: u64,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show or update the local configuration
    Config {
        /// API token
        #[arg(long)]
        token: Option<String>,

        /// Default workspace ID
        #[arg(long)]
        workspace: Option<String>,

        /// Default space ID
        #[arg(long)]
        space: Option<String>,

        /// Default list ID
        #[arg(long)]
        list: Option<String>,
    },

    #[command(flatten)]
    Remote(RemoteCommands),
}

/// Commands that need a token and talk to the remote API
#[derive(Subcommand)]
pub enum RemoteCommands {
    /// List workspaces
    Workspaces,

    /// List spaces of a workspace
    Spaces {
        #[arg(long)]
        workspace: Option<String>,
    },

    /// List lists of a space
    Lists {
        #[arg(long)]
        space: Option<String>,
    },

    /// Show tasks of a list as a tree
    List {
        /// List ID (defaults to the configured list)
        #[arg(long)]
        list: Option<String>,

        /// Show only this task and its subtasks
        #[arg(long)]
        task: Option<String>,

        /// Only tasks with this status (ancestors are kept for context)
        #[arg(long, short)]
        status: Option<String>,

        /// Only tasks with this priority (1-4 or urgent/high/normal/low)
        #[arg(long, short)]
        priority: Option<Priority>,
    },

    /// Show task details
    Get {
        /// Task ID
        id: String,
    },

    /// Create a task
    Add {
        name: String,

        #[arg(long, short)]
        description: Option<String>,

        /// 1 (urgent) to 4 (low)
        #[arg(long, short, default_value = "3")]
        priority: Priority,

        #[arg(long, short)]
        status: Option<String>,

        /// Create as a subtask of this task (in the parent's list)
        #[arg(long)]
        parent: Option<String>,

        #[arg(long)]
        list: Option<String>,
    },

    /// Update a task
    Update {
        /// Task ID
        id: String,

        #[arg(long, short)]
        name: Option<String>,

        #[arg(long, short)]
        description: Option<String>,

        #[arg(long, short)]
        priority: Option<Priority>,

        #[arg(long, short)]
        status: Option<String>,
    },

    /// Delete a task
    Delete {
        /// Task ID
        id: String,

        /// Required; there is no confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Manage space tags
    #[command(subcommand)]
    Tag(TagCommands),

    /// Manage list statuses
    #[command(subcommand)]
    Status(StatusCommands),

    /// Export the task tree to Markdown
    Export {
        #[arg(long, short, default_value = "tasks.md")]
        output: PathBuf,
    },

    /// Export tags, statuses and tasks as an applyable YAML document
    ExportConfig {
        #[arg(long = "type", short = 't', value_enum, default_value_t = ExportType::All)]
        kind: ExportType,

        /// Write to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Apply a YAML configuration (tags, statuses, task trees)
    Apply {
        #[arg(long, short = 'F')]
        file: PathBuf,

        /// Show what would change without changing anything
        #[arg(long)]
        dry_run: bool,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "task_cli=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // A subscriber may already be installed when running in-process
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Main entry point for the CLI
pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let output = Output::new(cli.format);
    let options = GlobalOptions {
        config_path: cli.config,
        api_url: cli.api_url,
        throttle: Duration::from_millis(cli.throttle_ms),
    };

    match cli.command {
        // `config` must work before any token exists
        Commands::Config {
            token,
            workspace,
            space,
            list,
        } => {
            let update = ConfigUpdate {
                token,
                default_workspace: workspace,
                default_space: space,
                default_list: list,
            };
            config_cmd::run(&options, update, &output)
        }
        Commands::Remote(command) => {
            let ctx = CommandContext::load(&options)?;
            debug!("Command context loaded");
            execute(command, &ctx, &output).await
        }
    }
}

async fn execute(command: RemoteCommands, ctx: &CommandContext, output: &Output) -> Result<()> {
    match command {
        RemoteCommands::Workspaces => nav::workspaces(ctx, output).await?,
        RemoteCommands::Spaces { workspace } => nav::spaces(ctx, workspace, output).await?,
        RemoteCommands::Lists { space } => nav::lists(ctx, space, output).await?,

        RemoteCommands::List {
            list,
            task: task_id,
            status,
            priority,
        } => {
            let filter = ListFilter {
                task: task_id,
                status,
                priority,
            };
            task::list(ctx, list, filter, output).await?
        }
        RemoteCommands::Get { id } => task::get(ctx, &id, output).await?,
        RemoteCommands::Add {
            name,
            description,
            priority,
            status,
            parent,
            list,
        } => {
            let args = AddArgs {
                name,
                description,
                priority,
                status,
                parent,
                list,
            };
            task::add(ctx, args, output).await?
        }
        RemoteCommands::Update {
            id,
            name,
            description,
            priority,
            status,
        } => {
            let args = UpdateArgs {
                name,
                description,
                priority,
                status,
            };
            task::update(ctx, &id, args, output).await?
        }
        RemoteCommands::Delete { id, force } => task::delete(ctx, &id, force, output).await?,

        RemoteCommands::Tag(cmd) => tag::run(cmd, ctx, output).await?,
        RemoteCommands::Status(cmd) => status::run(cmd, ctx, output).await?,

        RemoteCommands::Export { output: file } => export::markdown(ctx, &file, output).await?,
        RemoteCommands::ExportConfig { kind, output: file } => {
            export::config(ctx, kind, file.as_deref(), output).await?
        }

        RemoteCommands::Apply { file, dry_run } => apply::run(ctx, &file, dry_run, output).await?,
    }

    Ok(())
}
