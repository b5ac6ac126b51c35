mod cmd;
mod output;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::{cmd_diff, cmd_info, cmd_list, cmd_synth};
use output::print_error;

#[derive(Parser)]
#[command(name = "apistack")]
#[command(author, version, about = "Declare an HTTP API backed by a function and an optional bucket")]
struct Cli {
  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

/// Settings shared by every command that declares the stack.
#[derive(Args, Debug, Clone, Default)]
pub struct StackArgs {
  /// Leave out the items bucket and the /items route
  #[arg(long)]
  pub no_store: bool,

  /// Output directory for the cloud assembly
  #[arg(long, value_name = "DIR")]
  pub out: Option<PathBuf>,

  /// Stack name
  #[arg(long, value_name = "NAME")]
  pub stack: Option<String>,

  /// Path to the config file (default: ./apistack.toml if present)
  #[arg(long, value_name = "FILE")]
  pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
  /// Synthesize the stack and write the cloud assembly
  Synth {
    #[command(flatten)]
    args: StackArgs,

    /// Print the template as JSON instead of a summary
    #[arg(long)]
    json: bool,
  },

  /// Show what changed since the assembly on disk was written
  Diff {
    #[command(flatten)]
    args: StackArgs,

    /// Output as JSON
    #[arg(long)]
    json: bool,
  },

  /// List routes, function environment and outputs
  List {
    #[command(flatten)]
    args: StackArgs,

    /// Output as JSON
    #[arg(long)]
    json: bool,
  },

  /// Display version and effective settings
  Info {
    #[command(flatten)]
    args: StackArgs,
  },
}

fn main() {
  let cli = Cli::parse();

  let filter = if cli.verbose {
    EnvFilter::new("debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
  };
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let result = match cli.command {
    Commands::Synth { args, json } => cmd_synth(&args, json),
    Commands::Diff { args, json } => cmd_diff(&args, json),
    Commands::List { args, json } => cmd_list(&args, json),
    Commands::Info { args } => cmd_info(&args),
  };

  if let Err(err) = result {
    print_error(&format!("{err:#}"));
    std::process::exit(1);
  }
}
