use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use keyword_optimizer::config::Config;
use keyword_optimizer::seed::load_seed_table;
use std::process;
use std::sync::Arc;
use tracing::{error, info, Level};

mod cmd;
mod reports;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// CSV table of keyword ideas and their estimates.
    #[arg(global = true, short, long, default_value = "data/seeds.csv")]
    seeds: String,

    /// JSON config file. Values typed on the command line take precedence.
    #[arg(global = true, short, long)]
    config: Option<String>,

    #[arg(global = true, long, default_value_t = false)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Optimize(cmd::optimize::OptimizeArgs),
    Score(cmd::score::ScoreArgs),
}

fn main() {
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    tracing_subscriber::fmt()
        .with_max_level(if cli.debug { Level::DEBUG } else { Level::INFO })
        .init();

    info!("🚀 Initializing Keyword Optimizer...");

    let (cli_config, sub_name) = match &cli.command {
        Commands::Optimize(args) => (&args.config, "optimize"),
        Commands::Score(args) => (&args.config, "score"),
    };

    let config = match &cli.config {
        Some(path) => {
            info!("⚖️  Loading config from: {}", path);
            let mut file_config = Config::load_from_file(path).unwrap_or_else(|e| {
                error!("❌ {}", e);
                process::exit(1);
            });
            if let Some(sub_matches) = matches.subcommand_matches(sub_name) {
                file_config.merge_from_cli(cli_config, sub_matches);
            }
            file_config
        }
        None => cli_config.clone(),
    };

    if let Err(e) = config.validate() {
        error!("❌ {}", e);
        process::exit(1);
    }

    let source = match load_seed_table(&cli.seeds) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            error!("\n❌ FATAL ERROR LOADING SEED TABLE:");
            error!("   {}", e);
            process::exit(1);
        }
    };

    let outcome = match cli.command {
        Commands::Optimize(args) => cmd::optimize::run(args, config, source),
        Commands::Score(args) => cmd::score::run(args, config, source),
    };

    if let Err(e) = outcome {
        error!("❌ {}", e);
        process::exit(1);
    }
}
