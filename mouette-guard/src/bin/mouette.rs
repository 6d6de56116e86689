//! Mouette command line
//!
//! Lints an Extended JSON dump of a document database, compares two stored
//! lint results, or prints the rule catalog.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use mouette_guard::config::{read_serialized, LintConfig};
use mouette_guard::core::{diff, FailureJson, Linter, Registry};
use mouette_guard::formatters::{
    catalog_markdown, FailureFormatter, HumanFormatter, JsonFormatter, SummaryFormatter,
};
use mouette_guard::logging::setup::{init_logging, LoggingConfig};
use mouette_guard::logging::LogConfig;
use mouette_guard::store::InMemoryStore;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing::Level;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Write logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Disable coloured output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Lint a dump shaped like {"<collection>": [document, ...]}
    Lint {
        dump: PathBuf,

        /// Configuration file, merged over the defaults
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = Style::Full)]
        style: Style,
    },
    /// Print the failures of NEW that are not in OLD
    Diff {
        old: PathBuf,
        new: PathBuf,

        #[arg(short, long, value_enum, default_value_t = Style::Full)]
        style: Style,
    },
    /// Print the rule catalog as markdown
    Rules {
        /// Configuration file used to tick enabled rules
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Style {
    Json,
    Full,
    Summary,
}

impl Style {
    fn formatter(self, colors: bool) -> Box<dyn FailureFormatter> {
        match self {
            Style::Json => Box::new(JsonFormatter::new().with_pretty(false)),
            Style::Full => Box::new(HumanFormatter::new().with_colors(colors)),
            Style::Summary => Box::new(SummaryFormatter::new().with_colors(colors)),
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<LintConfig> {
    let defaults = LintConfig::default_config()?;
    let user = match path {
        Some(path) => Some(LintConfig::from_path(path)?),
        None => LintConfig::discover(std::env::current_dir()?)?,
    };
    Ok(match user {
        Some(user) => defaults.merge(user),
        None => defaults,
    })
}

fn read_failures(path: &Path) -> Result<Vec<FailureJson>> {
    let value = read_serialized(path)?;
    serde_json::from_value(value)
        .with_context(|| format!("{} is not a list of lint failures", path.display()))
}

fn print_failures(failures: &[FailureJson], style: Style, colors: bool) -> Result<()> {
    let text = style.formatter(colors).format(failures)?;
    if !text.is_empty() {
        println!("{text}");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let logging = if args.verbose {
        LoggingConfig::development()
    } else {
        LoggingConfig::default().with_mouette_level(Level::WARN)
    };
    init_logging(logging.with_json_format(args.log_json))
        .map_err(|e| anyhow!("Failed to initialize logging: {e}"))?;

    let colors = !args.no_color && std::io::stdout().is_terminal();

    match args.command {
        Command::Lint {
            dump,
            config,
            style,
        } => {
            let config = load_config(config.as_deref())?;
            let store = InMemoryStore::from_json_dump(&read_serialized(&dump)?)
                .with_context(|| format!("Failed to load {}", dump.display()))?;

            let log_config = if args.verbose {
                LogConfig::verbose()
            } else {
                LogConfig::quiet()
            };
            let report = Linter::new(config)
                .with_log_config(log_config)
                .lint_store(store)
                .await?;
            for rejected in &report.rejected {
                eprintln!("Skipped rule {}: {}", rejected.rule, rejected.reason);
            }
            print_failures(&report.failures, style, colors)?;
        }
        Command::Diff { old, new, style } => {
            let old = read_failures(&old)?;
            let new = read_failures(&new)?;
            print_failures(&diff(&old, &new), style, colors)?;
        }
        Command::Rules { config } => {
            let config = load_config(config.as_deref())?;
            print!("{}", catalog_markdown(&Registry::builtin(), &config)?);
        }
    }
    Ok(())
}
