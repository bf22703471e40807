mod duplicates;
mod format;
mod output;
mod patterns;
mod translate;
mod validate_xml;

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::LevelFilter;
use sltools::IncludePolicy;
use sltools::include::{DEFAULT_INCLUDE_BASE, IncludeResolver};
use sltools_cli::config::{Config, load_config};

use crate::{
    duplicates::run_duplicates_command,
    format::{FormatOptions, run_format_command},
    output::ReportArgs,
    patterns::run_patterns_command,
    translate::{TranslateCommand, run_translate_command},
    validate_xml::run_validate_command,
};

/// Maintenance tools for game localization string tables
#[derive(Parser, Debug)]
#[command(name = "slt", author, version, about, long_about = None)]
struct Args {
    /// Log level (overrides the config file and RUST_LOG)
    #[arg(long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,

    /// Config file (default: <config dir>/sltools/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    commands: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CliLogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LevelFilter {
    fn from(level: CliLogLevel) -> Self {
        match level {
            CliLogLevel::Off => LevelFilter::Off,
            CliLogLevel::Error => LevelFilter::Error,
            CliLogLevel::Warn => LevelFilter::Warn,
            CliLogLevel::Info => LevelFilter::Info,
            CliLogLevel::Debug => LevelFilter::Debug,
            CliLogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PolicyArg {
    Fatal,
    Advisory,
}

impl From<PolicyArg> for IncludePolicy {
    fn from(policy: PolicyArg) -> Self {
        match policy {
            PolicyArg::Fatal => IncludePolicy::Fatal,
            PolicyArg::Advisory => IncludePolicy::Advisory,
        }
    }
}

#[derive(clap::Args, Debug, Clone)]
struct IncludeArgs {
    /// Directory `#include` paths are resolved against
    #[arg(long)]
    include_base: Option<PathBuf>,

    /// Whether an unresolved `#include` fails the file
    #[arg(long, value_enum)]
    include_policy: Option<PolicyArg>,
}

impl IncludeArgs {
    fn resolver(&self, config: &Config) -> IncludeResolver {
        let base = self
            .include_base
            .clone()
            .or_else(|| config.include_base_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_INCLUDE_BASE));
        let policy = self
            .include_policy
            .map(IncludePolicy::from)
            .or(config.include_policy)
            .unwrap_or_default();
        IncludeResolver::new(base).policy(policy)
    }
}

/// Supported subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Rewrite string tables in canonical layout
    #[command(visible_alias = "fx")]
    Format {
        /// Files, directories or glob patterns
        #[arg(required = true)]
        paths: Vec<String>,

        /// Repair typical XML errors instead of failing the file
        #[arg(long)]
        fix: bool,

        /// Lay out <text> contents the way they show in game
        #[arg(long)]
        format_text_entries: bool,

        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,

        #[command(flatten)]
        include: IncludeArgs,

        #[command(flatten)]
        report: ReportArgs,
    },

    /// Check string tables without modifying them
    #[command(visible_alias = "vx")]
    Validate {
        /// Files, directories or glob patterns
        #[arg(required = true)]
        paths: Vec<String>,

        #[command(flatten)]
        include: IncludeArgs,

        #[command(flatten)]
        report: ReportArgs,
    },

    /// Machine-translate every <text> through DeepL
    #[command(visible_alias = "tr")]
    Translate {
        /// Files, directories or glob patterns
        #[arg(required = true)]
        paths: Vec<String>,

        /// Target language, e.g. RU or EN-GB
        #[arg(long)]
        to: String,

        /// Source language (detected by the service if missing)
        #[arg(long)]
        from: Option<String>,

        /// DeepL API key (or DEEPL_API_KEY)
        #[arg(long)]
        api_key: Option<String>,

        /// DeepL endpoint URL
        #[arg(long)]
        endpoint: Option<String>,

        /// Translate without writing files
        #[arg(long)]
        dry_run: bool,

        #[command(flatten)]
        include: IncludeArgs,

        #[command(flatten)]
        report: ReportArgs,
    },

    /// Find string ids defined by more than one file
    #[command(visible_alias = "fsd")]
    FindDuplicates {
        /// Files, directories or glob patterns
        #[arg(required = true)]
        paths: Vec<String>,

        /// List every duplicated id with its definitions
        #[arg(long)]
        per_string: bool,

        #[command(flatten)]
        report: ReportArgs,
    },

    /// Count placeholder spans and find malformed ones
    #[command(visible_alias = "ap")]
    AnalyzePatterns {
        /// Files, directories or glob patterns
        #[arg(required = true)]
        paths: Vec<String>,

        #[command(flatten)]
        report: ReportArgs,
    },

    /// Generate shell completions for slt
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging(level: Option<LevelFilter>) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = level {
        builder.filter_level(level);
    }
    builder.format_timestamp(None).init();
}

fn run(commands: Commands, config: &Config) -> Result<bool, String> {
    match commands {
        Commands::Format {
            paths,
            fix,
            format_text_entries,
            dry_run,
            include,
            report,
        } => run_format_command(
            FormatOptions {
                paths,
                fix,
                format_text_entries,
                dry_run,
                report,
            },
            include.resolver(config),
        ),
        Commands::Validate {
            paths,
            include,
            report,
        } => run_validate_command(paths, include.resolver(config), report),
        Commands::Translate {
            paths,
            to,
            from,
            api_key,
            endpoint,
            dry_run,
            include,
            report,
        } => run_translate_command(
            TranslateCommand {
                paths,
                to,
                from,
                api_key,
                endpoint,
                dry_run,
                report,
            },
            include.resolver(config),
            config,
        ),
        Commands::FindDuplicates {
            paths,
            per_string,
            report,
        } => run_duplicates_command(paths, per_string, report),
        Commands::AnalyzePatterns { paths, report } => run_patterns_command(paths, report),
        Commands::Completions { shell } => {
            generate(shell, &mut Args::command(), "slt", &mut std::io::stdout());
            Ok(true)
        }
    }
}

fn main() {
    let args = Args::parse();

    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    init_logging(args.log_level.map(LevelFilter::from).or_else(|| config.log_level()));

    match run(args.commands, &config) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
