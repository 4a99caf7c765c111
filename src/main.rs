mod debug_report;

use std::fs;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use crosscut::wildcard::WildcardPattern;
use crosscut::{AspectContext, ContextDeclaration};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "CROSSCUT_LOG";

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "crosscut", about = "Pointcut matching and advice resolution diagnostics", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log level; overridden by CROSSCUT_LOG when set.
    #[arg(long, value_enum, default_value = "warn", global = true)]
    log_level: LogLevel,

    /// Force ANSI color output.
    #[arg(long, global = true, conflicts_with = "no_color")]
    color: bool,

    /// Disable ANSI color output.
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Match one or more inputs against a wildcard pattern.
    Match {
        pattern: String,
        #[arg(required = true)]
        inputs: Vec<String>,
        #[command(flatten)]
        separator: SeparatorArgs,
    },
    /// Show what the wildcards of a pattern absorb from an input.
    Mask {
        pattern: String,
        input: String,
        #[command(flatten)]
        separator: SeparatorArgs,
    },
    /// Resolve the advice for one (resource, handler, operation) joinpoint.
    Resolve {
        /// JSON file with options, aspects, resources and handlers.
        #[arg(long)]
        rules: PathBuf,
        resource: String,
        handler: String,
        operation: String,
    },
    /// Wire declared aspects into declared resources and handlers.
    Wire {
        #[arg(long)]
        rules: PathBuf,
    },
}

#[derive(clap::Args, Debug)]
struct SeparatorArgs {
    /// Segment separator for `*`.
    #[arg(short, long, default_value_t = '/')]
    separator: char,

    /// Compile without a separator.
    #[arg(long, conflicts_with = "separator")]
    flat: bool,
}

impl SeparatorArgs {
    fn get(&self) -> Option<char> {
        if self.flat { None } else { Some(self.separator) }
    }
}

fn main() {
    let cli = Cli::parse();
    initialize_tracing(cli.log_level);

    let color = if cli.color {
        true
    } else if cli.no_color {
        false
    } else {
        io::stdout().is_terminal()
    };

    if let Err(err) = run(cli.command, color) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn initialize_tracing(level: LogLevel) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level.to_filter_directive()));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).with_target(false).init();
}

fn run(command: Command, color: bool) -> Result<(), String> {
    match command {
        Command::Match { pattern, inputs, separator } => {
            let pattern = WildcardPattern::compile(&pattern, separator.get());
            debug_report::print_match(&pattern, &inputs, color);
        }
        Command::Mask { pattern, input, separator } => {
            let pattern = WildcardPattern::compile(&pattern, separator.get());
            debug_report::print_mask(&pattern, &input, color);
        }
        Command::Resolve { rules, resource, handler, operation } => {
            let declaration = load_rules(&rules)?;
            let ctx = AspectContext::build(&declaration).map_err(|err| format_rule_error(&err))?;
            let registry = ctx.resolve(&resource, &handler, &operation);
            debug_report::print_resolution(&resource, &handler, &operation, &registry, color);
        }
        Command::Wire { rules } => {
            let declaration = load_rules(&rules)?;
            let ctx = AspectContext::build(&declaration).map_err(|err| format_rule_error(&err))?;
            let mut resources = declaration.resource_rules();
            let mut handlers = declaration.handler_rules();
            let report = ctx.wire(&mut resources, &mut handlers);
            debug_report::print_wiring(&report, &resources, &handlers, color);
        }
    }
    Ok(())
}

fn load_rules(path: &Path) -> Result<ContextDeclaration, String> {
    debug!(path = %path.display(), "loading rules");
    let json = fs::read_to_string(path).map_err(|err| format!("failed to read {}: {err}", path.display()))?;
    ContextDeclaration::from_json(&json).map_err(|err| format_rule_error(&err))
}

fn format_rule_error(err: &crosscut::RuleError) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(&format!(": {cause}"));
        source = cause.source();
    }
    message
}
