use anyhow::{Context, Result};
use clap::Parser;
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cmdx::capability::{self, SystemProvider};
use cmdx::config::Config;
use cmdx::{shell, CommandTranslator, Linter};

/// Variable holding a tracing filter directive, e.g. `cmdx=trace`.
const LOG_VAR: &str = "CMDX_LOG";

/// cmdx - translate Unix command lines for PowerShell and cmd
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Target shell: posix, sh, bash, zsh, cmd, console, pwsh or powershell
    #[arg(short, long)]
    shell: Option<String>,

    /// Report unsupported commands and flags instead of translating
    #[arg(long)]
    lint: bool,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Run the translated line and exit with its status
    #[arg(short = 'x', long, conflicts_with = "lint")]
    exec: bool,

    /// Command line to translate
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

fn init_logging(debug: bool) -> Result<()> {
    let log_level = if debug { Level::DEBUG } else { Level::WARN };
    let filter = std::env::var(LOG_VAR)
        .ok()
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::new(log_level.as_str()));

    // stdout carries the translated line
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set global default subscriber")
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug)?;

    let config = if let Some(config_path) = &args.config {
        Config::load_from_file(config_path)?
    } else {
        Config::load_default()?
    };

    let line = args.command.join(" ");
    let rules = config.rule_table();

    if args.lint {
        let report = Linter::new(&rules).lint(&line);
        if args.json {
            println!(
                "{}",
                serde_json::to_string(&report).context("Failed to serialize lint report")?
            );
        } else {
            for entry in &report.unsupported {
                println!("unsupported: {entry}");
            }
            for suggestion in &report.suggestions {
                println!("{suggestion}");
            }
        }
        std::process::exit(i32::from(!report.is_clean()));
    }

    let capability = capability::resolve_with(
        &SystemProvider::default(),
        args.shell.as_deref(),
        config.shell.target.as_deref(),
    );
    let translator = CommandTranslator::with_rules(config.translation.enabled, capability, rules);
    let result = translator.translate(&line);

    if args.json {
        println!(
            "{}",
            serde_json::to_string(&result).context("Failed to serialize translation")?
        );
    } else if !args.exec {
        println!("{}", result.final_command);
    }

    if args.exec {
        let code = shell::run(&result.final_command, translator.capability())?;
        std::process::exit(code);
    }

    Ok(())
}
