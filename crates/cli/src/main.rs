//! reckon CLI: run rule packs against state documents from the shell.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use reckon_core::{ContextMeta, RunOutput, State};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Deterministic rules engine for structured documents.
#[derive(Parser)]
#[command(name = "reckon", version, about = "Deterministic rules engine for structured documents")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a rule pack against a state document
    Eval {
        /// Path to the state JSON file
        state: PathBuf,
        /// Path to the rule pack (.json, .yaml or .yml)
        #[arg(long)]
        rules: PathBuf,
        /// Optional context metadata JSON file
        #[arg(long)]
        context: Option<PathBuf>,
    },
    /// Check that a rule pack loads and validates
    Validate {
        /// Path to the rule pack (.json, .yaml or .yml)
        rules: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let code = match &cli.command {
        Commands::Eval {
            state,
            rules,
            context,
        } => cmd_eval(state, rules, context.as_deref(), cli.output),
        Commands::Validate { rules } => cmd_validate(rules),
    };
    process::exit(code);
}

fn cmd_eval(
    state_path: &Path,
    rules_path: &Path,
    context_path: Option<&Path>,
    output: OutputFormat,
) -> i32 {
    let state = match read_json::<State>(state_path, "state") {
        Ok(s) => s,
        Err(msg) => return fail(&msg),
    };
    let pack = match reckon_loader::load_from_file(rules_path) {
        Ok(p) => p,
        Err(e) => return fail(&format!("failed to load rule pack: {e}")),
    };
    let meta = match context_path {
        Some(path) => match read_json::<ContextMeta>(path, "context") {
            Ok(m) => m,
            Err(msg) => return fail(&msg),
        },
        None => ContextMeta::default(),
    };

    let result = match reckon_eval::run(state, pack, meta) {
        Ok(r) => r,
        Err(e) => return fail(&format!("engine error: {e}")),
    };

    match output {
        OutputFormat::Json => match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{json}"),
            Err(e) => return fail(&format!("failed to serialize result: {e}")),
        },
        OutputFormat::Text => print_text(&result),
    }

    if result.violations.is_empty() {
        0
    } else {
        2
    }
}

fn cmd_validate(rules_path: &Path) -> i32 {
    match reckon_loader::load_from_file(rules_path) {
        Ok(pack) => {
            let rules: usize = pack.phases.iter().map(|p| p.rules.len()).sum();
            println!(
                "ok: {} {} ({} phases, {} rules)",
                pack.id,
                pack.version,
                pack.phases.len(),
                rules
            );
            0
        }
        Err(e) => fail(&format!("invalid rule pack: {e}")),
    }
}

fn print_text(result: &RunOutput) {
    println!("rules version: {}", result.rules_version);

    if let Some(totals) = result.state_fragment.get("totals") {
        println!("totals: {totals}");
    }
    for reason in &result.reasons {
        println!("  [{}] {}: {}", reason.phase, reason.rule_id, reason.message);
    }
    for violation in &result.violations {
        println!(
            "violation: {} {} ({})",
            violation.code, violation.field, violation.message
        );
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("failed to read {what} file: {e}"))?;
    serde_json::from_str(&raw).map_err(|e| format!("failed to parse {what}: {e}"))
}

fn fail(msg: &str) -> i32 {
    eprintln!("error: {msg}");
    1
}
