//! sable: The sable binder CLI.
//!
//! Usage:
//!   sable bind <tree.json> [--options opts.json] [--script] [--ignore-accessibility]
//!   sable dump-flags
//!
//! Logging is controlled by `SABLE_LOG` (same syntax as `RUST_LOG`).

use clap::{Parser as ClapParser, Subcommand};
use miette::{IntoDiagnostic, WrapErr};
use sable_binder::{BindValueKind, BinderFlags, BoundGlobalScope, NodeUsage};
use sable_compiler::Compilation;
use sable_diagnostics::Diagnostic;
use sable_options::{parse_options_file, CompilationOptions};
use sable_syntax::SyntaxTree;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(ClapParser, Debug)]
#[command(name = "sable", about = "sable - semantic binding for sable syntax trees")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Bind a serialized syntax tree and report its diagnostics.
    Bind {
        /// Syntax tree in JSON form.
        #[arg(value_name = "TREE")]
        tree: PathBuf,

        /// Path to a JSON options file.
        #[arg(long)]
        options: Option<PathBuf>,

        /// Treat the tree as a script submission.
        #[arg(long)]
        script: bool,

        /// Skip accessibility checks.
        #[arg(long = "ignore-accessibility")]
        ignore_accessibility: bool,
    },
    /// Print the binder flag and node usage constants.
    DumpFlags,
}

// ANSI color codes
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn main() -> miette::Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Bind {
            tree,
            options,
            script,
            ignore_accessibility,
        } => run_bind(tree, options, script, ignore_accessibility),
        Command::DumpFlags => {
            dump_flags();
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Install the stderr subscriber. `SABLE_LOG` overrides the default
/// `warn` level.
fn init_tracing() {
    let filter = match std::env::var("SABLE_LOG") {
        Ok(value) => EnvFilter::builder().parse_lossy(value),
        Err(_) => EnvFilter::new("warn"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_bind(
    tree_path: PathBuf,
    options_path: Option<PathBuf>,
    script: bool,
    ignore_accessibility: bool,
) -> miette::Result<ExitCode> {
    let start = Instant::now();
    let mut options = match &options_path {
        Some(path) => parse_options_file(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read options '{}'", path.display()))?,
        None => CompilationOptions::default(),
    };
    if script {
        options.is_script = Some(true);
    }
    if ignore_accessibility {
        options.ignore_accessibility = Some(true);
    }

    let tree = SyntaxTree::from_file(&tree_path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to load syntax tree '{}'", tree_path.display()))?;
    tracing::info!(file = tree.file_name(), nodes = tree.len(), "loaded syntax tree");

    let compilation = Compilation::new(tree, options, None);
    let scope = compilation.bind_global_scope();

    let use_color = std::io::stderr().is_terminal();
    for diagnostic in scope.diagnostics() {
        print_diagnostic(diagnostic, use_color);
    }
    print_summary(&scope);

    let errors = scope.diagnostics().error_count();
    let warnings = scope.diagnostics().len() - errors;
    let elapsed = start.elapsed();
    if errors > 0 {
        eprintln!();
        eprintln!(
            "Found {} error{} and {} warning{} in {:.2}s.",
            errors,
            if errors == 1 { "" } else { "s" },
            warnings,
            if warnings == 1 { "" } else { "s" },
            elapsed.as_secs_f64()
        );
        return Ok(ExitCode::from(1));
    }
    tracing::info!(warnings, elapsed_ms = elapsed.as_millis() as u64, "bind finished");
    Ok(ExitCode::SUCCESS)
}

fn print_summary(scope: &BoundGlobalScope) {
    let symbols = scope.module().symbols();
    let entry_point = scope
        .entry_point()
        .map_or_else(|| "(none)".to_string(), |entry| symbols.qualified_name(entry));
    println!("entry point: {}", entry_point);
    println!(
        "types: {}, methods: {}, variables: {}",
        scope.types().len(),
        scope.methods().len(),
        scope.variables().len()
    );
    println!(
        "bound bodies: {}, field initializers: {}, global statements: {}",
        scope.method_bodies().len(),
        scope.field_initializers().len(),
        scope.statements().len()
    );
    if !scope.library_types().is_empty() {
        let names: Vec<&str> = scope.library_types().keys().map(String::as_str).collect();
        println!("library types: {}", names.join(", "));
    }
}

fn print_diagnostic(diag: &Diagnostic, use_color: bool) {
    if use_color {
        let color = if diag.is_error() { RED } else { YELLOW };
        if let Some(ref file) = diag.file {
            eprint!("{}{}{}", CYAN, file, RESET);
            if let Some(span) = diag.span {
                eprint!("({})", span.start);
            }
            eprint!(": ");
        }
        eprintln!(
            "{}{}{}{} {}{}{}: {}",
            BOLD,
            color,
            diag.category,
            RESET,
            CYAN,
            diag.code_text(),
            RESET,
            diag.message_text
        );
    } else {
        eprintln!("{}", diag);
    }
}

fn dump_flags() {
    println!("BinderFlags:");
    for (name, flag) in BinderFlags::all().iter_names() {
        println!("  {:<32} {:#010x}", name, flag.bits());
    }
    println!("BindValueKind:");
    for (name, kind) in BindValueKind::all().iter_names() {
        println!("  {:<32} {:#010x}", name, kind.bits());
    }
    println!("NodeUsage:");
    for category in NodeUsage::CATEGORIES {
        println!("  {:?}", category);
        for (name, usage) in NodeUsage::constants_for(category) {
            println!("    {:<38} {:#04x}", name, usage.bits());
        }
    }
}
