//! Flexion CLI - interpret wiki-style inflection tables into tagged word forms

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Read, Write};

#[cfg(feature = "cli")]
use flexion::{
    diagnostics::{Diagnostic, DiagnosticLevel},
    extract_forms, Engine, FormRecord, RuleTable, ScanOptions, TableNode, TagVocab,
};

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "flexion")]
#[command(version)]
#[command(about = "Flexion - inflection table interpretation engine", long_about = None)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input JSON file with a table or a list of tables (reads from stdin if not provided)
    input_file: Option<String>,

    /// Headword the table inflects
    #[arg(short, long, default_value = "")]
    word: String,

    /// Language of the table
    #[arg(short, long, default_value = "English")]
    lang: String,

    /// Part of speech of the headword
    #[arg(short, long, default_value = "noun")]
    pos: String,

    /// Name of the template the table was expanded from
    #[arg(short, long)]
    template: Option<String>,

    /// Extra rule table in JSON format, merged over the built-in rules
    #[arg(short, long)]
    rules: Option<String>,

    /// Output file path (writes to stdout if not provided)
    #[arg(short, long)]
    output: Option<String>,

    /// Pretty print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Strict mode: exit with an error if any diagnostics occur
    #[arg(long)]
    strict: bool,

    /// Quiet mode: suppress diagnostic output to stderr
    #[arg(short, long)]
    quiet: bool,

    /// Use colored diagnostic output
    #[arg(long, default_value_t = true)]
    color: bool,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Validate an external rule table against the built-in tag vocabulary
    Validate {
        /// Rule table JSON file
        input: Option<String>,
    },

    /// Show version and feature info
    Info,
}

/// Accepts either a single table object or an array of tables.
#[cfg(feature = "cli")]
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum TableInput {
    One(TableNode),
    Many(Vec<TableNode>),
}

#[cfg(feature = "cli")]
fn main() -> io::Result<()> {
    let cli = Cli::parse();

    if let Some(cmd) = cli.command {
        return handle_subcommand(cmd);
    }

    let input = read_input(cli.input_file.as_deref())?;

    let tables = match serde_json::from_str::<TableInput>(&input) {
        Ok(TableInput::One(table)) => vec![table],
        Ok(TableInput::Many(tables)) => tables,
        Err(e) => {
            eprintln!("Error: invalid table JSON: {}", e);
            std::process::exit(1);
        }
    };

    let mut engine = Engine::new();
    if let Some(ref path) = cli.rules {
        let data = fs::read_to_string(path)?;
        if let Err(errors) = engine.rules_mut().load_json(&data) {
            eprintln!("Error: invalid rule table {}:", path);
            for e in &errors {
                eprintln!("  {}", e);
            }
            std::process::exit(1);
        }
    }

    let mut opts = ScanOptions::new(&cli.word, &cli.lang, &cli.pos);
    if let Some(ref template) = cli.template {
        opts = opts.with_template(template);
    }

    let mut forms: Vec<FormRecord> = Vec::new();
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    for table in &tables {
        let out = extract_forms(&engine, table, &opts);
        forms.extend(out.forms);
        diagnostics.extend(out.diagnostics);
    }

    if !cli.quiet && !diagnostics.is_empty() {
        print_diagnostics_to_stderr(&diagnostics, cli.color);
    }

    if cli.strict && !diagnostics.is_empty() {
        eprintln!("Error: {} diagnostic(s) in strict mode", diagnostics.len());
        std::process::exit(1);
    }

    let result = if cli.pretty {
        serde_json::to_string_pretty(&forms)?
    } else {
        serde_json::to_string(&forms)?
    };

    match cli.output {
        Some(path) => {
            let mut file = fs::File::create(&path)?;
            writeln!(file, "{}", result)?;
            if diagnostics.is_empty() {
                eprintln!("✓ {} form(s) written to: {}", forms.len(), path);
            } else {
                eprintln!(
                    "⚠ {} form(s) written to: {} ({} diagnostic(s))",
                    forms.len(),
                    path,
                    diagnostics.len()
                );
            }
        }
        None => {
            println!("{}", result);
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn handle_subcommand(cmd: Commands) -> io::Result<()> {
    match cmd {
        Commands::Validate { input } => {
            let data = read_input(input.as_deref())?;

            let mut rules = RuleTable::new();
            if let Err(errors) = rules.load_json(&data) {
                eprintln!("✗ rule table did not parse:");
                for e in &errors {
                    eprintln!("  {}", e);
                }
                std::process::exit(1);
            }

            match rules.validate(&TagVocab::builtin()) {
                Ok(()) => {
                    println!("✓ {} rule(s) valid", rules.len());
                }
                Err(errors) => {
                    for e in &errors {
                        eprintln!("✗ {}", e);
                    }
                    std::process::exit(1);
                }
            }
        }

        Commands::Info => {
            println!("Flexion - inflection table interpretation engine");
            println!("Version: {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Features:");
            println!("  ✓ Rowspan/colspan grid expansion with nested tables");
            println!("  ✓ Header classification via longest-match rule tables");
            println!("  ✓ Column and row header span tracking");
            println!("  ✓ Form splitting with romanization and IPA extraction");
            println!("  ✓ Footnote definition decoding");
            println!("  ✓ Per-language interpretation policies");
            println!();
            println!("Repository: https://github.com/flexion-nlp/flexion");
            println!();
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn read_input(path: Option<&str>) -> io::Result<String> {
    match path {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

/// Print diagnostics to stderr with optional color coding.
#[cfg(feature = "cli")]
fn print_diagnostics_to_stderr(diagnostics: &[Diagnostic], use_color: bool) {
    eprintln!();
    eprintln!(
        "{}Diagnostics ({}):{}",
        if use_color { "\x1b[33m" } else { "" },
        diagnostics.len(),
        if use_color { "\x1b[0m" } else { "" }
    );
    eprintln!();

    for diag in diagnostics {
        let color = if use_color {
            match diag.level {
                DiagnosticLevel::Error => "\x1b[31m",
                DiagnosticLevel::Warning => "\x1b[33m",
                DiagnosticLevel::Info => "\x1b[36m",
            }
        } else {
            ""
        };
        let reset = if use_color { "\x1b[0m" } else { "" };
        eprintln!("  {}{}{}", color, diag, reset);
    }
    eprintln!();
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Build with --features cli");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  cargo install flexion --features cli");
    eprintln!("  flexion [OPTIONS] [INPUT_FILE]");
}
