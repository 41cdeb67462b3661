//! folr - First-Order Logic Resolution reasoner
//!
//! Command-line interface for asking first-order knowledge bases.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use serde_json::json;

use folr::prover::StandardizeApart;
use folr::reasoning::kb_library;
use folr::{
    parse_knowledge, parse_sentence, CnfConverter, FolError, FolResult, FolrConfig,
    InferenceResult, KnowledgeBase, LogLevel, OutputFormat, ProcedureKind, Termination,
};

#[derive(Parser)]
#[command(name = "folr")]
#[command(author = "folr authors")]
#[command(version = folr::VERSION)]
#[command(about = "First-order logic knowledge base with resolution-based inference", long_about = None)]
struct Cli {
    /// Verbose output (repeat for debug output)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only report errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file (defaults to the standard search path)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Tell the sentences of one or more files, then ask a query
    Ask {
        /// Knowledge base files, one sentence per line
        #[arg(value_name = "KB-FILE", required = true)]
        files: Vec<PathBuf>,

        /// The query sentence
        #[arg(short = 'e', long)]
        query: String,

        #[command(flatten)]
        options: AskOptions,
    },

    /// Print the clausal form of a sentence
    Cnf {
        /// The sentence to convert
        sentence: String,
    },

    /// Ask a classic knowledge base its standard query
    Demo {
        #[arg(value_enum)]
        name: Demo,

        #[command(flatten)]
        options: AskOptions,
    },

    /// Print the effective configuration
    Config {
        /// Print a commented default configuration file instead
        #[arg(long)]
        init: bool,

        /// List the available profiles
        #[arg(long)]
        profiles: bool,
    },
}

#[derive(clap::Args)]
struct AskOptions {
    /// Inference procedure
    #[arg(short, long, value_enum)]
    procedure: Option<ProcedureKind>,

    /// Named reasoning profile
    #[arg(long)]
    profile: Option<String>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Demo {
    Kings,
    Weapons,
    LovesAnimal,
    AbcEquality,
    AbcdEquality,
}

impl Demo {
    fn knowledge_base(&self) -> KnowledgeBase {
        match self {
            Demo::Kings => kb_library::kings_knowledge_base(),
            Demo::Weapons => kb_library::weapons_knowledge_base(),
            Demo::LovesAnimal => kb_library::loves_animal_knowledge_base(),
            Demo::AbcEquality => kb_library::abc_equality_knowledge_base(false),
            Demo::AbcdEquality => kb_library::abcd_equality_knowledge_base(false),
        }
    }

    fn query(&self) -> &'static str {
        match self {
            Demo::Kings => "Evil(x)",
            Demo::Weapons => "Criminal(x)",
            Demo::LovesAnimal => "Kills(Curiosity, Tuna)",
            Demo::AbcEquality => "A = C",
            Demo::AbcdEquality => "P(D)",
        }
    }
}

// ============================================================================
// Logging
// ============================================================================

/// Install the stderr logger; `RUST_LOG` still overrides the level
fn init_logging(filter: LevelFilter) {
    let _ = env_logger::Builder::new()
        .filter_level(filter)
        .parse_default_env()
        .format_timestamp(None)
        .format_target(false)
        .target(env_logger::Target::Stderr)
        .try_init();
}

fn log_level(cli: &Cli, configured: LogLevel) -> LogLevel {
    if cli.quiet {
        LogLevel::Quiet
    } else {
        match cli.verbose {
            0 => configured,
            1 => LogLevel::Verbose,
            _ => LogLevel::Debug,
        }
    }
}

// ============================================================================
// Configuration
// ============================================================================

fn load_config(path: Option<&Path>) -> Result<FolrConfig> {
    match path {
        Some(path) => {
            let mut config = FolrConfig::load_from_file(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?;
            config.apply_env_overrides();
            Ok(config)
        }
        None => FolrConfig::load().context("Failed to load configuration"),
    }
}

/// Apply the command-line overrides on top of the loaded configuration
fn apply_options(config: &mut FolrConfig, options: &AskOptions) -> FolResult<()> {
    if let Some(profile) = &options.profile {
        config.apply_profile(profile)?;
    }
    if let Some(kind) = options.procedure {
        config.reasoning.procedure = kind;
    }
    if let Some(format) = options.format {
        config.general.format = format;
    }
    Ok(())
}

// ============================================================================
// Commands
// ============================================================================

fn load_knowledge_base(files: &[PathBuf]) -> Result<KnowledgeBase> {
    let mut kb = KnowledgeBase::new();
    for path in files {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        let sentences = parse_knowledge(&content)
            .map_err(FolError::from)
            .with_context(|| format!("Parse error in {}", path.display()))?;
        kb.tell_all(sentences)
            .with_context(|| format!("Failed to tell {}", path.display()))?;
    }
    Ok(kb)
}

fn ask(mut kb: KnowledgeBase, query: &str, config: &FolrConfig) -> Result<()> {
    kb.set_procedure(config.reasoning.build_procedure());
    let result = kb
        .ask_text(query)
        .with_context(|| format!("Failed to answer query: {}", query))?;

    match config.general.format {
        OutputFormat::Text => print_text(query, kb.procedure().name(), &result),
        OutputFormat::Json => {
            let output = json!({
                "query": query,
                "procedure": kb.procedure().name(),
                "verdict": verdict(&result),
                "result": result,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

fn verdict(result: &InferenceResult) -> String {
    match (result.is_true(), result.termination()) {
        (true, Termination::Completed) => "entailed".to_string(),
        (true, Termination::ResourceLimit(limit)) => format!("entailed (partial, {} limit)", limit),
        (false, Termination::Completed) => "not entailed".to_string(),
        (false, Termination::ResourceLimit(limit)) => format!("unknown ({} limit)", limit),
    }
}

fn print_text(query: &str, procedure: &str, result: &InferenceResult) {
    println!("Query: {}", query);
    println!("Procedure: {}", procedure);
    println!("Result: {}", verdict(result));

    for (i, proof) in result.proofs().iter().enumerate() {
        println!();
        println!("Proof {} of {}:", i + 1, result.proofs().len());
        print!("{}", proof);
    }

    let stats = result.stats();
    println!();
    println!(
        "{} steps, {} generated, {} kept, {} subsumed, {} ms",
        stats.steps,
        stats.clauses_generated,
        stats.clauses_kept,
        stats.clauses_subsumed,
        stats.elapsed_ms
    );
}

fn print_cnf(text: &str) -> Result<()> {
    let sentence = parse_sentence(text)
        .map_err(FolError::from)
        .context("Failed to parse sentence")?;
    let mut ctx = StandardizeApart::for_knowledge_base();
    let cnf = CnfConverter::convert(&sentence, &mut ctx);
    for clause in cnf.clauses() {
        println!("{}", clause);
    }
    Ok(())
}

fn print_config(config: &FolrConfig, init: bool, profiles: bool) -> Result<()> {
    if init {
        print!("{}", FolrConfig::default_config_content());
    } else if profiles {
        for (name, description) in config.available_profiles() {
            println!("{:<12} {}", name, description);
        }
    } else {
        print!("{}", config.to_toml()?);
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let mut config = load_config(cli.config.as_deref())?;
    init_logging(log_level(&cli, config.general.log_level).level_filter());

    match &cli.command {
        Command::Ask {
            files,
            query,
            options,
        } => {
            apply_options(&mut config, options)?;
            let kb = load_knowledge_base(files)?;
            ask(kb, query, &config)
        }
        Command::Cnf { sentence } => print_cnf(sentence),
        Command::Demo { name, options } => {
            apply_options(&mut config, options)?;
            ask(name.knowledge_base(), name.query(), &config)
        }
        Command::Config { init, profiles } => print_config(&config, *init, *profiles),
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {:#}", err);
        let code = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<FolError>())
            .map_or(1, FolError::exit_code);
        process::exit(code);
    }
}
