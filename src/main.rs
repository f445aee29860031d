//! Binary entry point for hoplite.
//!
//! This binary provides the CLI for the hoplite deck linter.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr/print_stdout in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]

use clap::{Parser, Subcommand};
use hoplite::analysis::TagSchema;
use hoplite::config::{BackendKind, HopliteConfig};
use hoplite::deck::{FieldMap, build_from_export};
use hoplite::detect::analyze_deck_internal;
use hoplite::io::{read_candidates, render_summary, write_report_file};
use hoplite::lemma::{HttpLemmaBackend, LemmaProvider, LexiconBackend};
use hoplite::lint::{CardReport, LintOptions, lint_candidates};
use hoplite::stopwords::StopWords;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Hoplite - duplicate-detection linter for Ancient Greek Anki decks.
#[derive(Parser)]
#[command(name = "hoplite")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Analyze candidate cards for duplicates against the reference deck.
    Lint {
        /// Path to the candidate file (columns: front, back, tags).
        #[arg(short, long)]
        input: PathBuf,

        /// Path to the output CSV report.
        #[arg(short, long)]
        out: PathBuf,

        /// Tag schema JSON; enables tag hygiene checks.
        #[arg(long)]
        tag_schema: Option<PathBuf>,

        /// Apply the schema's auto-tagging rules.
        #[arg(long, requires = "tag_schema")]
        auto_tag: bool,

        /// Score cloze quality per card.
        #[arg(long)]
        check_cloze: bool,

        /// Classify context richness per card.
        #[arg(long)]
        check_context: bool,

        /// Suggest cloze conversions per card.
        #[arg(long)]
        recommend_cloze: bool,

        /// Skip the intra-batch self-duplicate check.
        #[arg(long)]
        no_self_check: bool,
    },

    /// Self-check the reference deck for internal duplicates.
    CheckDeck {
        /// Optional CSV report path.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Show deck index and backend status.
    Status,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => match HopliteConfig::load_from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("error: {e}");
                return ExitCode::FAILURE;
            },
        },
        None => HopliteConfig::load_default(),
    };

    let result = match cli.command {
        Commands::Lint {
            input,
            out,
            tag_schema,
            auto_tag,
            check_cloze,
            check_context,
            recommend_cloze,
            no_self_check,
        } => cmd_lint(
            config,
            input,
            out,
            tag_schema,
            LintFlags {
                auto_tag,
                check_cloze,
                check_context,
                recommend_cloze,
                no_self_check,
            },
        ),
        Commands::CheckDeck { out } => cmd_check_deck(config, out),
        Commands::Status => cmd_status(config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        },
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("hoplite=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hoplite=info"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Boolean lint toggles, grouped to keep `cmd_lint` readable.
struct LintFlags {
    auto_tag: bool,
    check_cloze: bool,
    check_context: bool,
    recommend_cloze: bool,
    no_self_check: bool,
}

/// Builds the lemma provider from configuration.
fn build_lemma_provider(config: &HopliteConfig) -> anyhow::Result<LemmaProvider> {
    let mut provider = LemmaProvider::new();

    match config.backend.kind {
        BackendKind::None => {},
        BackendKind::Lexicon => {
            let path = config.backend.lexicon_path.as_deref().ok_or_else(|| {
                anyhow::anyhow!("backend kind 'lexicon' requires backend.lexicon_path")
            })?;
            provider = provider.with_backend(Box::new(LexiconBackend::load(path)?));
        },
        BackendKind::Http => {
            let url = config
                .backend
                .url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("backend kind 'http' requires backend.url"))?;
            provider = provider.with_backend(Box::new(HttpLemmaBackend::new(
                url,
                Duration::from_secs(config.backend.timeout_secs),
            )?));
        },
    }

    if let Some(path) = &config.lemma_cache_path {
        provider = provider.with_cache_path(path);
    }
    if let Some(path) = &config.lemma_overrides_path {
        provider = provider.with_overrides_path(path)?;
    }
    if let Some(path) = &config.stopwords_path {
        provider = provider.with_stopwords_path(path);
    }

    Ok(provider)
}

/// Lint command.
fn cmd_lint(
    config: HopliteConfig,
    input: PathBuf,
    out: PathBuf,
    tag_schema: Option<PathBuf>,
    flags: LintFlags,
) -> anyhow::Result<()> {
    let provider = build_lemma_provider(&config)?;
    let field_map = FieldMap::load(&config.field_map_path)?;
    let deck = build_from_export(&config.export_path, &field_map, Some(&provider));
    let candidates = read_candidates(&input)?;
    let stopwords = config
        .stopwords_path
        .as_deref()
        .map_or_else(StopWords::empty, StopWords::load);

    let options = LintOptions {
        tag_schema: tag_schema.as_deref().map(TagSchema::load).transpose()?,
        auto_tag: flags.auto_tag,
        check_cloze: flags.check_cloze,
        check_context: flags.check_context,
        recommend_cloze: flags.recommend_cloze,
        skip_self_check: flags.no_self_check,
    };

    let reports = lint_candidates(&candidates, &deck, &provider, &stopwords, &options);

    write_report_file(&out, &reports)?;
    provider.save_cache();

    print!("{}", render_summary(&reports));
    println!();
    println!("Wrote report: {}", out.display());
    Ok(())
}

/// Check-deck command.
fn cmd_check_deck(config: HopliteConfig, out: Option<PathBuf>) -> anyhow::Result<()> {
    let provider = build_lemma_provider(&config)?;
    let field_map = FieldMap::load(&config.field_map_path)?;
    let deck = build_from_export(&config.export_path, &field_map, Some(&provider));

    let duplicates = analyze_deck_internal(&deck, &provider);
    provider.save_cache();

    if duplicates.is_empty() {
        println!("No internal duplicates found ({} notes checked).", deck.len());
        return Ok(());
    }

    let reports: Vec<CardReport> = duplicates
        .into_iter()
        .map(|detection| CardReport {
            detection,
            self_duplicate: None,
            tags: None,
            cloze: None,
            context: None,
            recommendation: None,
        })
        .collect();

    for report in &reports {
        println!(
            "{:>6}  {}  ->  {}",
            report.detection.warning_level.as_str(),
            report.detection.front,
            report.detection.matched_note_ids
        );
    }
    println!();
    println!(
        "{} of {} notes have internal duplicates.",
        reports.len(),
        deck.len()
    );

    if let Some(path) = out {
        write_report_file(&path, &reports)?;
        println!("Wrote report: {}", path.display());
    }
    Ok(())
}

/// Status command.
fn cmd_status(config: HopliteConfig) -> anyhow::Result<()> {
    let provider = build_lemma_provider(&config)?;
    let field_map = FieldMap::load(&config.field_map_path)?;
    let deck = build_from_export(&config.export_path, &field_map, Some(&provider));

    println!("Hoplite Status");
    println!("==============");
    println!();
    println!("Reference export: {}", config.export_path.display());
    println!("Notes indexed: {}", deck.len());
    println!("  Exact-Greek keys: {}", deck.exact_key_count());
    println!("  Lemma keys:       {}", deck.lemma_key_count());
    println!("  Gloss keys:       {}", deck.gloss_key_count());
    println!();
    println!("Lemma backend: {}", provider.backend_name());
    println!("Cached lemmas: {}", provider.cache_len());
    println!(
        "Cache file: {}",
        config
            .lemma_cache_path
            .as_deref()
            .map_or_else(|| "(disabled)".to_string(), |p| p.display().to_string())
    );
    Ok(())
}
