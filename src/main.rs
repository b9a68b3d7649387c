//! ATS scorer: resume ATS compatibility scoring tool

use anyhow::{bail, Context};
use ats_scorer::analyzer::{analyze_batch, build_analyzer, ResumeAnalyzer, ResumeInput};
use ats_scorer::cli::{Cli, Commands, ConfigAction};
use ats_scorer::config::{Config, OutputFormat};
use ats_scorer::error::AtsError;
use ats_scorer::input::InputManager;
use ats_scorer::output::formatter::{report_destinations, save_report_to_file, ReportGenerator};
use ats_scorer::output::report::{AnalysisMethod, AnalysisReport};
use ats_scorer::processing::taxonomy::{Formula, KeywordGroup};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    // Load configuration
    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {:#}", e);
            process::exit(1);
        }
    };

    // Execute command
    if let Err(e) = run_command(cli.command, config, cli.config).await {
        error!("Command failed: {:#}", e);
        process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Could not read config file {}", path.display())),
        None => Ok(Config::load()?),
    }
}

async fn run_command(command: Commands, config: Config, config_path: Option<PathBuf>) -> anyhow::Result<()> {
    match command {
        Commands::Score {
            files,
            method,
            no_fallback,
            output,
            save,
            detailed,
            jobs,
        } => {
            let mut config = config;
            if let Some(method) = method {
                config.analyzer.method = method;
            }
            if no_fallback {
                config.analyzer.fallback_to_keyword = false;
            }
            if let Some(jobs) = jobs {
                if jobs == 0 {
                    return Err(AtsError::InvalidInput("--jobs must be at least 1".to_string()).into());
                }
                config.analyzer.concurrency = jobs;
            }
            let format = output.unwrap_or(config.output.format);
            let detailed = detailed || config.output.detailed;

            score_files(&files, &config, format, detailed, save.as_deref()).await
        }

        Commands::Taxonomy { group } => {
            print_taxonomy(&config, group)?;
            Ok(())
        }

        Commands::Config { action } => {
            let path = config_path.unwrap_or_else(Config::config_path);
            match action {
                Some(ConfigAction::Show) | None => {
                    println!("⚙️  Current Configuration ({})\n", path.display());
                    print!("{}", config.to_toml()?);
                }

                Some(ConfigAction::Reset) => {
                    println!("🔄 Resetting configuration to defaults...");
                    Config::default()
                        .save_to(&path)
                        .with_context(|| format!("Could not write {}", path.display()))?;
                    println!("✅ Configuration reset successfully!");
                }

                Some(ConfigAction::Path) => {
                    println!("{}", path.display());
                }
            }
            Ok(())
        }
    }
}

async fn score_files(
    files: &[PathBuf],
    config: &Config,
    format: OutputFormat,
    detailed: bool,
    save: Option<&Path>,
) -> anyhow::Result<()> {
    let taxonomy = Arc::new(config.build_taxonomy()?);
    let analyzer = build_analyzer(config, Arc::clone(&taxonomy))?;
    info!(
        "Scoring {} resume(s) with the {} analyzer",
        files.len(),
        analyzer.method()
    );

    let progress = ProgressBar::new(files.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .context("Invalid progress bar template")?
            .progress_chars("=> "),
    );

    let input_manager = InputManager::new();
    let mut pending = Vec::new();
    let mut slots: Vec<Option<AtsError>> = Vec::with_capacity(files.len());
    for path in files {
        progress.set_message(format!("extracting {}", path.display()));
        match input_manager.extract_file(path).await {
            Ok(document) => {
                pending.push(ResumeInput::new(document.text, document.source_format));
                slots.push(None);
            }
            Err(e) => slots.push(Some(e)),
        }
        progress.inc(1);
    }

    progress.set_message(match analyzer.method() {
        AnalysisMethod::Keyword => "scoring".to_string(),
        AnalysisMethod::Generative => "waiting for the model".to_string(),
    });
    progress.enable_steady_tick(Duration::from_millis(120));
    let mut analyzed = analyze_batch(analyzer, pending, config.analyzer.concurrency)
        .await
        .into_iter();
    progress.finish_and_clear();

    let results: Vec<Result<AnalysisReport, AtsError>> = slots
        .into_iter()
        .map(|slot| match slot {
            Some(e) => Err(e),
            None => analyzed.next().unwrap_or_else(|| {
                Err(AtsError::ScoringInternal("batch returned fewer results than inputs".to_string()))
            }),
        })
        .collect();

    let generator = ReportGenerator::with_options(&taxonomy, config.output.color_output, detailed, true);
    let destinations = save.map(|target| report_destinations(target, files, &format));
    let mut failures = 0;
    for (index, (path, result)) in files.iter().zip(results).enumerate() {
        let report = match result {
            Ok(report) => report,
            Err(e) => {
                error!("{}: {}", path.display(), e);
                failures += 1;
                continue;
            }
        };

        let rendered = generator.generate_report(&report, &format)?;
        if let Some(destination) = destinations.as_ref().and_then(|d| d.get(index)) {
            save_report_to_file(&rendered, destination)
                .with_context(|| format!("Could not save report to {}", destination.display()))?;
            println!("💾 {} → {}", path.display(), destination.display());
        } else {
            if format == OutputFormat::Console && files.len() > 1 {
                println!("\n📄 {}", path.display());
            }
            println!("{}", rendered);
        }
    }

    if failures > 0 {
        bail!("{} of {} resume(s) could not be scored", failures, files.len());
    }
    Ok(())
}

fn print_taxonomy(config: &Config, group: Option<KeywordGroup>) -> anyhow::Result<()> {
    let taxonomy = config.build_taxonomy()?;

    println!("📚 Keyword taxonomy ({} keywords)\n", taxonomy.keyword_count());
    for category in taxonomy
        .categories()
        .iter()
        .filter(|c| group.map_or(true, |g| g == c.group))
    {
        println!("{} ({})", category.group, category.keywords.len());
        println!("  {}\n", category.keywords.terms().join(", "));
    }

    if group.is_none() {
        println!("⚖️  Scoring weights");
        for rule in taxonomy.rules() {
            let formula = match &rule.formula {
                Formula::HitRatio { groups, divisor } => {
                    let names: Vec<&str> = groups.iter().map(|g| g.as_str()).collect();
                    format!("keyword hits in {} / {}", names.join(", "), divisor)
                }
                Formula::SectionPresence { points_per_section } => {
                    format!("{} points per section present", points_per_section)
                }
                Formula::Quantified {
                    per_percentage,
                    per_number,
                    number_limit,
                } => format!(
                    "{} per percentage, {} per number (up to {})",
                    per_percentage, per_number, number_limit
                ),
                Formula::Length(bands) => format!(
                    "{}-{} words optimal, +{} above {} lines",
                    bands.optimal_min_words, bands.optimal_max_words, bands.line_bonus, bands.line_threshold
                ),
            };
            println!("  {:<18} {:>3}  {}", rule.category.label(), rule.max_weight, formula);
        }
    }

    Ok(())
}
