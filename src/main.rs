use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use tabled::{settings::Style, Table, Tabled};

use tracklab::analysis::{ActivityAnalyzer, ActivityReport};
use tracklab::batch::{BatchAnalyzer, BatchConfig, BatchSummary};
use tracklab::config::AppConfig;
use tracklab::import::ImportManager;
use tracklab::logging::{init_logging, LogFormat, LogLevel};
use tracklab::training_plan::{PlanCatalog, SkillLevel};
use tracklab::zones::{HeartRateZones, ZoneCalculator};

/// TrackLab - Activity Analysis CLI
///
/// Summarizes recorded activities, distributes heart rate time into zones,
/// derives grade-adjusted pace, decoupling and training effect, and scores
/// sessions against training plans.
#[derive(Parser)]
#[command(name = "tracklab")]
#[command(author = "TrackLab Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Activity Analysis CLI", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log output format (pretty, json, compact)
    #[arg(long, value_name = "FORMAT", global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a single activity file (CSV, TCX, GPX, JSON)
    Analyze {
        /// Input file path
        #[arg(short, long)]
        file: PathBuf,

        /// Plan catalog (JSON or TOML) for compliance scoring
        #[arg(long, requires = "plan")]
        plans: Option<PathBuf>,

        /// Plan id within the catalog
        #[arg(long, requires_all = ["plans", "session"])]
        plan: Option<String>,

        /// Session id within the plan
        #[arg(long, requires = "plan")]
        session: Option<String>,

        /// Skill level used to scale the plan (defaults to the configured level)
        #[arg(long, value_enum)]
        level: Option<SkillLevel>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Analyze every activity file in a directory
    Batch {
        /// Directory to scan
        #[arg(short, long)]
        dir: PathBuf,

        /// Worker threads (defaults to the configured value or one per CPU)
        #[arg(short, long)]
        threads: Option<usize>,

        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show heart rate zones for the configured athlete
    Zones {
        /// Print the zones as JSON
        #[arg(long)]
        json: bool,
    },

    /// Configure application settings
    Config {
        /// List the effective configuration
        #[arg(short, long)]
        list: bool,

        /// Write a default configuration file
        #[arg(short, long)]
        init: bool,

        /// Overwrite an existing file when initializing
        #[arg(long, requires = "init")]
        force: bool,
    },
}

#[derive(Tabled)]
struct MetricRow {
    #[tabled(rename = "Metric")]
    metric: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Tabled)]
struct ZoneRow {
    #[tabled(rename = "Zone")]
    zone: u8,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Range (bpm)")]
    range: String,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Share")]
    share: String,
}

#[derive(Tabled)]
struct BatchRow {
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Distance")]
    distance: String,
    #[tabled(rename = "Moving")]
    moving: String,
    #[tabled(rename = "Avg Pace")]
    pace: String,
    #[tabled(rename = "TE")]
    training_effect: String,
    #[tabled(rename = "Status")]
    status: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(AppConfig::default_config_path);
    // `config --init` must work before the file exists
    let init_only = matches!(cli.command, Commands::Config { init: true, .. });
    let config = match &cli.config {
        Some(path) if !init_only => AppConfig::load_from_file(path)?,
        Some(_) => AppConfig::default(),
        None => AppConfig::load_or_default(),
    };

    let mut log_config = config.logging.clone();
    if cli.verbose > 0 {
        log_config.level = LogLevel::from_verbosity(cli.verbose);
    }
    if let Some(format) = cli.log_format {
        log_config.format = format;
    }
    init_logging(&log_config)?;

    match cli.command {
        Commands::Analyze {
            file,
            plans,
            plan,
            session,
            level,
            json,
        } => {
            let analyzer = ActivityAnalyzer::from_config(&config);
            let manager = ImportManager::new();

            let mut report = analyzer
                .analyze_file(&manager, &file)
                .map_err(|e| anyhow::anyhow!(e.user_message()))
                .with_context(|| format!("Failed to analyze {}", file.display()))?;

            if let (Some(plans_path), Some(plan_id), Some(session_id)) = (plans, plan, session) {
                let catalog = PlanCatalog::load_from_file(&plans_path)?;
                let template = catalog
                    .get(&plan_id)
                    .with_context(|| format!("Plan '{}' not found in {}", plan_id, plans_path.display()))?;
                let scaled = catalog.scaled(template, level.unwrap_or(config.skill_level));
                let planned = scaled
                    .session(&session_id)
                    .with_context(|| format!("Session '{}' not found in plan '{}'", session_id, plan_id))?;
                analyzer.evaluate(&mut report, planned);
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }

        Commands::Batch {
            dir,
            threads,
            no_progress,
            json,
        } => {
            let analyzer = ActivityAnalyzer::from_config(&config);
            let batch = BatchAnalyzer::new(
                analyzer,
                BatchConfig {
                    threads: threads.or(config.import.threads),
                    show_progress: !no_progress && !json,
                },
            );

            let summary = batch
                .analyze_directory(&dir)
                .with_context(|| format!("Batch analysis of {} failed", dir.display()))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_batch(&summary);
            }
        }

        Commands::Zones { json } => {
            let zones = ZoneCalculator::calculate_heart_rate_zones(&config.athlete)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&zones)?);
            } else {
                println!(
                    "{}",
                    format!(
                        "Heart rate zones ({:?}, max {} / rest {})",
                        config.athlete.method, config.athlete.max_hr, config.athlete.resting_hr
                    )
                    .cyan()
                    .bold()
                );
                print_zones(&zones);
            }
        }

        Commands::Config { list, init, force } => {
            if init {
                if config_path.exists() && !force {
                    anyhow::bail!(
                        "Config file already exists: {} (use --force to overwrite)",
                        config_path.display()
                    );
                }
                let mut fresh = AppConfig::default();
                fresh.save_to_file(&config_path)?;
                println!(
                    "{}",
                    format!("✓ Wrote default configuration to {}", config_path.display()).green()
                );
            } else if list {
                println!("{}", format!("# {}", config_path.display()).dimmed());
                println!("{}", toml::to_string_pretty(&config)?);
            } else {
                println!("Config file: {}", config_path.display());
                println!("Use --list to show settings or --init to create the file.");
            }
        }
    }

    Ok(())
}

fn format_pace(secs_per_km: f64) -> String {
    if secs_per_km <= 0.0 || !secs_per_km.is_finite() {
        return "-".to_string();
    }
    let total = secs_per_km.round() as u64;
    format!("{}:{:02} /km", total / 60, total % 60)
}

fn format_duration(secs: f64) -> String {
    let total = secs.max(0.0).round() as u64;
    format!("{}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
}

fn print_report(report: &ActivityReport) {
    let trace = &report.trace;
    let summary = &trace.summary;

    println!("{}", format!("✓ {}", trace.name).green().bold());
    println!(
        "{}",
        format!("  {} · {} samples · {}", trace.id, trace.points.len(), trace.start_time).dimmed()
    );

    let optional = |value: Option<f64>, fmt: fn(f64) -> String| value.map(fmt).unwrap_or_else(|| "n/a".to_string());

    let mut rows = vec![
        MetricRow { metric: "Distance", value: format!("{:.2} km", summary.total_distance / 1000.0) },
        MetricRow { metric: "Elapsed time", value: format_duration(summary.elapsed_time) },
        MetricRow { metric: "Moving time", value: format_duration(summary.moving_time) },
        MetricRow { metric: "Movement ratio", value: format!("{:.1}%", summary.movement_ratio) },
        MetricRow { metric: "Avg pace", value: format_pace(summary.avg_pace) },
        MetricRow { metric: "Max pace", value: format_pace(summary.max_pace) },
        MetricRow { metric: "Grade-adjusted pace", value: optional(summary.grade_adjusted_pace, format_pace) },
        MetricRow { metric: "Avg / max HR", value: format!("{} / {} bpm", summary.avg_heart_rate, summary.max_heart_rate) },
        MetricRow { metric: "Ascent / descent", value: format!("{:.0} / {:.0} m", summary.total_ascent, summary.total_descent) },
        MetricRow { metric: "VAM", value: format!("{:.0} m/h", summary.vam) },
        MetricRow { metric: "Calories", value: summary.calories.to_string() },
        MetricRow { metric: "Fitness score", value: summary.fitness_score.to_string() },
        MetricRow { metric: "Intensity factor", value: format!("{:.2}", summary.intensity_factor) },
        MetricRow { metric: "Aerobic efficiency", value: format!("{:.2}", summary.aerobic_efficiency) },
        MetricRow { metric: "Decoupling", value: optional(summary.decoupling, |d| format!("{:.1}%", d)) },
    ];

    if let (Some(te), Some(level)) = (summary.training_effect, report.training_effect_level()) {
        rows.push(MetricRow {
            metric: "Training effect",
            value: format!("{:.1} ({})", te, level.description()),
        });
    }

    println!("{}", Table::new(rows).with(Style::rounded()));

    if report.distribution.total_seconds > 0.0 {
        println!("{}", "Time in zones".cyan().bold());
        let zone_rows: Vec<ZoneRow> = report
            .distribution
            .zones
            .iter()
            .map(|z| ZoneRow {
                zone: z.zone,
                label: z.label.clone(),
                range: format!("{:.0}-{:.0}", z.min, z.max),
                time: format_duration(z.seconds),
                share: format!("{:.1}%", z.percentage),
            })
            .collect();
        println!("{}", Table::new(zone_rows).with(Style::rounded()));
    }

    if let Some(compliance) = &summary.compliance {
        let line = format!("Compliance: {} - {}", compliance.score, compliance.notes);
        if compliance.score > 85 {
            println!("{}", line.green().bold());
        } else {
            println!("{}", line.yellow().bold());
        }
    }
}

fn print_zones(zones: &HeartRateZones) {
    let rows: Vec<ZoneRow> = zones
        .zones
        .iter()
        .map(|z| ZoneRow {
            zone: z.zone,
            label: z.label.clone(),
            range: format!("{:.1}-{:.1}", z.min, z.max),
            time: "-".to_string(),
            share: "-".to_string(),
        })
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()));
}

fn print_batch(summary: &BatchSummary) {
    let rows: Vec<BatchRow> = summary
        .results
        .iter()
        .map(|result| {
            let file = result
                .file_path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();

            match &result.report {
                Some(report) => {
                    let s = &report.trace.summary;
                    BatchRow {
                        file,
                        distance: format!("{:.2} km", s.total_distance / 1000.0),
                        moving: format_duration(s.moving_time),
                        pace: format_pace(s.avg_pace),
                        training_effect: s
                            .training_effect
                            .map(|te| format!("{:.1}", te))
                            .unwrap_or_else(|| "-".to_string()),
                        status: "ok".to_string(),
                    }
                }
                None => BatchRow {
                    file,
                    distance: "-".to_string(),
                    moving: "-".to_string(),
                    pace: "-".to_string(),
                    training_effect: "-".to_string(),
                    status: result.error.clone().unwrap_or_else(|| "failed".to_string()),
                },
            }
        })
        .collect();

    if !rows.is_empty() {
        println!("{}", Table::new(rows).with(Style::rounded()));
    }

    let headline = summary.to_string_pretty();
    if summary.is_fully_successful() {
        println!("{}", headline.green());
    } else {
        println!("{}", headline.yellow());
        for (path, error) in summary.errors() {
            println!("{}", format!("✗ {}: {}", path.display(), error).red());
        }
    }
}
