//! # Pier Monitor CLI
//!
//! Command-line front end for `pier_core`: list stages and reading dates,
//! analyze one stage, export the stage history or a stress field, and dump
//! the active configuration.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use pier_core::actual::parse_timestamp;
use pier_core::analysis::{ActualStatus, PierAnalysis, PierOutcome};
use pier_core::file_io::{export_history_csv, export_mesh_csv, load_config, save_config, save_report_json};
use pier_core::{MonitorConfig, Session, StageSelection};
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info")]
    log_level: tracing::Level,

    /// Internal-force table (CSV)
    #[arg(long, default_value = "data/data_gaya.csv")]
    loads: PathBuf,

    /// Actual strain-gauge readings (CSV); a missing file is not an error
    #[arg(long, default_value = "data/data_gaya_aktual.csv")]
    actual: PathBuf,

    /// Configuration file (JSON); built-in piers are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Concrete compressive strength f'c (MPa)
    #[arg(long)]
    fc: Option<f64>,

    /// Mesh coarseness (max element area = length × coarseness)
    #[arg(long)]
    mesh: Option<f64>,

    /// Default stage when --stage is omitted: first, last, index:<n> or stage:<name>
    #[arg(long)]
    stage_policy: Option<StageSelection>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List construction stages in load-table order
    Stages,
    /// List reading timestamps, newest first
    Dates,
    /// Analyze every pier at one stage
    Analyze {
        /// Stage name (defaults to the configured stage policy)
        #[arg(long)]
        stage: Option<String>,
        /// Compare against readings at this timestamp
        #[arg(long)]
        date: Option<String>,
        /// Also write the full results as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Theoretical gauge values across all stages
    History {
        /// Write the rows as CSV
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Export the node-level stress field of one pier
    Mesh {
        /// Pier name or short name (e.g. P3A)
        #[arg(long)]
        pier: String,
        #[arg(long)]
        stage: Option<String>,
        #[arg(long)]
        nodes: PathBuf,
        #[arg(long)]
        triangles: PathBuf,
    },
    /// Print the active configuration, or save it
    Config {
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("warning: a tracing subscriber was already installed");
    }

    if let Err(e) = run(cli) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => load_config(path).with_context(|| format!("loading {}", path.display()))?,
        None => MonitorConfig::default(),
    };
    if let Some(fc) = cli.fc {
        config.settings.compressive_strength_mpa = fc;
    }
    if let Some(mesh) = cli.mesh {
        config.settings.mesh_coarseness = mesh;
    }
    if let Some(policy) = cli.stage_policy {
        config.settings.stage_selection = policy;
    }

    let (loads, actual) = (cli.loads, cli.actual);
    let open_session = |config: MonitorConfig| -> anyhow::Result<Session> {
        Session::open(config, &loads, Some(actual.as_path()))
            .with_context(|| format!("opening load table {}", loads.display()))
    };

    match cli.command {
        Commands::Config { out } => match out {
            Some(path) => {
                save_config(&config, &path)?;
                info!(path = %path.display(), "configuration saved");
            }
            None => println!("{}", serde_json::to_string_pretty(&config)?),
        },
        Commands::Stages => {
            let session = open_session(config)?;
            let default = session.default_stage().map(str::to_string);
            for stage in session.stages() {
                let marker = if Some(stage) == default.as_ref() { " *" } else { "" };
                println!("{stage}{marker}");
            }
        }
        Commands::Dates => {
            let timestamps = open_session(config)?.timestamps();
            if timestamps.is_empty() {
                println!("No actual readings available");
            }
            for ts in timestamps {
                println!("{}", ts.format("%Y-%m-%d %H:%M:%S"));
            }
        }
        Commands::Analyze { stage, date, json } => {
            let mut session = open_session(config)?;
            let stage = resolve_stage(&session, stage)?;
            let timestamp = match date {
                Some(d) => Some(parse_timestamp(&d).ok_or_else(|| anyhow!("unrecognized date '{d}'"))?),
                None => None,
            };

            let outcomes = session.analyze(&stage, timestamp)?;
            println!("Stage {stage}");
            for outcome in &outcomes {
                print_outcome(outcome);
            }
            if let Some(path) = json {
                save_report_json(&outcomes, &path)?;
                info!(path = %path.display(), "analysis saved");
            }
        }
        Commands::History { out } => {
            let mut session = open_session(config)?;
            let report = session.history()?;
            for skip in &report.skipped {
                info!(stage = %skip.stage, pier = %skip.pier, reason = ?skip.reason, "skipped");
            }
            match out {
                Some(path) => export_history_csv(&report, &path)?,
                None => {
                    println!("Stage\tPier\tSG\tStress (MPa)\tStrain (με)");
                    for r in &report.rows {
                        println!(
                            "{}\t{}\t{}\t{:.4}\t{:.2}",
                            r.stage, r.pier, r.sensor, r.stress_mpa, r.strain_ue
                        );
                    }
                }
            }
            println!(
                "{} rows, {} stage/pier pairs skipped",
                report.rows.len(),
                report.skipped.len()
            );
        }
        Commands::Mesh {
            pier,
            stage,
            nodes,
            triangles,
        } => {
            let mut session = open_session(config)?;
            let stage = resolve_stage(&session, stage)?;
            let mesh = session.mesh(&pier, &stage)?;
            export_mesh_csv(&mesh, &nodes, &triangles)?;
        }
    }

    Ok(())
}

fn resolve_stage(session: &Session, requested: Option<String>) -> anyhow::Result<String> {
    match requested {
        Some(stage) => Ok(stage),
        None => match session.default_stage() {
            Some(stage) => Ok(stage.to_string()),
            None => bail!("the load table has no stages"),
        },
    }
}

fn print_outcome(outcome: &PierOutcome) {
    match outcome {
        PierOutcome::Analyzed(a) => print_analysis(a),
        PierOutcome::MissingLoad { pier, stage } => {
            println!();
            println!("{pier}: no load data at stage {stage}");
        }
        PierOutcome::Failed { pier, error } => {
            println!();
            println!("{pier}: {error}");
        }
    }
}

fn print_analysis(a: &PierAnalysis) {
    println!();
    println!("═══════════════════════════════════════");
    println!("  {} ({})  part {}", a.pier, a.short_name, a.load.part);
    println!("═══════════════════════════════════════");
    println!(
        "  P = {:.2} kN   My = {:.2} kN·m   Mz = {:.2} kN·m",
        a.load.axial_kn, a.load.moment_y_knm, a.load.moment_z_knm
    );
    println!(
        "  σ  min {:.4}  max {:.4}  mean {:.4} MPa   ({} nodes)",
        a.stress_stats.min, a.stress_stats.max, a.stress_stats.mean, a.node_count
    );
    println!(
        "  ε  min {:.2}  max {:.2}  mean {:.2} με",
        a.strain_stats.min, a.strain_stats.max, a.strain_stats.mean
    );

    match &a.actual {
        ActualStatus::NotRequested => {}
        ActualStatus::NoData { timestamp } => println!("  No readings at {timestamp}"),
        ActualStatus::Available { snapshot } => println!("  Readings at {}", snapshot.timestamp),
    }

    println!("  Gauge     (x, y) mm          σ MPa      ε theory   ε actual   Δ");
    for (t, c) in a.theoretical.iter().zip(&a.comparison) {
        println!(
            "  {:<8}  ({:>6.0}, {:>6.0})  {:>9.4}  {:>9.2}  {:>9}  {:>9}",
            t.sensor,
            t.x,
            t.y,
            t.stress_mpa,
            t.strain_ue,
            fmt_opt(c.actual_strain_ue),
            fmt_opt(c.deviation_ue)
        );
    }
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(|v| format!("{v:.2}")).unwrap_or_else(|| "-".to_string())
}
