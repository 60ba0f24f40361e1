//! SMA Tuner CLI Module
//!
//! Command-line interface for running searches, inspecting datasets and
//! starting the server.

use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::optimizer::{
    OptimizationResult, OptimizeDirection, Problem, ProblemConfig, SgdObjective, SlimeMould, SmaConfig,
};
use crate::utils::{DataLoader, DatasetConfig};

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn line_box_top()    { println!("  {}", dim("┌─────────────────────────────────────────────────────────┐")); }
fn line_box_bottom() { println!("  {}", dim("└─────────────────────────────────────────────────────────┘")); }
fn line_box_sep()    { println!("  {}", dim("├─────────────────────────────────────────────────────────┤")); }

fn line_box(content: &str) {
    let visible = visible_width(content);
    let pad = W.saturating_sub(visible);
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn line_box_center(content: &str) {
    let total_pad = W.saturating_sub(visible_width(content));
    let left = total_pad / 2;
    println!("  {}  {}{}{} {}", dim("│"), " ".repeat(left), content, " ".repeat(total_pad - left), dim("│"));
}

/// Printable width, skipping ANSI colour sequences
fn visible_width(s: &str) -> usize {
    let mut width = 0;
    let mut in_escape = false;
    for c in s.chars() {
        match (in_escape, c) {
            (false, '\x1b') => in_escape = true,
            (true, 'm') => in_escape = false,
            (true, _) => {}
            (false, _) => width += 1,
        }
    }
    width
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_run(msg: &str) {
    let _ = write_step(&mut std::io::stdout().lock(), msg);
}

/// Prompt stays on one line until `step_done`, so flush it now
fn write_step(out: &mut impl Write, msg: &str) -> std::io::Result<()> {
    write!(out, "  {} {}... ", accent("›"), msg)?;
    out.flush()
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "sma-tuner")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Slime mould hyperparameter search for SGD classifiers")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Tune an SGD classifier on a dataset
    Optimize {
        /// Input data file (CSV, JSON, or Parquet)
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Label column name
        #[arg(short, long)]
        target: Option<String>,

        /// Comma-separated columns to drop before training
        #[arg(long, value_delimiter = ',')]
        drop: Option<Vec<String>>,

        /// Number of epochs
        #[arg(short, long)]
        epoch: Option<usize>,

        /// Population size
        #[arg(short, long)]
        pop_size: Option<usize>,

        /// Optimizer seed
        #[arg(long)]
        seed: Option<u64>,

        /// Optimization direction: max or min
        #[arg(long)]
        minmax: Option<OptimizeDirection>,

        /// JSON run config; flags override its values
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        output: OutputFormat,

        /// Write the full result as JSON
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Show data information
    Info {
        /// Input data file
        #[arg(short, long)]
        data: PathBuf,
    },

    /// Start the web server
    Serve {
        /// Server port
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Server host
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
    },
}

/// Dataset and optimizer settings for one run, loadable from JSON
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub dataset: DatasetConfig,
    pub optimizer: SmaConfig,
    pub minmax: OptimizeDirection,
}

impl RunConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Command-line overrides applied on top of a [`RunConfig`]
#[derive(Debug, Clone, Default)]
pub struct OptimizeArgs {
    pub data: Option<PathBuf>,
    pub target: Option<String>,
    pub drop: Option<Vec<String>>,
    pub epoch: Option<usize>,
    pub pop_size: Option<usize>,
    pub seed: Option<u64>,
    pub minmax: Option<OptimizeDirection>,
    pub config: Option<PathBuf>,
    pub output: Option<OutputFormat>,
    pub save: Option<PathBuf>,
}

impl OptimizeArgs {
    /// Merge the config file (if any) with the flags
    pub fn resolve(&self) -> anyhow::Result<RunConfig> {
        let mut run = match &self.config {
            Some(path) => RunConfig::from_file(path)?,
            None => RunConfig::default(),
        };

        if let Some(data) = &self.data {
            run.dataset.path = data.clone();
        }
        if let Some(target) = &self.target {
            run.dataset.target = target.clone();
        }
        if let Some(drop) = &self.drop {
            run.dataset.drop_columns = drop.iter().filter(|c| !c.is_empty()).cloned().collect();
        }
        if let Some(epoch) = self.epoch {
            run.optimizer.epoch = epoch;
        }
        if let Some(pop_size) = self.pop_size {
            run.optimizer.pop_size = pop_size;
        }
        if let Some(seed) = self.seed {
            run.optimizer.random_state = Some(seed);
        }
        if let Some(minmax) = self.minmax {
            run.minmax = minmax;
        }

        Ok(run)
    }
}

// ─── Commands ──────────────────────────────────────────────────────────────────

/// Load, search and report. Returns the result for callers that need it.
pub fn cmd_optimize(args: &OptimizeArgs) -> anyhow::Result<OptimizationResult> {
    let run = args.resolve()?;
    let json = args.output == Some(OutputFormat::Json);

    // Reject bad settings before touching the dataset
    let optimizer = SlimeMould::new(run.optimizer.clone())?;

    if !json {
        section("Optimize");
        step_run(&format!("Loading {}", run.dataset.path.display()));
    }
    let start = Instant::now();
    let data = run.dataset.load()?;
    if !json {
        step_done(&format!(
            "{} train / {} test × {} features in {:?}",
            data.n_train(),
            data.n_test(),
            data.n_features(),
            start.elapsed()
        ));
    }

    let data = Arc::new(data);
    let problem = Problem::from_config(ProblemConfig::new()
            .with_data(Arc::clone(&data))
            .with_minmax(run.minmax))?;

    if !json {
        step_run(&format!(
            "Searching {} epochs × {} agents",
            run.optimizer.epoch, run.optimizer.pop_size
        ));
    }
    let result = optimizer.solve(&problem);
    if !json {
        step_done(&format!("{} evaluations in {:.2}s", result.n_evaluations, result.duration_secs));
    }

    if let Some(path) = &args.save {
        result.save(path)?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&result.payload())?);
    } else {
        print_result(&result);
        match SgdObjective::new(data).evaluate_metrics(&result.best_params) {
            Ok(m) => {
                println!("  {:<16} {}", muted("Precision"), format!("{:.4}", m.precision).white());
                println!("  {:<16} {}", muted("Recall"), format!("{:.4}", m.recall).white());
                println!("  {:<16} {}", muted("F1"), format!("{:.4}", m.f1_score).white());
                println!();
            }
            Err(e) => println!("  {} {}", muted("metrics unavailable:"), e.to_string().yellow()),
        }
    }

    Ok(result)
}

fn print_result(result: &OptimizationResult) {
    println!();
    println!("  {:>6} {:>14} {:>14} {:>10}", muted("Epoch"), muted("Current"), muted("Global"), muted("Explore"));
    println!("  {}", dim(&"─".repeat(48)));

    let exploration = result.history.exploration();
    for (record, explore) in result.history.records().iter().zip(exploration) {
        println!(
            "  {:>6} {:>14.4} {:>14.4} {:>9.1}%",
            record.epoch, record.current_best, record.global_best, explore
        );
    }

    println!("  {}", dim(&"─".repeat(48)));
    println!();
    println!("  {} {}", ok("best"), format!("{:.4}", result.best_fitness).white().bold());
    for (name, value) in result.best_params.iter() {
        println!("  {:<16} {}", muted(name), value.to_string().white());
    }
    println!();
}

pub fn cmd_info(data_path: &Path) -> anyhow::Result<()> {
    section("Data Info");

    let df = DataLoader::new().load_auto(data_path)?;

    println!("  {:<12} {}", muted("File"), data_path.display());
    println!("  {:<12} {}", muted("Rows"), df.height());
    println!("  {:<12} {}", muted("Columns"), df.width());
    println!("  {:<12} {:.2} MB", muted("Memory"), df.estimated_size() as f64 / 1024.0 / 1024.0);
    println!();

    println!("  {:<24} {:<12} {:>6} {:>8}", muted("Column"), muted("Type"), muted("Nulls"), muted("Unique"));
    println!("  {}", dim(&"─".repeat(54)));

    for col in df.get_columns() {
        println!(
            "  {:<24} {:<12} {:>6} {:>8}",
            col.name().as_str(),
            format!("{:?}", col.dtype()).truecolor(140, 140, 140),
            col.null_count(),
            col.n_unique().unwrap_or(0)
        );
    }

    println!();
    Ok(())
}

// ─── Serve ─────────────────────────────────────────────────────────────────────

pub async fn cmd_serve(host: &str, port: u16) -> anyhow::Result<()> {
    use crate::server::{run_server, ServerConfig};

    let config = ServerConfig {
        host: host.to_string(),
        port,
        ..Default::default()
    };

    println!();
    line_box_top();
    line_box_center(&format!("{}", "SMA Tuner".white().bold()));
    line_box_center(&format!("{}", dim(&format!("v{}", env!("CARGO_PKG_VERSION")))));
    line_box_sep();
    line_box(&kv("API     ", &format!("http://{}:{}/api", host, port)));
    line_box(&kv("Health  ", &format!("http://{}:{}/api/health", host, port)));
    line_box(&kv("Dataset ", &config.dataset.path.display().to_string()));
    line_box_sep();
    line_box_center(&format!("{}", dim("ctrl+c to stop")));
    line_box_bottom();
    println!();

    run_server(config).await
}
