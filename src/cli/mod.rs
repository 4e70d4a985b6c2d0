//! loanrisk command-line interface
//!
//! Train, predict, summarize and serve against a local artifact directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand};
use colored::*;
use serde_json::Value;

use crate::config::PipelineConfig;
use crate::data::{DataLoader, RawRecord};
use crate::inference::{InferenceDispatcher, ModelKind};
use crate::reports::{report_summary, ModelReport};
use crate::storage::{ArtifactStore, LocalStore};
use crate::training::TrainEngine;

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
    let visible_len = strip_ansi(content).chars().count();
    let pad = W.saturating_sub(visible_len);
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn line_box_center(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let total_pad = W.saturating_sub(visible_len);
    let left = total_pad / 2;
    let right = total_pad - left;
    println!("  {}  {}{}{} {}", dim("│"), " ".repeat(left), content, " ".repeat(right), dim("│"));
}

fn line_box_empty() { line_box(""); }

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' { in_escape = true; continue; }
        if in_escape { if c == 'm' { in_escape = false; } continue; }
        out.push(c);
    }
    out
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
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
#[command(name = "loanrisk")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Loan default risk models: train, score and report")]
#[command(long_about = None)]
pub struct Cli {
    /// Directory holding trained artifacts
    #[arg(long, global = true, env = "ARTIFACT_DIR", default_value = "./artifacts")]
    pub artifacts: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train both models on a CSV file
    Train {
        /// Input CSV file
        #[arg(short, long)]
        data: PathBuf,

        /// Share of rows held out for evaluation (0.1 to 0.5)
        #[arg(long)]
        test_size: Option<f64>,

        /// Shuffle seed
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Score one applicant
    Predict {
        /// Model to use (logreg or tree)
        #[arg(short, long, default_value = "logreg")]
        model: String,

        /// Decision threshold, clamped to [0.1, 0.9]
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Feature value as Name=Value (repeatable)
        #[arg(long = "set", value_name = "NAME=VALUE")]
        set: Vec<String>,
    },

    /// Show the last dataset summary and model metrics
    Summary,

    /// Start the HTTP server
    Serve {
        /// Server port
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Server host
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
    },
}

/// Parse `Name=Value` pairs into a raw record
pub fn parse_assignments(pairs: &[String]) -> anyhow::Result<RawRecord> {
    let mut record = RawRecord::new();
    for pair in pairs {
        let (name, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("expected NAME=VALUE, got {:?}", pair))?;
        let name = name.trim();
        if name.is_empty() {
            anyhow::bail!("empty feature name in {:?}", pair);
        }
        record.insert(name.to_string(), Value::String(value.trim().to_string()));
    }
    Ok(record)
}

fn open_store(artifacts: &Path) -> anyhow::Result<Arc<dyn ArtifactStore>> {
    Ok(Arc::new(LocalStore::new(artifacts)?))
}

fn print_report(report: &ModelReport) {
    let m = &report.metrics;
    println!(
        "  {:<8} {} {:.4}  {} {:.4}  {} {:.4}  {} {:.4}",
        report.model.cyan().bold(),
        muted("acc"),
        m.accuracy,
        muted("prec"),
        m.precision,
        muted("rec"),
        m.recall,
        muted("f1"),
        m.f1
    );
    println!(
        "  {:<8} {}",
        "",
        dim(&format!(
            "tp {}  tn {}  fp {}  fn {}",
            m.confusion.tp, m.confusion.tn, m.confusion.fp, m.confusion.fn_
        ))
    );
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_train(
    artifacts: &Path,
    data_path: &Path,
    test_size: Option<f64>,
    seed: Option<u64>,
) -> anyhow::Result<()> {
    section("Train");

    let mut config = PipelineConfig::default();
    if let Some(test_size) = test_size {
        if !(0.1..=0.5).contains(&test_size) {
            anyhow::bail!("--test-size must be between 0.1 and 0.5, got {}", test_size);
        }
        config.train_fraction = 1.0 - test_size;
    }
    if let Some(seed) = seed {
        config.seed = seed;
    }

    step_run("Loading data");
    let start = Instant::now();
    let records = DataLoader::new().load_csv(data_path)?;
    step_done(&format!("{} rows in {:?}", records.len(), start.elapsed()));

    step_run("Training logreg + tree");
    let start = Instant::now();
    let engine = TrainEngine::new(config, open_store(artifacts)?);
    let outcome = engine.train_records(&records)?;
    step_done(&format!("{:?}", start.elapsed()));

    println!();
    for report in outcome.reports() {
        print_report(&report);
    }
    println!();
    println!("  {}", kv("Artifacts", &artifacts.display().to_string()));
    println!();

    Ok(())
}

pub fn cmd_predict(
    artifacts: &Path,
    model: &str,
    threshold: Option<f64>,
    assignments: &[String],
) -> anyhow::Result<()> {
    section("Predict");

    let kind: ModelKind = model.parse()?;
    let record = parse_assignments(assignments)?;
    let dispatcher = InferenceDispatcher::new(open_store(artifacts)?);
    let prediction = dispatcher.predict(kind, &record, threshold)?;

    for (name, value) in &prediction.explanation.features {
        println!("  {:<16} {}", muted(name), value);
    }
    println!();
    println!("  {:<16} {}", muted("Model"), prediction.model.to_string().cyan());
    println!("  {:<16} {}", muted("Probability"), format!("{:.4}", prediction.probability).white().bold());
    println!("  {:<16} {:.2}", muted("Threshold"), prediction.explanation.threshold);
    let label = if prediction.label == 1 { "1 (default)".red() } else { "0 (repays)".green() };
    println!("  {:<16} {}", muted("Label"), label);
    println!();

    Ok(())
}

pub fn cmd_summary(artifacts: &Path) -> anyhow::Result<()> {
    section("Summary");

    let store = open_store(artifacts)?;
    let report = report_summary(store.as_ref())?;
    let s = &report.summary;

    println!("  {:<16} {}", muted("Rows"), s.rows);
    println!("  {:<16} {}", muted("Defaults"), s.defaults);
    println!("  {:<16} {}", muted("Non-defaults"), s.non_defaults);
    println!("  {:<16} {:.4}", muted("Default rate"), s.default_rate);
    println!("  {:<16} {:.2}", muted("Credit avg"), s.credit_avg);
    println!("  {:<16} {:.4}", muted("DTI avg"), s.dti_avg);
    println!();
    print_report(&report.last_model_metrics.logreg);
    print_report(&report.last_model_metrics.tree);
    println!();

    Ok(())
}

pub async fn cmd_serve(artifacts: &Path, host: &str, port: u16) -> anyhow::Result<()> {
    use crate::server::{run_server, ServerConfig};

    println!();
    line_box_top();
    line_box_empty();
    line_box_center(&format!("{}", "loanrisk".white().bold()));
    line_box_center(&format!("{}", dim(&format!("v{}", env!("CARGO_PKG_VERSION")))));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box(&kv("API      ", &format!("http://{}:{}/api", host, port)));
    line_box(&kv("Health   ", &format!("http://{}:{}/api/health", host, port)));
    line_box(&kv("Artifacts", &artifacts.display().to_string()));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box_center(&format!("{}", dim("ctrl+c to stop")));
    line_box_empty();
    line_box_bottom();
    println!();

    let config = ServerConfig {
        host: host.to_string(),
        port,
        artifact_dir: artifacts.display().to_string(),
        ..Default::default()
    };
    run_server(config).await
}
