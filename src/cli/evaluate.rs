use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use hiermeasure_cli::metrics::render_metrics;
use hiermeasure_cli::Selection;
use hiermeasure_core_types::{Hierarchy, HierarchyDocument, MeasureId, MeasureValue};
use hiermeasure_scheduler::{dump_measures, BatchReport, Outcome};
use serde::Serialize;
use tracing::{info, warn};

use super::context::CliContext;
use super::output::{print_json, OutputFormat};

#[derive(Args, Clone, Debug)]
pub struct EvaluateArgs {
    /// Hierarchy document (JSON with `groups` and `instances`)
    pub hierarchy: PathBuf,

    /// Measure to evaluate; repeat for several. Defaults to every registered measure.
    /// Auto-compute measures are computed alongside on the background queue
    #[arg(short, long = "measure", value_name = "ID")]
    pub measures: Vec<String>,

    /// Evaluate only the auto-compute measures
    #[arg(long, conflicts_with = "measures")]
    pub auto: bool,

    /// Maximum number of measures evaluated at the same time
    #[arg(short, long)]
    pub parallelism: Option<usize>,

    /// Per-measure time limit, e.g. 30s or 2m
    #[arg(long, value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,

    /// Write the computed values as a semicolon separated report
    #[arg(long, value_name = "FILE")]
    pub dump: Option<PathBuf>,

    /// Print dispatcher and registry metrics after the run
    #[arg(long)]
    pub metrics: bool,
}

#[derive(Serialize)]
struct OutcomeRow<'a> {
    measure: &'a str,
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<&'a MeasureValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fault: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    elapsed_ms: Option<u64>,
}

#[derive(Serialize)]
struct ReportView<'a> {
    batch: String,
    hierarchy: String,
    outcomes: Vec<OutcomeRow<'a>>,
}

pub async fn cmd_evaluate(args: EvaluateArgs, ctx: &CliContext) -> Result<()> {
    let raw = tokio::fs::read_to_string(&args.hierarchy)
        .await
        .with_context(|| format!("Failed to read {}", args.hierarchy.display()))?;
    let hierarchy: Arc<dyn Hierarchy> = Arc::new(
        HierarchyDocument::from_json_str(&raw)
            .and_then(|document| document.into_hierarchy())
            .with_context(|| format!("Invalid hierarchy document {}", args.hierarchy.display()))?,
    );

    let host = ctx.host().await?;
    let selection = if !args.measures.is_empty() {
        Selection::Ids(args.measures.iter().map(|id| MeasureId::from(id.as_str())).collect())
    } else if args.auto {
        Selection::AutoCompute
    } else {
        Selection::All
    };

    let mut options = host.batch_options();
    if let Some(parallelism) = args.parallelism {
        options = options.with_parallelism(parallelism);
    }
    if let Some(timeout) = args.timeout {
        options = options.with_timeout(timeout);
    }

    if matches!(selection, Selection::Ids(_)) {
        let posted = host.precompute(Arc::clone(&hierarchy)).await?;
        info!(posted, "auto-compute measures computed in the background");
    }

    let cancel = options.cancel.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; cancelling measures that have not started");
            cancel.cancel();
        }
    });
    let report = host
        .evaluate(Arc::clone(&hierarchy), &selection, options)
        .await;
    interrupt.abort();
    let report = report?;

    info!(
        hierarchy = %report.hierarchy,
        computed = report.count("computed"),
        failed = report.count("failed"),
        "evaluation finished"
    );

    match ctx.output() {
        OutputFormat::Json => print_json(&view(&report))?,
        OutputFormat::Human => print_human(&report),
    }

    if let Some(path) = args.dump.as_ref() {
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        dump_measures(
            BufWriter::new(file),
            host.holder(),
            hierarchy.id(),
            host.registry().as_ref(),
        )?;
        info!(path = %path.display(), "measure dump written");
    }

    if args.metrics {
        print!("{}", render_metrics());
    }
    Ok(())
}

fn view(report: &BatchReport) -> ReportView<'_> {
    let outcomes = report
        .entries()
        .iter()
        .map(|entry| OutcomeRow {
            measure: entry.measure.as_str(),
            outcome: entry.outcome.label(),
            value: entry.outcome.value(),
            fault: entry.outcome.fault().map(|fault| fault.to_string()),
            elapsed_ms: entry
                .timeline
                .elapsed()
                .map(|elapsed| elapsed.as_millis() as u64),
        })
        .collect();
    ReportView {
        batch: report.batch.to_string(),
        hierarchy: report.hierarchy.to_string(),
        outcomes,
    }
}

fn print_human(report: &BatchReport) {
    println!("Hierarchy {} ({} measure(s))", report.hierarchy, report.len());
    for entry in report.entries() {
        let id = entry.measure.as_str();
        match &entry.outcome {
            Outcome::Computed(value) => {
                let rendered = value.to_string();
                let mut lines = rendered.lines();
                println!("  {:<48} {}", id, lines.next().unwrap_or_default());
                for line in lines {
                    println!("  {:<48} {}", "", line);
                }
            }
            Outcome::Failed(fault) => {
                println!("  {:<48} failed ({}): {}", id, fault.kind, fault.detail)
            }
            other => println!("  {:<48} {}", id, other.label()),
        }
    }
}
