use anyhow::Result;
use clap::Args;
use hiermeasure_registry::{Applicability, MeasureDescriptor, Registry};
use serde::Serialize;

use super::context::CliContext;
use super::output::{print_json, OutputFormat};

#[derive(Args, Clone, Debug)]
pub struct ListArgs {
    /// Only show measures of this group (e.g. /internal/statistics)
    #[arg(short, long)]
    pub group: Option<String>,

    /// Only show measures computed automatically for every hierarchy
    #[arg(long)]
    pub auto_only: bool,
}

#[derive(Serialize)]
struct MeasureRow {
    id: String,
    group: String,
    auto_compute: bool,
    requires_ground_truth: bool,
    constructed: bool,
}

impl From<&MeasureDescriptor> for MeasureRow {
    fn from(descriptor: &MeasureDescriptor) -> Self {
        Self {
            id: descriptor.id().to_string(),
            group: descriptor.group().to_string(),
            auto_compute: descriptor.auto_compute(),
            requires_ground_truth: matches!(
                descriptor.applicability(),
                Applicability::RequiresGroundTruth
            ),
            constructed: descriptor.is_constructed(),
        }
    }
}

pub async fn cmd_list(args: ListArgs, ctx: &CliContext) -> Result<()> {
    let host = ctx.host().await?;
    let registry = host.registry();
    let descriptors = match args.group.as_deref() {
        Some(group) => registry.group(group)?,
        None => registry.all(),
    };
    let rows: Vec<MeasureRow> = descriptors
        .iter()
        .filter(|descriptor| !args.auto_only || descriptor.auto_compute())
        .map(|descriptor| MeasureRow::from(descriptor.as_ref()))
        .collect();

    match ctx.output() {
        OutputFormat::Json => print_json(&rows)?,
        OutputFormat::Human => {
            println!("{} measure(s)", rows.len());
            for row in &rows {
                let mut flags = Vec::new();
                if row.auto_compute {
                    flags.push("auto");
                }
                if row.requires_ground_truth {
                    flags.push("ground-truth");
                }
                println!("  {:<48} {:<40} {}", row.id, row.group, flags.join(","));
            }
        }
    }

    let rejected = &host.install_report().rejected;
    if !rejected.is_empty() {
        eprintln!("{} manifest(s) were rejected:", rejected.len());
        for (id, err) in rejected {
            eprintln!("  {}: {}", id, err);
        }
    }
    Ok(())
}

pub async fn cmd_groups(ctx: &CliContext) -> Result<()> {
    let host = ctx.host().await?;
    let groups = host.registry().groups();
    match ctx.output() {
        OutputFormat::Json => print_json(&groups)?,
        OutputFormat::Human => {
            for group in &groups {
                println!("{}", group);
            }
        }
    }
    Ok(())
}
