use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::path::Path;

use crate::config::Settings;
use crate::services::{prepare, DataFetcher, LinearSystem, MalformedPolicy, ModelVariant, PreparedSystem};

#[derive(Args, Clone, Default)]
pub struct RunArgs {
    /// Rating model to build (defaults to RATING_MODEL, then overall)
    #[arg(short, long, value_enum)]
    pub model: Option<ModelVariant>,
    /// Drop malformed schedule entries instead of aborting
    #[arg(long)]
    pub skip_malformed: bool,
    /// Data source host (defaults to DATASOURCE_HOST)
    #[arg(long)]
    pub host: Option<String>,
}

impl RunArgs {
    fn policy_override(&self) -> Option<MalformedPolicy> {
        self.skip_malformed.then_some(MalformedPolicy::Skip)
    }
}

/// Command-line flags merged over environment settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    pub host: String,
    pub model: ModelVariant,
    pub policy: MalformedPolicy,
}

impl RunOptions {
    pub fn resolve(args: &RunArgs, settings: &Settings) -> Result<Self> {
        let host = match &args.host {
            Some(h) => h.trim_end_matches('/').to_string(),
            None => settings.require_host()?.to_string(),
        };

        Ok(Self {
            host,
            model: args.model.unwrap_or(settings.model),
            policy: args.policy_override().unwrap_or(settings.malformed_policy),
        })
    }
}

async fn run(options: &RunOptions) -> Result<PreparedSystem> {
    let fetcher = DataFetcher::new(&options.host);
    let schedules = fetcher.fetch_all_schedules().await?;
    let prepared = prepare(schedules, options.model, options.policy)?;
    Ok(prepared)
}

pub async fn summary(options: &RunOptions) -> Result<()> {
    let prepared = run(options).await?;
    print!("{}", render_summary(&prepared));
    Ok(())
}

pub async fn export(options: &RunOptions, out_dir: &Path) -> Result<()> {
    let prepared = run(options).await?;
    write_system(&prepared.system, out_dir)?;

    print!("{}", render_summary(&prepared));
    println!("Wrote triplets.csv, constants.csv and teams.csv to {}", out_dir.display());
    Ok(())
}

fn render_summary(prepared: &PreparedSystem) -> String {
    let system = &prepared.system;
    let mut out = String::new();
    out.push_str(&format!("Model:              {}\n", system.variant));
    out.push_str(&format!("Teams:              {}\n", system.team_map.len()));
    out.push_str(&format!(
        "Unique games:       {} (from {} entries, {} duplicates collapsed, {} skipped)\n",
        prepared.games, prepared.entries_seen, prepared.duplicates_collapsed, prepared.entries_skipped
    ));
    out.push_str(&format!(
        "Coefficient matrix: {} x {} with {} non-zeros\n",
        system.rows(),
        system.cols(),
        system.nnz()
    ));
    out.push_str(&format!("Constants:          {}\n", system.constants.len()));
    out
}

#[derive(Serialize)]
struct TripletRecord {
    row: usize,
    col: usize,
    value: f64,
}

#[derive(Serialize)]
struct ConstantRecord {
    row: usize,
    value: f64,
}

#[derive(Serialize)]
struct TeamRecord<'a> {
    index: usize,
    id: &'a str,
    team: String,
}

/// Writes `triplets.csv`, `constants.csv` and `teams.csv` into `out_dir`.
pub fn write_system(system: &LinearSystem, out_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut triplets = csv::Writer::from_path(out_dir.join("triplets.csv"))?;
    for (row, col, value) in system.triplets() {
        triplets.serialize(TripletRecord { row, col, value })?;
    }
    triplets.flush()?;

    let mut constants = csv::Writer::from_path(out_dir.join("constants.csv"))?;
    for (row, value) in system.constants.iter().enumerate() {
        constants.serialize(ConstantRecord { row, value: *value })?;
    }
    constants.flush()?;

    let mut teams = csv::Writer::from_path(out_dir.join("teams.csv"))?;
    for (index, team) in system.team_map.iter() {
        teams.serialize(TeamRecord {
            index,
            id: team.id.as_str(),
            team: serde_json::to_string(team)?,
        })?;
    }
    teams.flush()?;

    tracing::info!(
        "Exported {} triplets, {} constants and {} teams",
        system.nnz(),
        system.constants.len(),
        system.team_map.len()
    );
    Ok(())
}
