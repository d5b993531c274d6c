//! Result files for finished episodes and sweeps.
//!
//! Each episode becomes one [`EpisodeReport`] under
//! `<results_dir>/raw/<map>_<strategy>_<seed>.json`. A sweep also writes a
//! [`BatchSummary`] to `<results_dir>/summary_<batch_id>.json`, with totals
//! over the whole sweep and per `(map, strategy)` pair.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use crisis_core::memory::{MemoryError, write_json_atomic};
use crisis_core::operator::EndReason;
use crisis_core::runner::{EpisodeResult, TranscriptEntry};
use crisis_types::{BatchId, MetricsReport, RunId};
use serde::Serialize;

/// Everything recorded about one finished episode.
#[derive(Debug, Clone, Serialize)]
pub struct EpisodeReport {
    /// Sweep the episode belongs to.
    pub batch_id: BatchId,
    /// Run identifier.
    pub run_id: RunId,
    /// Map the run used: the scenario file stem, or the world name.
    pub map: String,
    /// Scenario name from the world section.
    pub scenario: String,
    /// Strategy name.
    pub strategy: String,
    /// World seed.
    pub seed: u64,
    /// Why the episode ended.
    pub end_reason: EndReason,
    /// Ticks executed.
    pub total_ticks: u64,
    /// Final metrics.
    pub metrics: MetricsReport,
    /// When the episode started.
    pub started_at: DateTime<Utc>,
    /// When the episode ended.
    pub finished_at: DateTime<Utc>,
    /// Every applied plan.
    pub transcript: Vec<TranscriptEntry>,
}

impl EpisodeReport {
    /// Wrap a runner result with sweep bookkeeping.
    pub fn new(
        batch_id: BatchId,
        map: &str,
        seed: u64,
        started_at: DateTime<Utc>,
        result: EpisodeResult,
    ) -> Self {
        Self {
            batch_id,
            run_id: result.run_id,
            map: map.to_owned(),
            scenario: result.scenario,
            strategy: result.strategy,
            seed,
            end_reason: result.end_reason,
            total_ticks: result.total_ticks,
            metrics: result.metrics,
            started_at,
            finished_at: Utc::now(),
            transcript: result.transcript,
        }
    }

    /// File name for this report.
    pub fn file_name(&self) -> String {
        format!(
            "{}_{}_{}.json",
            sanitize(&self.map),
            sanitize(&self.strategy),
            self.seed
        )
    }

    /// Write the report under `<results_dir>/raw/` and return its path.
    pub fn write(&self, results_dir: &Path) -> Result<PathBuf, MemoryError> {
        let path = results_dir.join("raw").join(self.file_name());
        write_json_atomic(self, &path)?;
        Ok(path)
    }
}

/// Keep file names portable.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Totals over a set of episodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregate {
    /// Episodes counted.
    pub runs: u32,
    /// Survivors delivered.
    pub rescued: u32,
    /// Survivors lost.
    pub deaths: u32,
    /// Mean of per-run success rates, in percent.
    pub mean_success_rate: f64,
    /// Mean of per-run average rescue times, over runs with a rescue.
    pub mean_rescue_time: Option<f64>,
    /// Commands rejected.
    pub invalid_commands: u32,
}

impl Aggregate {
    fn over<'a>(reports: impl Iterator<Item = &'a EpisodeReport> + Clone) -> Self {
        let sum_u32 = |f: fn(&MetricsReport) -> u32| {
            reports
                .clone()
                .fold(0_u32, |acc, r| acc.saturating_add(f(&r.metrics)))
        };
        Self {
            runs: u32::try_from(reports.clone().count()).unwrap_or(u32::MAX),
            rescued: sum_u32(|m| m.rescued),
            deaths: sum_u32(|m| m.deaths),
            mean_success_rate: mean(reports.clone().map(|r| r.metrics.success_rate))
                .unwrap_or(0.0),
            mean_rescue_time: mean(
                reports
                    .clone()
                    .filter(|r| r.metrics.rescued > 0)
                    .map(|r| r.metrics.avg_rescue_time),
            ),
            invalid_commands: sum_u32(|m| m.invalid_commands),
        }
    }
}

/// Totals for one `(map, strategy)` pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    /// Map name.
    pub map: String,
    /// Strategy name.
    pub strategy: String,
    /// Totals over this pair's seeds.
    #[serde(flatten)]
    pub totals: Aggregate,
}

/// Aggregate over every episode of a sweep.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    /// Sweep identifier.
    pub batch_id: BatchId,
    /// Maps, in first-run order.
    pub maps: Vec<String>,
    /// Strategies, in first-run order.
    pub strategies: Vec<String>,
    /// Seeds, in first-run order.
    pub seeds: Vec<u64>,
    /// Totals over the whole sweep.
    #[serde(flatten)]
    pub overall: Aggregate,
    /// Totals per `(map, strategy)`.
    pub groups: Vec<GroupSummary>,
}

impl BatchSummary {
    /// Summarize `reports`.
    pub fn from_reports(batch_id: BatchId, reports: &[EpisodeReport]) -> Self {
        let maps = distinct(reports.iter().map(|r| r.map.clone()));
        let strategies = distinct(reports.iter().map(|r| r.strategy.clone()));
        let groups = maps
            .iter()
            .flat_map(|map| strategies.iter().map(move |strategy| (map, strategy)))
            .filter_map(|(map, strategy)| {
                let matching = reports
                    .iter()
                    .filter(|r| &r.map == map && &r.strategy == strategy);
                let totals = Aggregate::over(matching);
                (totals.runs > 0).then(|| GroupSummary {
                    map: map.clone(),
                    strategy: strategy.clone(),
                    totals,
                })
            })
            .collect();
        Self {
            batch_id,
            maps,
            strategies,
            seeds: distinct(reports.iter().map(|r| r.seed)),
            overall: Aggregate::over(reports.iter()),
            groups,
        }
    }

    /// Write the summary into `results_dir` and return its path.
    pub fn write(&self, results_dir: &Path) -> Result<PathBuf, MemoryError> {
        let path = results_dir.join(format!("summary_{}.json", self.batch_id));
        write_json_atomic(self, &path)?;
        Ok(path)
    }
}

fn distinct<T: PartialEq>(values: impl Iterator<Item = T>) -> Vec<T> {
    let mut out: Vec<T> = Vec::new();
    for value in values {
        if !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0_f64, 0_u32), |(sum, count), v| {
        (sum + v, count.saturating_add(1))
    });
    (count > 0).then_some(sum / f64::from(count))
}
