use std::thread;

use camino::Utf8Path;
use crossbeam_channel::unbounded;
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::{self, Target};
use crate::error::HarvestError;
use crate::fetch::Fetcher;
use crate::fs_util;
use crate::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Prepare,
    Validate,
    Fetch,
    Extract,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Started,
    Ok,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct TargetEvent {
    pub target: String,
    pub stage: Stage,
    pub outcome: Outcome,
}

/// Injected progress capability: production logs, tests collect and assert.
pub trait Reporter: Send + Sync {
    fn event(&self, event: TargetEvent);
}

pub struct LogReporter;

impl Reporter for LogReporter {
    fn event(&self, event: TargetEvent) {
        match &event.outcome {
            Outcome::Started => {
                info!(name = %event.target, stage = ?event.stage, "starting")
            }
            Outcome::Ok => info!(name = %event.target, "done"),
            Outcome::Failed(reason) => {
                warn!(name = %event.target, stage = ?event.stage, %reason, "target failed")
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub items: Vec<TargetReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TargetReport {
    pub name: String,
    pub platform: String,
    pub bounty: bool,
    pub destination: String,
    pub status: TargetStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetStatus {
    Completed,
    Failed { stage: Stage, reason: String },
}

/// Drains the target list through a fixed pool of workers. Every target is
/// processed exactly once; at most `workers` pipelines run at any instant.
/// Per-target failures are reported and collected, never propagated.
pub fn run<F: Fetcher>(
    store: &Store,
    fetcher: &F,
    targets: Vec<Target>,
    workers: usize,
    reporter: &dyn Reporter,
) -> RunSummary {
    let workers = workers.max(1);
    let (task_tx, task_rx) = unbounded::<Target>();
    let (report_tx, report_rx) = unbounded::<TargetReport>();
    for target in targets {
        // send on an unbounded channel only fails once the receiver is gone
        let _ = task_tx.send(target);
    }
    drop(task_tx);

    thread::scope(|scope| {
        for _ in 0..workers {
            let task_rx = task_rx.clone();
            let report_tx = report_tx.clone();
            scope.spawn(move || {
                while let Ok(target) = task_rx.recv() {
                    let report = process_target(store, fetcher, &target, reporter);
                    let _ = report_tx.send(report);
                }
            });
        }
    });
    drop(report_tx);

    RunSummary {
        items: report_rx.iter().collect(),
    }
}

/// The per-target pipeline: directory, validate, fetch, extract. Strictly
/// sequential; the first failing step aborts this target only.
fn process_target<F: Fetcher>(
    store: &Store,
    fetcher: &F,
    target: &Target,
    reporter: &dyn Reporter,
) -> TargetReport {
    let destination = store.target_dir(target);
    let archive = store.archive_path(target);

    reporter.event(TargetEvent {
        target: target.name.clone(),
        stage: Stage::Prepare,
        outcome: Outcome::Started,
    });
    if let Err(err) = store.ensure_dir(&destination) {
        return failed(target, &destination, Stage::Prepare, err, reporter);
    }

    if !domain::is_valid_url(&target.url) {
        return failed(
            target,
            &destination,
            Stage::Validate,
            HarvestError::InvalidUrl(target.url.clone()),
            reporter,
        );
    }

    reporter.event(TargetEvent {
        target: target.name.clone(),
        stage: Stage::Fetch,
        outcome: Outcome::Started,
    });
    if let Err(err) = fetcher.fetch(&target.url, archive.as_std_path()) {
        return failed(target, &destination, Stage::Fetch, err, reporter);
    }

    reporter.event(TargetEvent {
        target: target.name.clone(),
        stage: Stage::Extract,
        outcome: Outcome::Started,
    });
    if let Err(err) = fs_util::extract_zip(archive.as_std_path(), destination.as_std_path()) {
        return failed(target, &destination, Stage::Extract, err, reporter);
    }

    reporter.event(TargetEvent {
        target: target.name.clone(),
        stage: Stage::Extract,
        outcome: Outcome::Ok,
    });
    TargetReport {
        name: target.name.clone(),
        platform: target.platform.clone(),
        bounty: target.bounty,
        destination: destination.into_string(),
        status: TargetStatus::Completed,
    }
}

fn failed(
    target: &Target,
    destination: &Utf8Path,
    stage: Stage,
    error: HarvestError,
    reporter: &dyn Reporter,
) -> TargetReport {
    let reason = error.to_string();
    reporter.event(TargetEvent {
        target: target.name.clone(),
        stage,
        outcome: Outcome::Failed(reason.clone()),
    });
    TargetReport {
        name: target.name.clone(),
        platform: target.platform.clone(),
        bounty: target.bounty,
        destination: destination.to_string(),
        status: TargetStatus::Failed { stage, reason },
    }
}
