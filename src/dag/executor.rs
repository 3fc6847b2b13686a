// src/dag/executor.rs

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::dag::plan::ExecutionPlan;
use crate::errors::BuildFailure;
use crate::exec::UnitRunner;
use crate::pipeline::OutputManifest;

/// Result of executing an [`ExecutionPlan`].
#[derive(Debug, Default)]
pub struct PlanReport {
    pub succeeded: Vec<OutputManifest>,
    /// `(unit, error message)` for every failed unit.
    pub failed: Vec<(String, String)>,
    /// Units of groups that never started because an earlier group failed.
    pub skipped: Vec<String>,
}

impl PlanReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }

    pub fn into_result(self) -> Result<Vec<OutputManifest>, BuildFailure> {
        if self.is_success() {
            return Ok(self.succeeded);
        }
        let mut failed: Vec<String> = self.failed.into_iter().map(|(unit, _)| unit).collect();
        failed.sort();
        Err(BuildFailure {
            failed,
            skipped: self.skipped,
        })
    }
}

/// Run `plan` group by group.
///
/// Units inside a group run concurrently. A failing unit never cancels its
/// siblings, but once a group has a failure the remaining groups are skipped.
pub async fn execute_plan(plan: &ExecutionPlan, runner: Arc<dyn UnitRunner>) -> PlanReport {
    let mut report = PlanReport::default();
    let groups = plan.groups();

    for (idx, group) in groups.iter().enumerate() {
        info!(group = idx + 1, units = ?group, "starting group");

        let mut set = JoinSet::new();
        for name in group {
            let runner = Arc::clone(&runner);
            let name = name.clone();
            set.spawn(async move {
                let result = runner.run_unit(&name).await;
                (name, result)
            });
        }

        let mut pending: BTreeSet<String> = group.clone();
        let mut group_failed = false;
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((name, Ok(manifest))) => {
                    pending.remove(&name);
                    report.succeeded.push(manifest);
                }
                Ok((name, Err(err))) => {
                    pending.remove(&name);
                    error!(unit = %name, step = %err.step, "{err}");
                    report.failed.push((name, err.to_string()));
                    group_failed = true;
                }
                Err(join_err) => {
                    error!(error = %join_err, "unit task aborted");
                    group_failed = true;
                }
            }
        }
        // Units whose task panicked never reported back.
        for name in pending {
            report.failed.push((name, "unit task aborted".to_string()));
        }

        if group_failed {
            let skipped: Vec<String> = groups[idx + 1..].iter().flatten().cloned().collect();
            if !skipped.is_empty() {
                warn!(?skipped, "group {} failed; skipping remaining groups", idx + 1);
            }
            report.skipped = skipped;
            break;
        }
    }

    report
}
