use super::detect::{Detection, detect};
use super::{Entities, ErrorContext, EventOutcome, FatalCause, FatalError, OutputBundle, Phase, ProjectRef, RunFailure, RunLog, RunStatus};
use crate::aggregate::aggregate;
use crate::collect::{CollectOptions, CollectionOutcome, CollectionStatus, ProjectCollector, RepositoryCollector};
use crate::facts::{ActivityWindow, Project};
use crate::governor::{RateGovernor, RetryPolicy, check_feasible, estimate_required_calls};
use crate::source::{AuthProvider, Connector, EntitySource, ErrorClass, QuotaResource};
use chrono::Utc;
use std::sync::Arc;

const LOG_TARGET: &str = "  pipeline";

/// Where a run currently is. Each state owns the output of the phase before it.
enum Step {
    Detect,
    Collect(Detection),
    Analyze(Detection, CollectionOutcome),
    Done(Box<OutputBundle>),
}

/// Drives a run through DETECT, COLLECT and ANALYZE.
///
/// A phase only starts once the previous one produced its output, and no phase is retried.
/// Any fatal error moves the run to [`Phase::Error`] and ends it.
#[derive(Debug)]
pub struct PhaseOrchestrator<A, C> {
    auth: A,
    connector: C,
    options: CollectOptions,
    policy: RetryPolicy,
    max_concurrency: usize,
}

impl<A: AuthProvider, C: Connector> PhaseOrchestrator<A, C> {
    #[must_use]
    pub const fn new(auth: A, connector: C, options: CollectOptions, policy: RetryPolicy, max_concurrency: usize) -> Self {
        Self {
            auth,
            connector,
            options,
            policy,
            max_concurrency,
        }
    }

    /// Runs the pipeline for `target` over `window`.
    pub async fn run(&self, target: &ProjectRef, window: ActivityWindow) -> Result<OutputBundle, RunFailure> {
        log::info!(target: LOG_TARGET, "Starting run for {target}");

        let mut log = RunLog::default();
        let mut context = ErrorContext::default();
        let _ = context.inputs.insert("target".to_string(), target.to_string());
        let _ = context.inputs.insert("owner".to_string(), target.owner().to_string());
        let _ = context.inputs.insert("window".to_string(), format!("{} to {}", window.since, window.until));

        let governor = Arc::new(RateGovernor::new(self.policy));
        let result = self.execute(target, window, &governor, &mut log, &mut context).await;

        match result {
            Ok(mut bundle) => {
                bundle.run_log = log.into_entries();
                Ok(bundle)
            }
            Err((phase, cause)) => {
                let _ = context.counters.insert("api_calls".to_string(), governor.calls_made());
                let error = FatalError::new(phase, cause, context);
                log.record(Phase::Error, "run aborted", EventOutcome::Failed, error.to_string());

                Err(RunFailure {
                    error,
                    run_log: log.into_entries(),
                })
            }
        }
    }

    async fn execute(
        &self,
        target: &ProjectRef,
        window: ActivityWindow,
        governor: &Arc<RateGovernor>,
        log: &mut RunLog,
        context: &mut ErrorContext,
    ) -> Result<OutputBundle, (Phase, FatalCause)> {
        let credential = self.auth.get_token().map_err(|e| {
            (
                Phase::Detect,
                FatalCause::CredentialUnavailable { message: e.to_string() },
            )
        })?;
        let source = Arc::new(
            self.connector
                .connect(&credential)
                .map_err(|e| (Phase::Detect, FatalCause::ConnectionFailed { message: e.to_string() }))?,
        );

        let mut step = Step::Detect;
        loop {
            step = match step {
                Step::Detect => {
                    let detection = match detect(&*source, governor, target, self.options.limits.project_items).await {
                        Ok(detection) => detection,
                        Err(cause) => {
                            if let FatalCause::Ambiguous { candidates, .. } = &cause {
                                context.candidates.clone_from(candidates);
                            }
                            return Err((Phase::Detect, cause));
                        }
                    };

                    context.candidates = detection.candidates.iter().map(Project::reference).collect();
                    if detection.candidates.len() > 1 {
                        log.record(Phase::Detect, "candidates considered", EventOutcome::Ok, context.candidates.join(", "));
                    }
                    log.record(
                        Phase::Detect,
                        "project selected",
                        EventOutcome::Ok,
                        format!(
                            "{} with {} item(s) across {} repositories",
                            detection.project.reference(),
                            detection.items.len(),
                            detection.repositories.len()
                        ),
                    );

                    Step::Collect(detection)
                }

                Step::Collect(detection) => {
                    let outcome = self
                        .collect(&source, governor, &detection, &window, log, context)
                        .await
                        .map_err(|cause| (Phase::Collect, cause))?;

                    Step::Analyze(detection, outcome)
                }

                Step::Analyze(detection, outcome) => {
                    let bundle = analyze(detection, outcome, window);
                    log.record(
                        Phase::Analyze,
                        "metrics aggregated",
                        EventOutcome::Ok,
                        format!("{} repositories", bundle.aggregates.per_project.repository_count),
                    );

                    Step::Done(Box::new(bundle))
                }

                Step::Done(bundle) => {
                    log.record(
                        Phase::Done,
                        "run finished",
                        EventOutcome::Ok,
                        format!("{} API call(s)", governor.calls_made()),
                    );

                    return Ok(*bundle);
                }
            };
        }
    }

    async fn collect<S: EntitySource>(
        &self,
        source: &Arc<S>,
        governor: &Arc<RateGovernor>,
        detection: &Detection,
        window: &ActivityWindow,
        log: &mut RunLog,
        context: &mut ErrorContext,
    ) -> Result<CollectionOutcome, FatalCause> {
        let repo_count = detection.repositories.len();

        // COLLECT spends only the core budget.
        let quota = match governor.snapshot(QuotaResource::Core) {
            Some(quota) => quota,
            None => governor
                .call("quota lookup", QuotaResource::Core, || source.get_quota())
                .await
                .map_err(|e| FatalCause::Api(e.into()))?,
        };

        let estimate = estimate_required_calls(repo_count, &self.options);
        let feasibility = check_feasible(&estimate, &quota, Utc::now());
        let _ = context.counters.insert("repositories".to_string(), estimate.repositories);
        let _ = context.counters.insert("estimated_calls".to_string(), feasibility.estimate);
        let _ = context.counters.insert("quota_remaining".to_string(), feasibility.remaining);

        if !feasibility.feasible {
            return Err(FatalCause::InfeasibleBudget {
                estimate: feasibility.estimate,
                remaining: feasibility.remaining,
                wait: feasibility.suggested_wait,
            });
        }

        let concurrency = feasibility.concurrency_limit(self.max_concurrency, repo_count);
        log.record(
            Phase::Collect,
            "budget checked",
            EventOutcome::Ok,
            format!(
                "about {} call(s) needed, {} available, {concurrency} repositories at a time",
                feasibility.estimate, feasibility.remaining
            ),
        );

        let collector = ProjectCollector::new(
            RepositoryCollector::new(Arc::clone(source), Arc::clone(governor), self.options),
            concurrency,
        );
        let outcome = collector.collect(detection.repositories.iter().cloned(), window).await;

        let _ = context.counters.insert("collected".to_string(), u64::try_from(outcome.successes.len()).unwrap_or(u64::MAX));
        let _ = context.counters.insert("failed".to_string(), u64::try_from(outcome.failures.len()).unwrap_or(u64::MAX));
        context.failures.clone_from(&outcome.failures);

        if let Some(rejected) = outcome.rejected_credentials() {
            return Err(FatalCause::CredentialsRejected {
                repository: rejected.repository.full_name(),
            });
        }

        match outcome.status {
            CollectionStatus::Failed => {
                return Err(FatalCause::AllRepositoriesFailed {
                    count: outcome.failures.len(),
                    class: shared_class(&outcome),
                });
            }
            CollectionStatus::Degraded => {
                let failed: Vec<String> = outcome
                    .failures
                    .iter()
                    .map(|f| format!("{} ({})", f.repository, f.code))
                    .collect();
                log.record(
                    Phase::Collect,
                    "collection finished",
                    EventOutcome::Degraded,
                    format!("{} of {repo_count} repositories failed: {}", failed.len(), failed.join(", ")),
                );
            }
            CollectionStatus::Complete => {
                log.record(
                    Phase::Collect,
                    "collection finished",
                    EventOutcome::Ok,
                    format!("{repo_count} repositories collected"),
                );
            }
        }

        Ok(outcome)
    }
}

fn analyze(detection: Detection, outcome: CollectionOutcome, window: ActivityWindow) -> OutputBundle {
    let aggregates = aggregate(&outcome.successes, &detection.items, &window);

    OutputBundle {
        project: detection.project,
        window,
        status: RunStatus::from_failures(outcome.failures),
        entities: Entities::from_facts(outcome.successes, detection.items),
        aggregates,
        run_log: Vec::new(),
    }
}

/// The class all failures share, or [`ErrorClass::Permanent`] when they differ.
fn shared_class(outcome: &CollectionOutcome) -> ErrorClass {
    let mut classes = outcome.failures.iter().map(|f| f.class);
    let first = classes.next().unwrap_or(ErrorClass::Permanent);
    if classes.all(|c| c == first) { first } else { ErrorClass::Permanent }
}
