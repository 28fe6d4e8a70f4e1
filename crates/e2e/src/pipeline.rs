//! Ordered step execution with settle delays and failure capture

use std::fmt;
use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::browser::Browser;
use crate::capture::CaptureRecord;
use crate::error::E2eResult;
use crate::runner::RunContext;

/// Body of a step: a sequence of wait-gated interactions against the run
pub type StepAction<B> =
    for<'a> fn(&'a RunContext<B>, &'a StepContext) -> BoxFuture<'a, E2eResult<()>>;

/// Descriptor for one pipeline step. Nothing runs until the orchestrator executes it.
pub struct Step<B: Browser> {
    /// Display name used in logs and the report
    pub name: String,

    /// Prefix for artifacts this step produces
    pub label: String,

    pub action: StepAction<B>,

    /// Keep going after this step fails instead of halting the pipeline
    pub may_fail: bool,
}

impl<B: Browser> Step<B> {
    pub fn new(name: impl Into<String>, label: impl Into<String>, action: StepAction<B>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            action,
            may_fail: false,
        }
    }

    pub fn may_fail(mut self) -> Self {
        self.may_fail = true;
        self
    }
}

/// Per-invocation context; the stamp ties artifacts to the step that made them
#[derive(Debug, Clone)]
pub struct StepContext {
    pub step_name: String,
    pub label: String,
    pub stamp: String,
}

impl StepContext {
    /// Capture the browser under this step's label
    pub async fn capture<B: Browser>(&self, run: &RunContext<B>) -> E2eResult<CaptureRecord> {
        run.capture()
            .capture(run.browser(), &self.label, &self.stamp)
            .await
    }

    /// Label for the artifact taken when this step fails
    pub fn error_label(&self) -> String {
        format!("{}_error", self.label)
    }
}

/// Where the pipeline is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Running(usize),
    Completed,
    Failed { step: usize, error: String },
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Idle => write!(f, "idle"),
            PipelineState::Running(i) => write!(f, "running step {}", i),
            PipelineState::Completed => write!(f, "completed"),
            PipelineState::Failed { step, error } => {
                write!(f, "failed at step {}: {}", step, error)
            }
        }
    }
}

/// Result of executing a single step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Runs a fixed, ordered list of steps
pub struct Orchestrator<B: Browser> {
    steps: Vec<Step<B>>,

    /// Settle time after each completed step
    step_delay: Duration,

    state: PipelineState,
    results: Vec<StepResult>,
}

impl<B: Browser> Orchestrator<B> {
    pub fn new(steps: Vec<Step<B>>, step_delay: Duration) -> Self {
        Self {
            steps,
            step_delay,
            state: PipelineState::Idle,
            results: Vec::new(),
        }
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn results(&self) -> &[StepResult] {
        &self.results
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name.as_str()).collect()
    }

    /// Execute every step in order.
    ///
    /// A failing step moves the pipeline to `Failed`, takes one best-effort
    /// error capture and returns the step's error unchanged; later steps are
    /// not run. Steps marked `may_fail` are recorded and skipped past instead,
    /// and the first of them to fail decides the final `Failed` state.
    /// Each call starts again from `Idle`.
    pub async fn run(&mut self, run: &RunContext<B>) -> E2eResult<()> {
        self.state = PipelineState::Idle;
        self.results.clear();
        let mut first_optional_failure = None;

        for (index, step) in self.steps.iter().enumerate() {
            self.state = PipelineState::Running(index);

            let stamp = match run.capture().stamp() {
                Ok(stamp) => stamp,
                Err(e) => {
                    error!("Cannot stamp artifacts for step {}: {}", step.name, e);
                    self.state = PipelineState::Failed {
                        step: index,
                        error: e.to_string(),
                    };
                    return Err(e);
                }
            };
            let ctx = StepContext {
                step_name: step.name.clone(),
                label: step.label.clone(),
                stamp,
            };

            info!("Executing step: {}", step.name);
            let start = Instant::now();
            let outcome = (step.action)(run, &ctx).await;
            let duration_ms = start.elapsed().as_millis() as u64;

            match outcome {
                Ok(()) => {
                    info!("Completed step: {} ({} ms)", step.name, duration_ms);
                    self.results.push(StepResult {
                        name: step.name.clone(),
                        success: true,
                        duration_ms,
                        error: None,
                    });

                    if !self.step_delay.is_zero() {
                        tokio::time::sleep(self.step_delay).await;
                    }
                }
                Err(e) => {
                    error!("Error during step: {} - {}", step.name, e);
                    self.results.push(StepResult {
                        name: step.name.clone(),
                        success: false,
                        duration_ms,
                        error: Some(e.to_string()),
                    });

                    run.capture()
                        .capture_best_effort(run.browser(), &ctx.error_label(), &ctx.stamp)
                        .await;

                    if step.may_fail {
                        warn!("Continuing past optional step: {}", step.name);
                        first_optional_failure.get_or_insert(PipelineState::Failed {
                            step: index,
                            error: e.to_string(),
                        });
                        continue;
                    }

                    self.state = PipelineState::Failed {
                        step: index,
                        error: e.to_string(),
                    };
                    return Err(e);
                }
            }
        }

        self.state = first_optional_failure.unwrap_or(PipelineState::Completed);
        Ok(())
    }
}
