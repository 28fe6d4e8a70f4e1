//! Run lifecycle: test data, browser session, setup, pipeline, teardown

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::browser::Browser;
use crate::capture::{CaptureRecord, DiagnosticCapture};
use crate::config::{FunnelLocators, RunConfig};
use crate::data::{self, TestRecord};
use crate::driver_process::DriverProcess;
use crate::error::{E2eError, E2eResult};
use crate::funnel;
use crate::pipeline::{Orchestrator, Step, StepResult};
use crate::wait::{Both, Present, TitleContains, Waiter};
use crate::webdriver::WebDriverBrowser;

/// Everything a run owns for its lifetime: the browser session and the loaded record
pub struct RunContext<B: Browser> {
    browser: B,
    record: TestRecord,
    waiter: Waiter,
    capture: DiagnosticCapture,
    locators: FunnelLocators,
    quantity: String,
}

impl<B: Browser> RunContext<B> {
    pub fn new(browser: B, record: TestRecord, config: &RunConfig) -> Self {
        Self {
            browser,
            record,
            waiter: Waiter::from_config(&config.wait),
            capture: DiagnosticCapture::new(&config.capture),
            locators: config.locators.clone(),
            quantity: config.quantity.clone(),
        }
    }

    pub fn browser(&self) -> &B {
        &self.browser
    }

    pub fn record(&self) -> &TestRecord {
        &self.record
    }

    pub fn waiter(&self) -> &Waiter {
        &self.waiter
    }

    pub fn capture(&self) -> &DiagnosticCapture {
        &self.capture
    }

    pub fn locators(&self) -> &FunnelLocators {
        &self.locators
    }

    pub fn quantity(&self) -> &str {
        &self.quantity
    }

    /// Release the browser session. Consumes the context so it happens once.
    pub async fn teardown(self) -> E2eResult<()> {
        self.browser.quit().await
    }
}

/// Result of one funnel run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub name: String,
    pub item: String,
    pub success: bool,
    pub duration_ms: u64,
    pub state: String,
    pub steps: Vec<StepResult>,
    pub captures: Vec<CaptureRecord>,
    pub error: Option<String>,
}

impl RunReport {
    /// Write the report as `test-results.json` under `output_dir`
    pub fn write(&self, output_dir: &Path) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(output_dir)?;

        let path = output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

/// Report plus the error that ended the run, if any
#[derive(Debug)]
pub struct RunOutcome {
    pub report: RunReport,
    pub error: Option<E2eError>,
}

impl RunOutcome {
    pub fn passed(&self) -> bool {
        self.report.success
    }
}

/// Drives one purchase-funnel run
pub struct FunnelRunner {
    config: RunConfig,
}

impl FunnelRunner {
    /// Create a runner with default configuration
    pub fn new() -> Self {
        Self::with_config(RunConfig::default())
    }

    pub fn with_config(config: RunConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Full live run: load data, start or attach to WebDriver, run the funnel.
    ///
    /// Test data problems abort before any browser work. Driver startup
    /// failures are returned as errors; everything after the session exists
    /// is reported through the outcome.
    pub async fn run(&self) -> E2eResult<RunOutcome> {
        self.config.validate()?;
        let record = data::load(&self.config.data)?;

        // Held until the run is over; dropping it stops the process.
        let mut driver_process = None;
        let url = match &self.config.webdriver.url {
            Some(url) => url.clone(),
            None => {
                let process = DriverProcess::spawn(&self.config.webdriver).await?;
                let url = process.url().to_string();
                driver_process = Some(process);
                url
            }
        };

        let browser = WebDriverBrowser::connect(&url, &self.config.webdriver).await?;
        let outcome = self.execute(browser, record).await;

        if let Some(mut process) = driver_process {
            process.shutdown().await;
        }
        Ok(outcome)
    }

    /// Run the funnel steps against an already acquired browser
    pub async fn execute<B: Browser>(&self, browser: B, record: TestRecord) -> RunOutcome {
        self.execute_steps(browser, record, funnel::steps()).await
    }

    /// Run `steps` against `browser`. The browser is always quit exactly once
    /// before this returns.
    pub async fn execute_steps<B: Browser>(
        &self,
        browser: B,
        record: TestRecord,
        steps: Vec<Step<B>>,
    ) -> RunOutcome {
        let start = Instant::now();
        let item = record.item().to_string();
        let ctx = RunContext::new(browser, record, &self.config);
        let mut orchestrator = Orchestrator::new(steps, self.config.step_delay());

        let result = match self.setup(&ctx).await {
            Ok(()) => orchestrator.run(&ctx).await,
            Err(e) => {
                error!("Error during test setup: {}", e);
                Err(e)
            }
        };

        let captures = ctx.capture().records();

        info!("Tearing down the test...");
        if let Err(e) = ctx.teardown().await {
            warn!("Browser teardown failed: {}", e);
        }
        info!("Test teardown completed.");

        let steps = orchestrator.results().to_vec();
        let failed_steps = steps.iter().filter(|s| !s.success).count();
        let success = result.is_ok() && failed_steps == 0;
        let duration_ms = start.elapsed().as_millis() as u64;

        let error = result.err();
        let error_message = match &error {
            Some(e) => Some(e.to_string()),
            None if failed_steps > 0 => Some(format!("{} optional step(s) failed", failed_steps)),
            None => None,
        };

        if success {
            info!("✓ purchase funnel for '{}' ({} ms)", item, duration_ms);
        } else {
            error!(
                "✗ purchase funnel for '{}' - {}",
                item,
                error_message.as_deref().unwrap_or("unknown error")
            );
        }

        RunOutcome {
            report: RunReport {
                name: "purchase-funnel".to_string(),
                item,
                success,
                duration_ms,
                state: orchestrator.state().to_string(),
                steps,
                captures,
                error: error_message,
            },
            error,
        }
    }

    /// Open the storefront and wait until it is usable
    async fn setup<B: Browser>(&self, ctx: &RunContext<B>) -> E2eResult<()> {
        info!("Setting up the test...");
        self.config.validate()?;
        let browser = ctx.browser();

        if self.config.webdriver.maximize {
            browser.maximize_window().await?;
        }
        browser.navigate(&self.config.base_url).await?;

        let landing = Both(
            TitleContains(self.config.title_marker.clone()),
            Present(ctx.locators().search_box.clone()),
        );
        ctx.waiter().wait_for(browser, &landing).await?;

        info!("Test setup completed.");
        Ok(())
    }

    /// Write the run report under the configured output directory
    pub fn write_results(&self, report: &RunReport) -> E2eResult<PathBuf> {
        report.write(&self.config.output_dir)
    }
}

impl Default for FunnelRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_written_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let report = RunReport {
            name: "purchase-funnel".to_string(),
            item: "Castor Oil".to_string(),
            success: true,
            duration_ms: 12,
            state: "completed".to_string(),
            steps: vec![StepResult {
                name: "Search Item".to_string(),
                success: true,
                duration_ms: 5,
                error: None,
            }],
            captures: vec![],
            error: None,
        };

        let path = report.write(dir.path()).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(json["item"], "Castor Oil");
        assert_eq!(json["steps"][0]["name"], "Search Item");
    }

    #[tokio::test]
    async fn test_bad_data_aborts_before_browser() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = RunConfig::default();
        config.data.path = dir.path().join("missing.xlsx");
        config.webdriver.binary_path = dir.path().join("no-such-geckodriver");

        let runner = FunnelRunner::with_config(config);
        assert!(matches!(runner.run().await, Err(E2eError::DataSource(_))));
    }
}
