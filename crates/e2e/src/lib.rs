//! Storefront purchase-funnel E2E runner
//!
//! This crate drives a real browser through search, product selection,
//! add-to-cart and checkout, and checks the listed price against the
//! acceptable values from a workbook:
//! - Loads the item and expected prices from a spreadsheet
//! - Gates every page interaction behind a bounded readiness wait
//! - Captures date-stamped screenshots after key transitions and on failure
//! - Halts on the first failing step and always closes the browser
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       FunnelRunner                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  data::load(DataConfig) -> TestRecord                       │
//! │  DriverProcess::spawn() / WebDriverBrowser::connect()       │
//! │  RunContext { browser, record, waiter, capture }            │
//! │    ├── setup: navigate + wait(title, search box)            │
//! │    ├── Orchestrator::run(steps)                             │
//! │    │     ├── Search Item   (type, click, verify price)      │
//! │    │     ├── Select Item   (click result, pick quantity)    │
//! │    │     ├── Add to Cart                                    │
//! │    │     └── Proceed to Checkout                            │
//! │    └── teardown: quit browser                               │
//! │  RunReport -> test-results.json                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod browser;
pub mod capture;
pub mod config;
pub mod data;
pub mod driver_process;
pub mod error;
pub mod funnel;
pub mod pipeline;
pub mod runner;
pub mod verify;
pub mod wait;
pub mod webdriver;

pub use browser::{Browser, Locator};
pub use config::RunConfig;
pub use data::TestRecord;
pub use error::{E2eError, E2eResult};
pub use pipeline::{Orchestrator, PipelineState, Step, StepContext};
pub use runner::{FunnelRunner, RunContext, RunOutcome, RunReport};
pub use verify::VerificationResult;
pub use wait::Waiter;
