//! Run configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};

use crate::browser::Locator;
use crate::error::{E2eError, E2eResult};

/// Configuration for one funnel run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Storefront landing page
    pub base_url: String,

    /// Text the landing page title must contain before the run starts
    pub title_marker: String,

    /// Where the item and expected prices come from
    pub data: DataConfig,

    /// Readiness polling
    pub wait: WaitConfig,

    /// Settle delay applied after every completed step
    pub step_delay_ms: u64,

    /// Diagnostic screenshots
    pub capture: CaptureConfig,

    /// WebDriver endpoint or process to spawn
    pub webdriver: WebDriverConfig,

    /// Element locators for each funnel page
    pub locators: FunnelLocators,

    /// Quantity picked on the product page
    pub quantity: String,

    /// Output directory for the JSON report
    pub output_dir: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            base_url: "http://www.amazon.com/".to_string(),
            title_marker: "Amazon.com".to_string(),
            data: DataConfig::default(),
            wait: WaitConfig::default(),
            step_delay_ms: 15_000,
            capture: CaptureConfig::default(),
            webdriver: WebDriverConfig::default(),
            locators: FunnelLocators::default(),
            quantity: "1".to_string(),
            output_dir: PathBuf::from("test-results"),
        }
    }
}

impl RunConfig {
    /// Load configuration from a YAML file, falling back to defaults when absent
    pub fn load(path: &Path) -> E2eResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_yaml(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> E2eResult<()> {
        let content = serde_yaml::to_string(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> E2eResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(E2eError::Config("base_url must not be empty".to_string()));
        }
        if self.data.price_columns.is_empty() {
            return Err(E2eError::Config(
                "data.price_columns needs at least one column".to_string(),
            ));
        }
        if self.wait.timeout_ms == 0 {
            return Err(E2eError::Config("wait.timeout_ms must be positive".to_string()));
        }
        if StrftimeItems::new(&self.capture.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(E2eError::Config(format!(
                "capture.date_format '{}' is not a valid date format",
                self.capture.date_format
            )));
        }
        if self.wait.poll_interval_ms == 0 {
            return Err(E2eError::Config(
                "wait.poll_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }
}

/// Location of the test record inside a workbook
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub path: PathBuf,
    pub sheet: String,

    /// Zero-based row holding the record (row 0 is the header)
    pub row: u32,
    pub item_column: u32,
    pub price_columns: Vec<u32>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("castor.xlsx"),
            sheet: "Sheet1".to_string(),
            row: 1,
            item_column: 0,
            price_columns: vec![1, 2, 3],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitConfig {
    pub timeout_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 15_000,
            poll_interval_ms: 250,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub dir: PathBuf,

    /// chrono format string for the date stamp in artifact names
    pub date_format: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("test-results/screenshots"),
            date_format: "%Y_%m_%d".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebDriverConfig {
    /// Existing WebDriver endpoint; when unset a geckodriver process is spawned
    pub url: Option<String>,

    /// Path to the geckodriver binary
    pub binary_path: PathBuf,

    /// Port for the spawned driver (None = find free port)
    pub port: Option<u16>,

    pub headless: bool,
    pub startup_timeout_ms: u64,
    pub maximize: bool,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            url: None,
            binary_path: PathBuf::from("geckodriver"),
            port: None,
            headless: false,
            startup_timeout_ms: 30_000,
            maximize: true,
        }
    }
}

/// Locators for the search, product, cart and checkout pages.
///
/// Each is a single-key map in YAML, e.g. `price: { css: span.a-price-whole }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FunnelLocators {
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub search_box: Locator,
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub search_button: Locator,
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub result_link: Locator,
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub price: Locator,
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub quantity: Locator,
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub add_to_cart: Locator,
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub checkout: Locator,
}

impl Default for FunnelLocators {
    fn default() -> Self {
        Self {
            search_box: Locator::id("twotabsearchtextbox"),
            search_button: Locator::id("nav-search-submit-button"),
            result_link: Locator::css("a.a-link-normal.s-line-clamp-3"),
            price: Locator::css("span.a-price-whole"),
            quantity: Locator::id("quantity"),
            add_to_cart: Locator::id("add-to-cart-button"),
            checkout: Locator::xpath("//input[@name='proceedToRetailCheckout']"),
        }
    }
}
