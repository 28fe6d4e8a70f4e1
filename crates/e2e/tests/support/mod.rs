//! In-memory browser shared by the integration tests
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, MutexGuard};

use storefront_e2e::config::FunnelLocators;
use storefront_e2e::{Browser, E2eError, E2eResult, Locator, RunConfig, TestRecord};

/// Enough of a PNG header for format sniffing
pub const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01";

#[derive(Default)]
pub struct MockState {
    pub title: String,
    /// Locators (in `Display` form) that resolve to an element
    pub present: HashSet<String>,
    /// Present but not displayed
    pub hidden: HashSet<String>,
    /// Lookups that fail with a driver error
    pub erroring: HashSet<String>,
    pub texts: HashMap<String, String>,
    pub fail_screenshots: bool,
    pub calls: Vec<String>,
    pub screenshots: usize,
    pub quits: usize,
}

/// Cloneable handle; clones share state so tests can inspect after the run
#[derive(Clone, Default)]
pub struct MockBrowser {
    state: Arc<Mutex<MockState>>,
}

impl MockBrowser {
    /// A storefront where every funnel element is ready and the price shows `price`
    pub fn storefront(price: &str) -> Self {
        let browser = MockBrowser::default();
        let locators = FunnelLocators::default();
        {
            let mut state = browser.state();
            state.title = "Amazon.com. Spend less. Smile more.".to_string();
            for locator in [
                &locators.search_box,
                &locators.search_button,
                &locators.result_link,
                &locators.price,
                &locators.quantity,
                &locators.add_to_cart,
                &locators.checkout,
            ] {
                state.present.insert(locator.to_string());
            }
            state
                .texts
                .insert(locators.price.to_string(), price.to_string());
        }
        browser
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn called(&self, call: &str) -> bool {
        self.state().calls.iter().any(|c| c == call)
    }

    pub fn quits(&self) -> usize {
        self.state().quits
    }

    fn record(&self, call: String) {
        self.state().calls.push(call);
    }
}

#[async_trait]
impl Browser for MockBrowser {
    type Element = String;

    async fn navigate(&self, url: &str) -> E2eResult<()> {
        self.record(format!("navigate:{}", url));
        Ok(())
    }

    async fn title(&self) -> E2eResult<String> {
        Ok(self.state().title.clone())
    }

    async fn find_all(&self, locator: &Locator) -> E2eResult<Vec<String>> {
        let key = locator.to_string();
        let state = self.state();
        if state.erroring.contains(&key) {
            return Err(E2eError::Browser(format!("stale element reference: {}", key)));
        }
        Ok(state.present.get(&key).cloned().into_iter().collect())
    }

    async fn is_displayed(&self, element: &String) -> E2eResult<bool> {
        Ok(!self.state().hidden.contains(element))
    }

    async fn is_enabled(&self, _element: &String) -> E2eResult<bool> {
        Ok(true)
    }

    async fn click(&self, element: &String) -> E2eResult<()> {
        self.record(format!("click:{}", element));
        Ok(())
    }

    async fn clear(&self, element: &String) -> E2eResult<()> {
        self.record(format!("clear:{}", element));
        Ok(())
    }

    async fn send_keys(&self, element: &String, text: &str) -> E2eResult<()> {
        self.record(format!("send_keys:{}:{}", element, text));
        Ok(())
    }

    async fn text(&self, element: &String) -> E2eResult<String> {
        Ok(self.state().texts.get(element).cloned().unwrap_or_default())
    }

    async fn select_dropdown_value(&self, element: &String, value: &str) -> E2eResult<()> {
        self.record(format!("select:{}:{}", element, value));
        Ok(())
    }

    async fn execute_script(&self, script: &str) -> E2eResult<()> {
        self.record(format!("script:{}", script));
        Ok(())
    }

    async fn maximize_window(&self) -> E2eResult<()> {
        self.record("maximize".to_string());
        Ok(())
    }

    async fn screenshot(&self) -> E2eResult<Vec<u8>> {
        let mut state = self.state();
        if state.fail_screenshots {
            return Err(E2eError::Browser("screenshot unavailable".to_string()));
        }
        state.screenshots += 1;
        Ok(PNG.to_vec())
    }

    async fn quit(&self) -> E2eResult<()> {
        let mut state = self.state();
        state.quits += 1;
        state.calls.push("quit".to_string());
        Ok(())
    }
}

/// Fast, delay-free configuration writing artifacts under `dir`
pub fn test_config(dir: &Path) -> RunConfig {
    let mut config = RunConfig::default();
    config.step_delay_ms = 0;
    config.wait.timeout_ms = 100;
    config.wait.poll_interval_ms = 5;
    config.capture.dir = dir.join("screenshots");
    config.output_dir = dir.join("results");
    config
}

pub fn castor_oil() -> TestRecord {
    TestRecord::new(
        "Castor Oil",
        vec!["9".to_string(), "10".to_string(), "11".to_string()],
    )
    .unwrap()
}
