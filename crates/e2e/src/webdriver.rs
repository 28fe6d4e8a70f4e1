//! Live browser session over the W3C WebDriver protocol

use async_trait::async_trait;
use thirtyfour::components::SelectElement;
use thirtyfour::prelude::*;
use tracing::{debug, info};

use crate::browser::{Browser, Locator};
use crate::config::WebDriverConfig;
use crate::error::E2eResult;

/// Firefox session driven through a WebDriver endpoint
pub struct WebDriverBrowser {
    driver: WebDriver,
}

impl WebDriverBrowser {
    /// Open a new Firefox session on the WebDriver server at `url`
    pub async fn connect(url: &str, config: &WebDriverConfig) -> E2eResult<Self> {
        let mut caps = DesiredCapabilities::firefox();
        if config.headless {
            caps.set_headless()?;
        }

        info!("Opening Firefox session via {}", url);
        let driver = WebDriver::new(url, caps).await?;
        Ok(Self { driver })
    }
}

fn by(locator: &Locator) -> By {
    match locator {
        Locator::Id(id) => By::Id(id.as_str()),
        Locator::Css(selector) => By::Css(selector.as_str()),
        Locator::XPath(path) => By::XPath(path.as_str()),
    }
}

#[async_trait]
impl Browser for WebDriverBrowser {
    type Element = WebElement;

    async fn navigate(&self, url: &str) -> E2eResult<()> {
        debug!("Navigating to {}", url);
        self.driver.goto(url).await?;
        Ok(())
    }

    async fn title(&self) -> E2eResult<String> {
        Ok(self.driver.title().await?)
    }

    async fn find_all(&self, locator: &Locator) -> E2eResult<Vec<WebElement>> {
        Ok(self.driver.find_all(by(locator)).await?)
    }

    async fn is_displayed(&self, element: &WebElement) -> E2eResult<bool> {
        Ok(element.is_displayed().await?)
    }

    async fn is_enabled(&self, element: &WebElement) -> E2eResult<bool> {
        Ok(element.is_enabled().await?)
    }

    async fn click(&self, element: &WebElement) -> E2eResult<()> {
        element.click().await?;
        Ok(())
    }

    async fn clear(&self, element: &WebElement) -> E2eResult<()> {
        element.clear().await?;
        Ok(())
    }

    async fn send_keys(&self, element: &WebElement, text: &str) -> E2eResult<()> {
        element.send_keys(text).await?;
        Ok(())
    }

    async fn text(&self, element: &WebElement) -> E2eResult<String> {
        Ok(element.text().await?)
    }

    async fn select_dropdown_value(&self, element: &WebElement, value: &str) -> E2eResult<()> {
        let select = SelectElement::new(element).await?;
        select.select_by_value(value).await?;
        Ok(())
    }

    async fn execute_script(&self, script: &str) -> E2eResult<()> {
        self.driver.execute(script, Vec::new()).await?;
        Ok(())
    }

    async fn maximize_window(&self) -> E2eResult<()> {
        self.driver.maximize_window().await?;
        Ok(())
    }

    async fn screenshot(&self) -> E2eResult<Vec<u8>> {
        Ok(self.driver.screenshot_as_png().await?)
    }

    async fn quit(&self) -> E2eResult<()> {
        info!("Closing browser session");
        self.driver.clone().quit().await?;
        Ok(())
    }
}
