//! Browser automation interface consumed by the funnel steps

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{E2eError, E2eResult};

/// How an element is located on the page
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locator {
    Id(String),
    Css(String),
    #[serde(rename = "xpath")]
    XPath(String),
}

impl Locator {
    pub fn id(id: impl Into<String>) -> Self {
        Locator::Id(id.into())
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    pub fn xpath(path: impl Into<String>) -> Self {
        Locator::XPath(path.into())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Id(id) => write!(f, "id={}", id),
            Locator::Css(selector) => write!(f, "css={}", selector),
            Locator::XPath(path) => write!(f, "xpath={}", path),
        }
    }
}

/// A single browser session.
///
/// Interactions take `&self`; the session is owned by the run and used from
/// one logical thread of control.
#[async_trait]
pub trait Browser: Send + Sync {
    /// Handle to an element located in the current page
    type Element: Send + Sync;

    async fn navigate(&self, url: &str) -> E2eResult<()>;

    async fn title(&self) -> E2eResult<String>;

    /// All elements currently matching `locator` (empty when none)
    async fn find_all(&self, locator: &Locator) -> E2eResult<Vec<Self::Element>>;

    async fn find_element(&self, locator: &Locator) -> E2eResult<Self::Element> {
        self.find_all(locator)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| E2eError::ElementNotFound(locator.to_string()))
    }

    async fn is_displayed(&self, element: &Self::Element) -> E2eResult<bool>;

    async fn is_enabled(&self, element: &Self::Element) -> E2eResult<bool>;

    async fn click(&self, element: &Self::Element) -> E2eResult<()>;

    async fn clear(&self, element: &Self::Element) -> E2eResult<()>;

    async fn send_keys(&self, element: &Self::Element, text: &str) -> E2eResult<()>;

    async fn text(&self, element: &Self::Element) -> E2eResult<String>;

    /// Pick the `<option>` whose value attribute equals `value`
    async fn select_dropdown_value(&self, element: &Self::Element, value: &str) -> E2eResult<()>;

    async fn execute_script(&self, script: &str) -> E2eResult<()>;

    async fn maximize_window(&self) -> E2eResult<()>;

    /// PNG-encoded snapshot of the current viewport
    async fn screenshot(&self) -> E2eResult<Vec<u8>>;

    /// End the session. Called once, at teardown.
    async fn quit(&self) -> E2eResult<()>;
}
