//! Wait-gated browser interactions
//!
//! Every interaction with the page goes through [`Waiter::await_and_perform`]:
//! a readiness condition is polled until it holds or the timeout elapses, and
//! only then is the action invoked with whatever the condition resolved.

use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::time::sleep;
use tracing::debug;

use crate::browser::{Browser, Locator};
use crate::config::WaitConfig;
use crate::error::{E2eError, E2eResult};

/// A named condition on the page that resolves to a value once it holds
#[async_trait]
pub trait Readiness<B: Browser>: Send + Sync {
    type Output: Send;

    /// Human-readable name used in logs and timeout errors
    fn describe(&self) -> String;

    /// Check once. `Ok(None)` means "not yet".
    async fn probe(&self, browser: &B) -> E2eResult<Option<Self::Output>>;
}

/// An element matching the locator is attached to the page
#[derive(Debug, Clone)]
pub struct Present(pub Locator);

/// An element matching the locator is displayed and enabled
#[derive(Debug, Clone)]
pub struct Clickable(pub Locator);

/// The page title contains the given text
#[derive(Debug, Clone)]
pub struct TitleContains(pub String);

/// Both conditions hold in the same probe
#[derive(Debug, Clone)]
pub struct Both<A, C>(pub A, pub C);

#[async_trait]
impl<B: Browser> Readiness<B> for Present {
    type Output = B::Element;

    fn describe(&self) -> String {
        format!("presence({})", self.0)
    }

    async fn probe(&self, browser: &B) -> E2eResult<Option<B::Element>> {
        Ok(browser.find_all(&self.0).await?.into_iter().next())
    }
}

#[async_trait]
impl<B: Browser> Readiness<B> for Clickable {
    type Output = B::Element;

    fn describe(&self) -> String {
        format!("clickable({})", self.0)
    }

    async fn probe(&self, browser: &B) -> E2eResult<Option<B::Element>> {
        for element in browser.find_all(&self.0).await? {
            if browser.is_displayed(&element).await? && browser.is_enabled(&element).await? {
                return Ok(Some(element));
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl<B: Browser> Readiness<B> for TitleContains {
    type Output = String;

    fn describe(&self) -> String {
        format!("title contains '{}'", self.0)
    }

    async fn probe(&self, browser: &B) -> E2eResult<Option<String>> {
        let title = browser.title().await?;
        Ok(title.contains(&self.0).then_some(title))
    }
}

#[async_trait]
impl<B, A, C> Readiness<B> for Both<A, C>
where
    B: Browser,
    A: Readiness<B>,
    C: Readiness<B>,
{
    type Output = (A::Output, C::Output);

    fn describe(&self) -> String {
        format!("{} and {}", self.0.describe(), self.1.describe())
    }

    async fn probe(&self, browser: &B) -> E2eResult<Option<Self::Output>> {
        let Some(first) = self.0.probe(browser).await? else {
            return Ok(None);
        };
        let Some(second) = self.1.probe(browser).await? else {
            return Ok(None);
        };
        Ok(Some((first, second)))
    }
}

/// Bounded polling shared by every step of a run
#[derive(Debug, Clone)]
pub struct Waiter {
    timeout: Duration,
    poll_interval: Duration,
}

impl Waiter {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }

    pub fn from_config(config: &WaitConfig) -> Self {
        Self::new(
            Duration::from_millis(config.timeout_ms),
            Duration::from_millis(config.poll_interval_ms),
        )
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Poll `condition` until it holds, or fail with a readiness timeout.
    ///
    /// The condition is probed at least once. `timeout` overrides the shared
    /// default for this wait only.
    pub async fn until<B, C>(
        &self,
        browser: &B,
        condition: &C,
        timeout: Option<Duration>,
    ) -> E2eResult<C::Output>
    where
        B: Browser,
        C: Readiness<B>,
    {
        let timeout = timeout.unwrap_or(self.timeout);
        let start = Instant::now();
        let mut attempts = 0usize;
        let mut last_error: Option<String> = None;

        loop {
            attempts += 1;

            match condition.probe(browser).await {
                Ok(Some(output)) => {
                    debug!(
                        "{} ready after {} probe(s) ({} ms)",
                        condition.describe(),
                        attempts,
                        start.elapsed().as_millis()
                    );
                    return Ok(output);
                }
                Ok(None) => {}
                Err(e) if e.is_transient() => {
                    debug!("Probe for {} failed: {}", condition.describe(), e);
                    last_error = Some(e.to_string());
                }
                Err(e) => return Err(e),
            }

            let elapsed = start.elapsed();
            if elapsed >= timeout {
                return Err(E2eError::ReadinessTimeout {
                    condition: condition.describe(),
                    waited_ms: elapsed.as_millis() as u64,
                    last_error,
                });
            }

            sleep(self.poll_interval.min(timeout - elapsed)).await;
        }
    }

    /// Wait for `condition`, then run `action` on what it resolved to.
    ///
    /// The action is never invoked when the wait times out.
    pub async fn await_and_perform<B, C, T, F, Fut>(
        &self,
        browser: &B,
        condition: &C,
        timeout: Option<Duration>,
        action: F,
    ) -> E2eResult<T>
    where
        B: Browser,
        C: Readiness<B>,
        F: FnOnce(C::Output) -> Fut,
        Fut: Future<Output = E2eResult<T>>,
    {
        let ready = self.until(browser, condition, timeout).await?;
        action(ready).await
    }

    /// Wait for a condition without interacting afterwards
    pub async fn wait_for<B, C>(&self, browser: &B, condition: &C) -> E2eResult<C::Output>
    where
        B: Browser,
        C: Readiness<B>,
    {
        self.until(browser, condition, None).await
    }

    pub async fn click<B: Browser>(&self, browser: &B, locator: &Locator) -> E2eResult<()> {
        self.await_and_perform(
            browser,
            &Clickable(locator.clone()),
            None,
            |element: B::Element| async move { browser.click(&element).await },
        )
        .await
    }

    /// Clear the field, then type `text` into it
    pub async fn type_into<B: Browser>(
        &self,
        browser: &B,
        locator: &Locator,
        text: &str,
    ) -> E2eResult<()> {
        self.await_and_perform(
            browser,
            &Clickable(locator.clone()),
            None,
            |element: B::Element| async move {
                browser.clear(&element).await?;
                browser.send_keys(&element, text).await
            },
        )
        .await
    }

    pub async fn text_of<B: Browser>(&self, browser: &B, locator: &Locator) -> E2eResult<String> {
        self.await_and_perform(
            browser,
            &Present(locator.clone()),
            None,
            |element: B::Element| async move { browser.text(&element).await },
        )
        .await
    }

    pub async fn select_value<B: Browser>(
        &self,
        browser: &B,
        locator: &Locator,
        value: &str,
    ) -> E2eResult<()> {
        self.await_and_perform(
            browser,
            &Present(locator.clone()),
            None,
            |element: B::Element| async move {
                browser.select_dropdown_value(&element, value).await
            },
        )
        .await
    }

    /// Run a page script once `locator` is present
    pub async fn script_when_present<B: Browser>(
        &self,
        browser: &B,
        locator: &Locator,
        script: &str,
    ) -> E2eResult<()> {
        self.await_and_perform(
            browser,
            &Present(locator.clone()),
            None,
            |_: B::Element| async move { browser.execute_script(script).await },
        )
        .await
    }
}

impl Default for Waiter {
    fn default() -> Self {
        Self::from_config(&WaitConfig::default())
    }
}
