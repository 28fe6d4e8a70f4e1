//! The purchase funnel: search, select, add to cart, checkout

use futures::future::BoxFuture;
use tracing::info;

use crate::browser::Browser;
use crate::error::E2eResult;
use crate::pipeline::{Step, StepContext};
use crate::runner::RunContext;
use crate::verify;

/// Scroll past the sponsored block at the top of the results page
const SCROLL_PAST_ADS: &str = "window.scrollBy(0, 100);";

/// The four funnel steps, in execution order
pub fn steps<B: Browser>() -> Vec<Step<B>> {
    vec![
        Step::new("Search Item", "searchItem", search_item::<B>),
        Step::new("Select Item", "selectItem", select_item::<B>),
        Step::new("Add to Cart", "addToCart", add_to_cart::<B>),
        Step::new("Proceed to Checkout", "proceedToCheckout", proceed_to_checkout::<B>),
    ]
}

/// Search for the item and check the first listed price against the expected ones
fn search_item<'a, B: Browser>(
    run: &'a RunContext<B>,
    ctx: &'a StepContext,
) -> BoxFuture<'a, E2eResult<()>> {
    Box::pin(async move {
        let browser = run.browser();
        let waiter = run.waiter();
        let locators = run.locators();

        waiter
            .type_into(browser, &locators.search_box, run.record().item())
            .await?;
        waiter.click(browser, &locators.search_button).await?;
        waiter
            .script_when_present(browser, &locators.result_link, SCROLL_PAST_ADS)
            .await?;

        ctx.capture(run).await?;

        let observed = waiter.text_of(browser, &locators.price).await?;
        verify::verify(&observed, run.record().expected_prices())?;
        Ok(())
    })
}

/// Open the first result and pick the quantity
fn select_item<'a, B: Browser>(
    run: &'a RunContext<B>,
    ctx: &'a StepContext,
) -> BoxFuture<'a, E2eResult<()>> {
    Box::pin(async move {
        let browser = run.browser();
        let locators = run.locators();

        run.waiter().click(browser, &locators.result_link).await?;
        ctx.capture(run).await?;
        run.waiter()
            .select_value(browser, &locators.quantity, run.quantity())
            .await
    })
}

fn add_to_cart<'a, B: Browser>(
    run: &'a RunContext<B>,
    ctx: &'a StepContext,
) -> BoxFuture<'a, E2eResult<()>> {
    Box::pin(async move {
        run.waiter()
            .click(run.browser(), &run.locators().add_to_cart)
            .await?;
        ctx.capture(run).await?;
        Ok(())
    })
}

fn proceed_to_checkout<'a, B: Browser>(
    run: &'a RunContext<B>,
    ctx: &'a StepContext,
) -> BoxFuture<'a, E2eResult<()>> {
    Box::pin(async move {
        run.waiter()
            .click(run.browser(), &run.locators().checkout)
            .await?;
        ctx.capture(run).await?;
        info!("Proceeded to checkout successfully.");
        Ok(())
    })
}
