//! Readiness polling behaviour of the wait primitive

mod support;

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use storefront_e2e::wait::{Both, Clickable, Present, TitleContains};
use storefront_e2e::{E2eError, Locator, Waiter};
use support::MockBrowser;

fn waiter() -> Waiter {
    Waiter::new(Duration::from_millis(80), Duration::from_millis(5))
}

#[tokio::test]
async fn timeout_skips_the_action() {
    let browser = MockBrowser::default();
    let invoked = AtomicBool::new(false);
    let flag = &invoked;
    let start = Instant::now();

    let result = waiter()
        .await_and_perform(&browser, &Present(Locator::id("never")), None, |_| async move {
            flag.store(true, Ordering::SeqCst);
            Ok(())
        })
        .await;

    match result {
        Err(E2eError::ReadinessTimeout { condition, .. }) => {
            assert_eq!(condition, "presence(id=never)");
        }
        other => panic!("expected readiness timeout, got {:?}", other),
    }
    assert!(!invoked.load(Ordering::SeqCst));
    assert!(start.elapsed() >= Duration::from_millis(80));
}

#[tokio::test]
async fn action_receives_the_ready_element() {
    let browser = MockBrowser::default();
    browser.state().present.insert("id=quantity".to_string());

    let element = waiter()
        .await_and_perform(&browser, &Present(Locator::id("quantity")), None, |el| async move {
            Ok(el)
        })
        .await
        .unwrap();

    assert_eq!(element, "id=quantity");
}

#[tokio::test]
async fn condition_that_becomes_true_is_picked_up() {
    let browser = MockBrowser::default();
    let late = browser.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        late.state().present.insert("css=a.result".to_string());
    });

    let waiter = Waiter::new(Duration::from_secs(2), Duration::from_millis(5));
    waiter
        .click(&browser, &Locator::css("a.result"))
        .await
        .unwrap();

    assert!(browser.called("click:css=a.result"));
}

#[tokio::test]
async fn hidden_element_is_not_clickable() {
    let browser = MockBrowser::default();
    {
        let mut state = browser.state();
        state.present.insert("id=add-to-cart-button".to_string());
        state.hidden.insert("id=add-to-cart-button".to_string());
    }

    let result = waiter()
        .until(&browser, &Clickable(Locator::id("add-to-cart-button")), None)
        .await;

    assert!(matches!(result, Err(E2eError::ReadinessTimeout { .. })));
}

#[tokio::test]
async fn per_call_timeout_overrides_default() {
    let browser = MockBrowser::default();
    let long = Waiter::new(Duration::from_secs(30), Duration::from_millis(5));
    let start = Instant::now();

    let result = long
        .until(
            &browser,
            &Present(Locator::id("missing")),
            Some(Duration::from_millis(30)),
        )
        .await;

    assert!(matches!(result, Err(E2eError::ReadinessTimeout { .. })));
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn both_conditions_must_hold() {
    let browser = MockBrowser::default();
    browser.state().title = "Amazon.com".to_string();
    let landing = Both(
        TitleContains("Amazon.com".to_string()),
        Present(Locator::id("twotabsearchtextbox")),
    );

    assert!(waiter().until(&browser, &landing, None).await.is_err());

    browser
        .state()
        .present
        .insert("id=twotabsearchtextbox".to_string());
    let (title, element) = waiter().until(&browser, &landing, None).await.unwrap();
    assert_eq!(title, "Amazon.com");
    assert_eq!(element, "id=twotabsearchtextbox");
}

#[tokio::test]
async fn driver_errors_are_retried_until_timeout() {
    let browser = MockBrowser::default();
    browser.state().erroring.insert("css=span.price".to_string());

    let result = waiter()
        .text_of(&browser, &Locator::css("span.price"))
        .await;

    match result {
        Err(E2eError::ReadinessTimeout { last_error, .. }) => {
            assert!(last_error.unwrap().contains("stale element"));
        }
        other => panic!("expected readiness timeout, got {:?}", other),
    }
}
