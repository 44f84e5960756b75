//! End-to-end pipeline behavior over a scripted transport.

use crate::config::ConfigPatch;
use crate::dom::{Document, Element};
use crate::engine::{DispatchOutcome, Engine, TriggerOptions};
use crate::retry::{RetryOverride, RetryPolicyPatch};
use crate::testing::{action_button, search_form, MockTransport};
use crate::transport::Response;
use crate::trigger::UiEvent;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

fn ok_text(body: &str) -> Response {
    Response::new(200, body.as_bytes().to_vec())
        .with_status_text("OK")
        .with_header("content-type", "text/plain")
}

fn click(element: &Element) -> UiEvent {
    UiEvent::new("click", element.clone())
}

fn quick_retry(max_attempts: u32, status_codes: Vec<u16>) -> RetryOverride {
    RetryOverride::Patch(RetryPolicyPatch {
        max_attempts: Some(max_attempts),
        status_codes: Some(status_codes),
        base_delay_ms: Some(1),
        max_delay_ms: Some(2),
        jitter: Some(0.0),
    })
}

#[tokio::test]
async fn ignore_strategy_sends_exactly_one_request() {
    let (document, button, results) = action_button("/save");
    let transport = Arc::new(MockTransport::with_delay(Duration::from_millis(300)));
    transport.enqueue(ok_text("OK"));
    let engine = Engine::builder(document)
        .with_transport(transport.clone())
        .build();

    let DispatchOutcome::Started(first) = engine.dispatch(&click(&button)) else {
        panic!("first click should start a run");
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    let DispatchOutcome::Started(second) = engine.dispatch(&click(&button)) else {
        panic!("second click still dispatches");
    };

    let first = first.await.unwrap().unwrap();
    let second = second.await.unwrap().unwrap();

    assert!(first.success);
    assert!(second.state.aborted);
    assert_eq!(transport.request_count(), 1);
    assert_eq!(results.text(), "OK");
    assert!(!button.is_disabled());

    // The registry is fully released: a subsequent trigger succeeds
    assert!(engine.services().coordinator.is_empty());
    transport.enqueue(ok_text("OK again"));
    let DispatchOutcome::Started(third) = engine.dispatch(&click(&button)) else {
        panic!("third click should start a run");
    };
    assert!(third.await.unwrap().unwrap().success);
    assert_eq!(results.text(), "OK again");
}

#[tokio::test]
async fn abort_previous_cancels_in_flight_run() {
    let (document, button, _results) = action_button("/save");
    button.set_attr("data-uplink-concurrency", "abort-previous");
    let transport = Arc::new(MockTransport::with_delay(Duration::from_millis(200)));
    transport.enqueue(ok_text("slow"));
    transport.enqueue(ok_text("fast"));
    let engine = Engine::builder(document)
        .with_transport(transport.clone())
        .build();

    let DispatchOutcome::Started(first) = engine.dispatch(&click(&button)) else {
        panic!("first click should start a run");
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    let DispatchOutcome::Started(second) = engine.dispatch(&click(&button)) else {
        panic!("second click should start a run");
    };

    let first_error = first.await.unwrap().unwrap_err();
    assert_eq!(first_error.code(), "ABORT_ERROR");

    let second_ctx = second.await.unwrap().unwrap();
    assert!(second_ctx.success);
    assert!(engine.services().coordinator.is_empty());
}

#[tokio::test]
async fn retry_succeeds_at_first_non_retryable_status() {
    let transport = Arc::new(MockTransport::new());
    transport.enqueue(Response::new(500, Vec::new()));
    transport.enqueue(ok_text("recovered"));
    let engine = Engine::builder(Document::new())
        .with_transport(transport.clone())
        .build();

    let options = TriggerOptions::new().with_config(
        ConfigPatch::new()
            .with_url("/flaky")
            .with_retry(quick_retry(3, vec![500])),
    );
    let ctx = engine.request(options).await.unwrap();

    assert_eq!(ctx.response.as_ref().unwrap().status, 200);
    assert_eq!(ctx.state.attempts, 2);
    assert_eq!(transport.request_count(), 2);
}

#[tokio::test]
async fn retry_exhaustion_names_attempt_count() {
    let transport = Arc::new(MockTransport::new());
    for _ in 0..3 {
        transport.enqueue(Response::new(500, Vec::new()));
    }
    let engine = Engine::builder(Document::new())
        .with_transport(transport.clone())
        .build();

    let options = TriggerOptions::new().with_config(
        ConfigPatch::new()
            .with_url("/down")
            .with_retry(quick_retry(3, vec![500])),
    );
    let error = engine.request(options).await.unwrap_err();

    assert_eq!(
        error,
        crate::errors::UplinkError::RetryExhausted {
            status: 500,
            attempts: 3
        }
    );
    assert_eq!(transport.request_count(), 3);
}

#[tokio::test]
async fn disabled_retry_makes_first_attempt_authoritative() {
    let transport = Arc::new(MockTransport::new());
    transport.enqueue(Response::new(500, Vec::new()).with_status_text("Internal Server Error"));
    let engine = Engine::builder(Document::new())
        .with_transport(transport.clone())
        .build();

    let options = TriggerOptions::new().with_config(
        ConfigPatch::new()
            .with_url("/down")
            .with_retry(RetryOverride::Disabled),
    );
    let error = engine.request(options).await.unwrap_err();

    assert_eq!(error.code(), "HTTP_ERROR");
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test]
async fn debounce_fires_once_with_last_value() {
    let document = Document::new();
    let input = Element::new("input");
    input.set_attr("data-uplink", "");
    input.set_attr("data-uplink-get", "/search");
    input.set_attr("data-uplink-trigger", "input delay:50ms");
    input.set_attr("name", "q");
    document.root().append_child(&input);

    let transport = Arc::new(MockTransport::new());
    transport.enqueue(ok_text("results"));
    let engine = Engine::builder(document)
        .with_transport(transport.clone())
        .build();

    let mut handles = Vec::new();
    for value in ["r", "ru", "rust"] {
        input.set_value(value);
        let DispatchOutcome::Debounced(handle) =
            engine.dispatch(&UiEvent::new("input", input.clone()))
        else {
            panic!("input events should debounce");
        };
        handles.push(handle);
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let results: Vec<_> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();

    // Only the last survivor fired
    assert!(results[0].is_none());
    assert!(results[1].is_none());
    let ctx = results[2].as_ref().unwrap().as_ref().unwrap();
    assert!(ctx.success);
    assert!(ctx.state.debounced);

    assert_eq!(transport.request_count(), 1);
    assert_eq!(transport.requests()[0].url, "/search?q=rust");
}

#[tokio::test]
async fn throttle_drops_events_inside_window() {
    let document = Document::new();
    let feed = Element::new("div");
    feed.set_attr("data-uplink", "");
    feed.set_attr("data-uplink-get", "/more");
    feed.set_attr("data-uplink-trigger", "scroll throttle:200ms");
    document.root().append_child(&feed);

    let transport = Arc::new(MockTransport::new());
    transport.enqueue(ok_text("page"));
    let engine = Engine::builder(document)
        .with_transport(transport.clone())
        .build();

    let DispatchOutcome::Started(first) = engine.dispatch(&UiEvent::new("scroll", feed.clone()))
    else {
        panic!("first scroll should fire");
    };
    assert!(matches!(
        engine.dispatch(&UiEvent::new("scroll", feed.clone())),
        DispatchOutcome::Throttled
    ));
    assert!(matches!(
        engine.dispatch(&UiEvent::new("scroll", feed.clone())),
        DispatchOutcome::Throttled
    ));

    first.await.unwrap().unwrap();
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test]
async fn validation_round_trip_clears_only_corrected_fields() {
    let (document, form, email) = search_form("/register");
    email.set_attr("name", "email");
    email.set_attr("data-val-required", "Email required.");
    form.query_selector("[data-valmsg-for=\"q\"]")
        .unwrap()
        .set_attr("data-valmsg-for", "email");

    let name = Element::new("input");
    name.set_attr("name", "name");
    name.set_attr("data-val", "true");
    name.set_attr("data-val-required", "Name required.");
    form.append_child(&name);
    let name_span = Element::new("span");
    name_span.set_attr("data-valmsg-for", "name");
    form.append_child(&name_span);

    let transport = Arc::new(MockTransport::new());
    let engine = Engine::builder(document)
        .with_transport(transport.clone())
        .build();
    let display = engine.services().validation.display();

    // Both fields empty: client validation blocks the request
    let error = engine.trigger(&form, TriggerOptions::new()).await.unwrap_err();
    assert_eq!(error.code(), "VALIDATION_ERROR");
    assert_eq!(transport.request_count(), 0);
    assert_eq!(
        display.displayed_message(&form, "email").as_deref(),
        Some("Email required.")
    );
    assert_eq!(
        display.displayed_message(&form, "name").as_deref(),
        Some("Name required.")
    );

    // Correcting one field clears exactly that field's error
    email.set_value("a@b.co");
    let error = engine.trigger(&form, TriggerOptions::new()).await.unwrap_err();
    assert_eq!(error.code(), "VALIDATION_ERROR");
    assert!(display.displayed_message(&form, "email").is_none());
    assert_eq!(
        display.displayed_message(&form, "name").as_deref(),
        Some("Name required.")
    );

    // All valid: the request finally goes out
    name.set_value("Ada");
    transport.enqueue(ok_text("welcome"));
    let ctx = engine.trigger(&form, TriggerOptions::new()).await.unwrap();
    assert!(ctx.success);
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test]
async fn server_validation_problem_reaches_field_display() {
    let (document, form, _email) = search_form("/register");
    form.query_selector("[name=\"q\"]").unwrap().set_attr("name", "email");
    form.query_selector("[data-valmsg-for=\"q\"]")
        .unwrap()
        .set_attr("data-valmsg-for", "email");
    form.query_selector("[name=\"email\"]").unwrap().set_value("a@b.co");

    let transport = Arc::new(MockTransport::new());
    transport.enqueue(
        Response::new(
            400,
            br#"{"title": "Validation failed", "errors": {"email": ["Required"]}}"#.to_vec(),
        )
        .with_status_text("Bad Request")
        .with_header("content-type", "application/problem+json"),
    );
    let engine = Engine::builder(document)
        .with_transport(transport.clone())
        .build();

    let error = engine.trigger(&form, TriggerOptions::new()).await.unwrap_err();

    assert_eq!(error.code(), "SERVER_VALIDATION_ERROR");
    assert_eq!(error.to_string(), "Validation failed");
    assert_eq!(
        engine
            .services()
            .validation
            .display()
            .displayed_message(&form, "email")
            .as_deref(),
        Some("Required")
    );
}

#[tokio::test]
async fn swap_is_idempotent_for_identical_content() {
    let (document, button, results) = action_button("/render");
    let transport = Arc::new(MockTransport::new());
    transport.enqueue(ok_text("<p>fragment</p>"));
    transport.enqueue(ok_text("<p>fragment</p>"));
    let engine = Engine::builder(document)
        .with_transport(transport.clone())
        .build();

    engine.trigger(&button, TriggerOptions::new()).await.unwrap();
    let once = results.text();
    engine.trigger(&button, TriggerOptions::new()).await.unwrap();

    assert_eq!(results.text(), once);
}

#[tokio::test]
async fn busy_state_restored_on_failure() {
    let (document, button, _results) = action_button("/save");
    let transport = Arc::new(MockTransport::new());
    transport.enqueue(Response::new(500, Vec::new()).with_status_text("Internal Server Error"));
    let engine = Engine::builder(document)
        .with_transport(transport.clone())
        .build();

    let options = TriggerOptions::new()
        .with_config(ConfigPatch::new().with_retry(RetryOverride::Disabled));
    let error = engine.trigger(&button, options).await.unwrap_err();

    assert_eq!(error.code(), "HTTP_ERROR");
    assert!(!button.is_disabled());
    assert!(!button.has_attr("aria-busy"));
    assert!(engine.services().coordinator.is_empty());
}

#[tokio::test]
async fn after_hooks_observe_terminal_error() {
    use futures::FutureExt;
    use parking_lot::Mutex;

    let (document, button, _results) = action_button("/save");
    button.set_attr("data-uplink-after", "inspect");
    let transport = Arc::new(MockTransport::new());
    transport.enqueue(Response::new(500, Vec::new()));
    let engine = Engine::builder(document)
        .with_transport(transport.clone())
        .build();

    let seen: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
    let seen_clone = seen.clone();
    engine.hooks().register_hook(
        "inspect",
        Arc::new(move |ctx| {
            let seen = seen_clone.clone();
            let code = ctx.error.as_ref().map(|e| e.code().to_string());
            async move {
                *seen.lock() = code;
                Ok(true)
            }
            .boxed()
        }),
    );

    let options = TriggerOptions::new()
        .with_config(ConfigPatch::new().with_retry(RetryOverride::Disabled));
    let _ = engine.trigger(&button, options).await;

    assert_eq!(seen.lock().as_deref(), Some("HTTP_ERROR"));
}
