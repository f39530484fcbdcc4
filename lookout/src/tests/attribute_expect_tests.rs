//! Behavior of the attribute assertion state machine against a scripted
//! remote end.

use serde_json::{json, Value};

use super::{elements_value, error_response, init_tracing, path, test_session, MockTransport};
use crate::errors::WebDriverError;
use crate::transport::Method;

fn stub_input_element(transport: &MockTransport) {
    transport.stub_value(Method::Post, &path("/elements"), elements_value(&["9"]));
}

fn attr_path() -> String {
    path("/element/9/attribute/data-attr")
}

#[tokio::test(start_paused = true)]
async fn passes_first_attempt_when_attribute_is_present() {
    init_tracing();
    let transport = MockTransport::new();
    stub_input_element(&transport);
    transport.stub_value(Method::Get, &attr_path(), json!("ready"));

    let session = test_session(transport.clone());
    let outcome = session
        .expect("input[name=q]")
        .to_have_attribute("data-attr")
        .assert()
        .await
        .unwrap();

    assert!(outcome.passed);
    assert_eq!(outcome.retries, 0);
    assert_eq!(outcome.expected, "found");
    assert_eq!(outcome.actual, "found");
    assert_eq!(transport.calls_to(&attr_path()), 1);
}

#[tokio::test(start_paused = true)]
async fn passes_after_attribute_appears_within_deadline() {
    let transport = MockTransport::new();
    stub_input_element(&transport);
    // Absent for two polls, present on the third
    transport.stub_value(Method::Get, &attr_path(), Value::Null);
    transport.stub_value(Method::Get, &attr_path(), Value::Null);
    transport.stub_value(Method::Get, &attr_path(), json!("ready"));

    let session = test_session(transport.clone());
    let outcome = session
        .expect("input[name=q]")
        .to_have_attribute("data-attr")
        .assert()
        .await
        .unwrap();

    assert!(outcome.passed);
    assert_eq!(outcome.retries, 2);
    assert_eq!(outcome.actual, "found");
}

#[tokio::test(start_paused = true)]
async fn fails_at_deadline_when_attribute_never_appears() {
    let transport = MockTransport::new();
    stub_input_element(&transport);
    transport.stub_value(Method::Get, &attr_path(), Value::Null);

    let session = test_session(transport.clone());
    let outcome = session
        .expect("input[name=q]")
        .to_have_attribute("data-attr")
        .assert()
        .await
        .unwrap();

    assert!(!outcome.passed);
    assert_eq!(outcome.expected, "found");
    assert_eq!(outcome.actual, "not found");
    assert_eq!(
        outcome.message,
        "Expected element <input[name=q]> to have attribute \"data-attr\" - attribute was not found"
    );
}

#[tokio::test(start_paused = true)]
async fn negated_assertion_ignores_a_transient_match() {
    let transport = MockTransport::new();
    stub_input_element(&transport);
    // Present on the first two polls, gone on the third: a flaky early
    // positive must not finalize the negated assertion as failed.
    transport.stub_value(Method::Get, &attr_path(), json!("ghost"));
    transport.stub_value(Method::Get, &attr_path(), json!("ghost"));
    transport.stub_value(Method::Get, &attr_path(), Value::Null);

    let session = test_session(transport.clone());
    let outcome = session
        .expect("input[name=q]")
        .not()
        .to_have_attribute("data-attr")
        .assert()
        .await
        .unwrap();

    assert!(outcome.passed);
    assert_eq!(outcome.retries, 2);
    assert_eq!(outcome.expected, "not found");
    assert_eq!(outcome.actual, "not found");
}

#[tokio::test(start_paused = true)]
async fn negated_assertion_fails_only_when_match_persists_to_deadline() {
    let transport = MockTransport::new();
    stub_input_element(&transport);
    transport.stub_value(Method::Get, &attr_path(), json!("still-here"));

    let session = test_session(transport.clone());
    let outcome = session
        .expect("input[name=q]")
        .not()
        .to_have_attribute("data-attr")
        .assert()
        .await
        .unwrap();

    assert!(!outcome.passed);
    assert!(outcome.retries > 0, "must keep polling past the first match");
    assert_eq!(outcome.expected, "not found");
    assert_eq!(outcome.actual, "found");
    assert_eq!(
        outcome.message,
        "Expected element <input[name=q]> to not have attribute \"data-attr\""
    );
}

#[tokio::test(start_paused = true)]
async fn condition_gates_an_otherwise_passing_presence_check() {
    let transport = MockTransport::new();
    stub_input_element(&transport);
    transport.stub_value(Method::Get, &attr_path(), json!("loading"));

    let session = test_session(transport.clone());
    let outcome = session
        .expect("input[name=q]")
        .to_have_attribute("data-attr")
        .equals("ready")
        .assert()
        .await
        .unwrap();

    assert!(!outcome.passed);
    assert_eq!(outcome.expected, "equal to 'ready'");
    assert_eq!(outcome.actual, "'loading'");
    assert_eq!(
        outcome.message,
        "Expected element <input[name=q]> to have attribute \"data-attr\" which equals: 'ready'"
    );
}

#[tokio::test(start_paused = true)]
async fn condition_passes_the_instant_the_value_matches() {
    let transport = MockTransport::new();
    stub_input_element(&transport);
    transport.stub_value(Method::Get, &attr_path(), json!("loading"));
    transport.stub_value(Method::Get, &attr_path(), json!("ready"));

    let session = test_session(transport.clone());
    let outcome = session
        .expect("input[name=q]")
        .to_have_attribute("data-attr")
        .equals("ready")
        .assert()
        .await
        .unwrap();

    assert!(outcome.passed);
    assert_eq!(outcome.retries, 1);
    assert_eq!(outcome.actual, "'ready'");
}

// The concrete end-to-end scenario: handle 9, attribute absent for two
// polls, then "ready".
#[tokio::test(start_paused = true)]
async fn attribute_appearing_with_expected_value_after_two_polls() {
    let transport = MockTransport::new();
    stub_input_element(&transport);
    transport.stub_value(Method::Get, &attr_path(), Value::Null);
    transport.stub_value(Method::Get, &attr_path(), Value::Null);
    transport.stub_value(Method::Get, &attr_path(), json!("ready"));

    let session = test_session(transport.clone());
    let outcome = session
        .expect("input[name=q]")
        .to_have_attribute("data-attr")
        .equals("ready")
        .assert()
        .await
        .unwrap();

    assert!(outcome.passed);
    assert_eq!(outcome.retries, 2);
    assert!(outcome.actual.contains("ready"));
}

#[tokio::test(start_paused = true)]
async fn missing_attribute_always_fails_a_condition_even_negated() {
    let transport = MockTransport::new();
    stub_input_element(&transport);
    transport.stub_value(Method::Get, &attr_path(), Value::Null);

    let session = test_session(transport.clone());
    let outcome = session
        .expect("input[name=q]")
        .not()
        .to_have_attribute("data-attr")
        .equals("ready")
        .assert()
        .await
        .unwrap();

    // A predicate cannot be evaluated against a missing value, so negation
    // does not rescue this.
    assert!(!outcome.passed);
    assert_eq!(outcome.actual, "not found");
}

#[tokio::test(start_paused = true)]
async fn contains_and_not_equals_refinements() {
    let transport = MockTransport::new();
    stub_input_element(&transport);
    transport.stub_value(Method::Get, &attr_path(), json!("almost ready"));

    let session = test_session(transport.clone());
    let outcome = session
        .expect("input[name=q]")
        .to_have_attribute("data-attr")
        .contains("ready")
        .assert()
        .await
        .unwrap();
    assert!(outcome.passed);

    let outcome = session
        .expect("input[name=q]")
        .to_have_attribute("data-attr")
        .not_equals("ready")
        .assert()
        .await
        .unwrap();
    assert!(outcome.passed);
    assert_eq!(outcome.expected, "not equal to 'ready'");
}

#[tokio::test(start_paused = true)]
async fn regex_condition_matches_the_produced_value() {
    let transport = MockTransport::new();
    stub_input_element(&transport);
    transport.stub_value(Method::Get, &attr_path(), json!("ready-42"));

    let session = test_session(transport.clone());
    let outcome = session
        .expect("input[name=q]")
        .to_have_attribute("data-attr")
        .matches(r"^ready-\d+$")
        .assert()
        .await
        .unwrap();

    assert!(outcome.passed);
    assert_eq!(outcome.retries, 0);
}

#[tokio::test(start_paused = true)]
async fn malformed_regex_fails_before_any_polling() {
    let transport = MockTransport::new();
    let session = test_session(transport.clone());

    let err = session
        .expect("input[name=q]")
        .to_have_attribute("data-attr")
        .matches("(unclosed")
        .assert()
        .await
        .unwrap_err();

    assert!(matches!(err, WebDriverError::MalformedCondition(_)));
    assert!(transport.calls().is_empty(), "no wire traffic may happen");
}

#[tokio::test(start_paused = true)]
async fn terminated_session_propagates_immediately() {
    let transport = MockTransport::new();
    stub_input_element(&transport);
    transport.stub(
        Method::Get,
        &attr_path(),
        error_response("invalid session id", "session deleted"),
    );

    let session = test_session(transport.clone());
    let err = session
        .expect("input[name=q]")
        .to_have_attribute("data-attr")
        .assert()
        .await
        .unwrap_err();

    assert!(matches!(err, WebDriverError::SessionTerminated(_)));
    // No retries against a dead session
    assert_eq!(transport.calls_to(&attr_path()), 1);
}

#[tokio::test(start_paused = true)]
async fn transport_flakiness_is_retried_like_absence() {
    let transport = MockTransport::new();
    stub_input_element(&transport);
    transport.stub(
        Method::Get,
        &attr_path(),
        error_response("unknown error", "connection reset"),
    );
    transport.stub_value(Method::Get, &attr_path(), json!("ready"));

    let session = test_session(transport.clone());
    let outcome = session
        .expect("input[name=q]")
        .to_have_attribute("data-attr")
        .assert()
        .await
        .unwrap();

    assert!(outcome.passed);
    assert_eq!(outcome.retries, 1);
}

#[tokio::test(start_paused = true)]
async fn element_that_never_appears_fails_as_not_found() {
    let transport = MockTransport::new();
    transport.stub_value(Method::Post, &path("/elements"), elements_value(&[]));

    let session = test_session(transport.clone());
    let outcome = session
        .expect("input[name=q]")
        .to_have_attribute("data-attr")
        .assert()
        .await
        .unwrap();

    assert!(!outcome.passed);
    assert_eq!(outcome.actual, "not found");
    assert!(outcome.message.ends_with("- attribute was not found"));
}

#[tokio::test(start_paused = true)]
async fn custom_message_replaces_the_default() {
    let transport = MockTransport::new();
    stub_input_element(&transport);
    transport.stub_value(Method::Get, &attr_path(), Value::Null);

    let session = test_session(transport.clone());
    let outcome = session
        .expect("input[name=q]")
        .to_have_attribute("data-attr")
        .with_message("Search box readiness marker")
        .before(0)
        .assert()
        .await
        .unwrap();

    assert!(!outcome.passed);
    assert!(outcome.message.starts_with("Search box readiness marker"));
}
