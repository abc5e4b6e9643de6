//! End-to-end tests against a real browser. Start one with
//! `chromium --remote-debugging-port=9222` (any page open) before running:
//! `cargo test -- --ignored`.

use offer_autofill::binding::Binding;
use offer_autofill::currency::CurrencySwitcher;
use offer_autofill::{AutofillConfig, FieldResolver, Session, ValueFiller};

fn test_config() -> AutofillConfig {
    AutofillConfig::builder()
        .cdp_url("http://127.0.0.1:9222")
        .build()
}

/// Two field rows in the target form's container convention.
const FIXTURE_FORM_JS: &str = r#"
document.body.innerHTML = `
  <div id="spl-form-element_1">
    <label>Annual Salary</label>
    <button aria-expanded="false">USD</button>
    <input type="text">
  </div>
  <div id="spl-form-element_2">
    <label>Monthly Bonus</label>
    <button aria-expanded="false">USD</button>
    <input type="text">
  </div>
`;
"#;

/// Twenty positioned rows showing USD, the last three overlapping earlier ones.
const FIXTURE_WIDGETS_JS: &str = r#"
(() => {
    const rows = [];
    for (let i = 0; i < 17; i++) {
        rows.push([100, 100 + 40 * i]);
    }
    rows.push([101, 100]);
    rows.push([100, 141]);
    rows.push([99, 180]);
    document.body.innerHTML = rows
        .map(([x, y], i) =>
            `<div id="spl-form-element_${i}" style="position:absolute;left:${x}px;top:${y}px;width:80px;height:30px">USD</div>`)
        .join('');
})()
"#;

#[tokio::test]
#[ignore = "requires a browser listening on 127.0.0.1:9222 (--remote-debugging-port)"]
async fn attach_lists_open_tabs() {
    let session = Session::attach(&test_config())
        .await
        .expect("Failed to attach");
    let pages = session.pages().await.expect("Failed to list pages");
    assert!(!pages.is_empty(), "Expected at least one open tab");

    let page = session.active_page().await.expect("Failed to get active page");
    page.url().await.expect("Failed to read URL");
}

#[tokio::test]
#[ignore = "requires a browser listening on 127.0.0.1:9222 (--remote-debugging-port)"]
async fn resolves_labels_and_caches_the_identifier() {
    let config = test_config();
    let session = Session::attach(&config).await.expect("Failed to attach");
    let page = session.new_page("about:blank").await.expect("Failed to open page");
    page.evaluate_void(FIXTURE_FORM_JS).await.expect("Failed to build fixture");

    let mut resolver = FieldResolver::new(config.container_selector.as_str());
    let binding = Binding::new("Annual Salary", "E21");

    let first = resolver
        .resolve(&page, &binding)
        .await
        .expect("Resolution errored")
        .expect("Label should resolve");
    assert_eq!(first.id().await.unwrap().as_deref(), Some("spl-form-element_1"));
    assert_eq!(resolver.cache().get("Annual Salary"), Some("spl-form-element_1"));

    // Break the label text: only a cache hit can resolve it now.
    page.evaluate_void(
        r#"document.querySelector('#spl-form-element_1 label').textContent = 'renamed'"#,
    )
    .await
    .expect("Failed to mutate fixture");

    let second = resolver
        .resolve(&page, &binding)
        .await
        .expect("Resolution errored")
        .expect("Cached label should still resolve");
    assert_eq!(second.id().await.unwrap().as_deref(), Some("spl-form-element_1"));
}

#[tokio::test]
#[ignore = "requires a browser listening on 127.0.0.1:9222 (--remote-debugging-port)"]
async fn unknown_label_is_a_normal_not_found() {
    let config = test_config();
    let session = Session::attach(&config).await.expect("Failed to attach");
    let page = session.new_page("about:blank").await.expect("Failed to open page");
    page.evaluate_void(FIXTURE_FORM_JS).await.expect("Failed to build fixture");

    let mut resolver = FieldResolver::new(config.container_selector.as_str());
    let binding = Binding::new("No Such Field", "A1");
    let resolved = resolver
        .resolve(&page, &binding)
        .await
        .expect("Resolution errored");
    assert!(resolved.is_none());
    assert!(resolver.cache().is_empty());
}

#[tokio::test]
#[ignore = "requires a browser listening on 127.0.0.1:9222 (--remote-debugging-port)"]
async fn fills_a_field_through_tab_order() {
    let config = test_config();
    let session = Session::attach(&config).await.expect("Failed to attach");
    let page = session.new_page("about:blank").await.expect("Failed to open page");
    page.evaluate_void(FIXTURE_FORM_JS).await.expect("Failed to build fixture");

    let mut resolver = FieldResolver::new(config.container_selector.as_str());
    let binding = Binding::new("Annual Salary", "E21");
    let container = resolver
        .resolve(&page, &binding)
        .await
        .expect("Resolution errored")
        .expect("Label should resolve");

    let filler = ValueFiller::new(&config);
    let outcome = filler.fill(&page, &container, "1200000").await;
    assert!(outcome.is_filled(), "Fill failed: {outcome:?}");

    let typed = page
        .evaluate(r#"document.querySelector('#spl-form-element_1 input').value"#)
        .await
        .expect("Failed to read input value");
    assert!(typed.contains("1200000"), "Input value was: {typed}");
}

#[tokio::test]
#[ignore = "requires a browser listening on 127.0.0.1:9222 (--remote-debugging-port)"]
async fn discovery_caps_and_dedups_candidates() {
    let config = test_config();
    let session = Session::attach(&config).await.expect("Failed to attach");
    let page = session.new_page("about:blank").await.expect("Failed to open page");
    page.evaluate_void(FIXTURE_WIDGETS_JS).await.expect("Failed to build fixture");

    let switcher = CurrencySwitcher::new(&config);
    let candidates = switcher.discover(&page).await.expect("Discovery errored");
    assert_eq!(candidates.len(), 17, "20 raw widgets should cap+dedup to 17");
}
