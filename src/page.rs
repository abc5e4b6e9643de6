use std::time::Duration;

use chromiumoxide::cdp::browser_protocol::input::{
    DispatchKeyEventParams, DispatchKeyEventType, DispatchMouseEventParams,
    DispatchMouseEventType, MouseButton,
};
use chromiumoxide::page::Page as CrPage;

use crate::element::Element;
use crate::error::{Error, Result};

/// How often `wait_until` re-evaluates its predicate.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Modifier bit for Control in CDP key events.
const MODIFIER_CTRL: i64 = 2;

/// (code, virtual key, text) for the named keys the fill protocol sends.
fn key_descriptor(key: &str) -> Option<(&'static str, i64, Option<&'static str>)> {
    match key {
        "Enter" => Some(("Enter", 13, Some("\r"))),
        "Tab" => Some(("Tab", 9, None)),
        "Escape" => Some(("Escape", 27, None)),
        "ArrowDown" => Some(("ArrowDown", 40, None)),
        _ => None,
    }
}

/// Wrapper around a chromiumoxide Page with the queries and input primitives
/// the fill protocol needs. All input goes through the CDP Input domain, so
/// keystrokes land on whatever control currently holds focus.
pub struct Page {
    inner: CrPage,
    poll_timeout: Duration,
}

impl Page {
    pub(crate) fn new(inner: CrPage, poll_timeout: Duration) -> Self {
        Self {
            inner,
            poll_timeout,
        }
    }

    /// Returns a reference to the underlying chromiumoxide Page.
    pub fn inner(&self) -> &CrPage {
        &self.inner
    }

    /// Get the current page URL.
    pub async fn url(&self) -> Result<String> {
        self.inner
            .url()
            .await?
            .ok_or_else(|| Error::JsError("no URL found".into()))
    }

    // ── Element Queries ─────────────────────────────────────────────

    /// Find an element matching the given CSS selector.
    pub async fn find_element(&self, selector: &str) -> Result<Element> {
        let el = self
            .inner
            .find_element(selector)
            .await
            .map_err(|e| Error::ElementNotFound(e.to_string()))?;
        Ok(Element::new(el, self.inner.clone()))
    }

    /// Find all elements matching the given CSS selector.
    pub async fn find_elements(&self, selector: &str) -> Result<Vec<Element>> {
        let els = self
            .inner
            .find_elements(selector)
            .await
            .map_err(|e| Error::ElementNotFound(e.to_string()))?;
        Ok(els
            .into_iter()
            .map(|el| Element::new(el, self.inner.clone()))
            .collect())
    }

    // ── Evaluation ──────────────────────────────────────────────────

    /// Evaluate a JavaScript expression and return the result as a string.
    pub async fn evaluate(&self, expression: &str) -> Result<String> {
        let result = self
            .inner
            .evaluate(expression)
            .await
            .map_err(|e| Error::JsError(e.to_string()))?;
        match result.value() {
            Some(val) => Ok(val.to_string()),
            None => Ok(String::new()),
        }
    }

    /// Evaluate a JavaScript expression without caring about the return value.
    pub async fn evaluate_void(&self, expression: &str) -> Result<()> {
        self.inner
            .evaluate(expression)
            .await
            .map_err(|e| Error::JsError(e.to_string()))?;
        Ok(())
    }

    /// Evaluate a JavaScript expression expected to yield a boolean.
    pub async fn eval_bool(&self, expression: &str) -> Result<bool> {
        let result = self
            .inner
            .evaluate(expression)
            .await
            .map_err(|e| Error::JsError(e.to_string()))?;
        Ok(result.value().and_then(|v| v.as_bool()).unwrap_or(false))
    }

    /// Re-evaluate `predicate_js` every 50ms until it yields true or the
    /// configured poll timeout elapses. `what` names the condition in the
    /// timeout error so mistimed UI waits are diagnosable.
    pub async fn wait_until(&self, what: &str, predicate_js: &str) -> Result<()> {
        let start = std::time::Instant::now();
        loop {
            if self.eval_bool(predicate_js).await? {
                return Ok(());
            }
            if start.elapsed() >= self.poll_timeout {
                return Err(Error::Timeout(what.to_string()));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    // ── Input ───────────────────────────────────────────────────────

    /// Press a named key (e.g. "Enter", "Tab", "Escape", "ArrowDown") on
    /// whatever control currently holds focus. Raw dispatch, no refocusing:
    /// the fill protocol depends on focus staying where the last click or
    /// Tab left it.
    pub async fn press(&self, key: &str) -> Result<()> {
        let (code, vk, text) = key_descriptor(key)
            .ok_or_else(|| Error::Input(format!("unsupported key: {key}")))?;

        // Keys that produce no text use rawKeyDown; Chrome still runs their
        // default action (focus traversal, confirm) off the virtual key code.
        let down_type = if text.is_some() {
            DispatchKeyEventType::KeyDown
        } else {
            DispatchKeyEventType::RawKeyDown
        };
        let mut down = DispatchKeyEventParams::builder()
            .r#type(down_type)
            .key(key)
            .code(code)
            .windows_virtual_key_code(vk)
            .native_virtual_key_code(vk);
        if let Some(text) = text {
            down = down.text(text);
        }
        self.inner.execute(down.build().map_err(Error::Input)?).await?;

        let up = DispatchKeyEventParams::builder()
            .r#type(DispatchKeyEventType::KeyUp)
            .key(key)
            .code(code)
            .windows_virtual_key_code(vk)
            .native_virtual_key_code(vk)
            .build()
            .map_err(Error::Input)?;
        self.inner.execute(up).await?;
        Ok(())
    }

    /// Select the focused control's content (Ctrl+A).
    pub async fn select_all(&self) -> Result<()> {
        let down = DispatchKeyEventParams::builder()
            .r#type(DispatchKeyEventType::KeyDown)
            .key("a")
            .code("KeyA")
            .modifiers(MODIFIER_CTRL)
            .build()
            .map_err(Error::Input)?;
        self.inner.execute(down).await?;

        let up = DispatchKeyEventParams::builder()
            .r#type(DispatchKeyEventType::KeyUp)
            .key("a")
            .code("KeyA")
            .modifiers(MODIFIER_CTRL)
            .build()
            .map_err(Error::Input)?;
        self.inner.execute(up).await?;
        Ok(())
    }

    /// Type text into the focused control, one key event per character.
    pub async fn type_chars(&self, text: &str, delay: Duration) -> Result<()> {
        for ch in text.chars() {
            let down = DispatchKeyEventParams::builder()
                .r#type(DispatchKeyEventType::KeyDown)
                .key(ch.to_string())
                .text(ch.to_string())
                .build()
                .map_err(Error::Input)?;
            self.inner.execute(down).await?;

            let up = DispatchKeyEventParams::builder()
                .r#type(DispatchKeyEventType::KeyUp)
                .key(ch.to_string())
                .build()
                .map_err(Error::Input)?;
            self.inner.execute(up).await?;

            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    /// Click at viewport coordinates: move, press, release.
    pub async fn click_at(&self, x: f64, y: f64) -> Result<()> {
        let moved = DispatchMouseEventParams::builder()
            .r#type(DispatchMouseEventType::MouseMoved)
            .x(x)
            .y(y)
            .build()
            .map_err(Error::Input)?;
        self.inner.execute(moved).await?;

        let pressed = DispatchMouseEventParams::builder()
            .r#type(DispatchMouseEventType::MousePressed)
            .x(x)
            .y(y)
            .button(MouseButton::Left)
            .click_count(1)
            .build()
            .map_err(Error::Input)?;
        self.inner.execute(pressed).await?;

        let released = DispatchMouseEventParams::builder()
            .r#type(DispatchMouseEventType::MouseReleased)
            .x(x)
            .y(y)
            .button(MouseButton::Left)
            .click_count(1)
            .build()
            .map_err(Error::Input)?;
        self.inner.execute(released).await?;
        Ok(())
    }
}
