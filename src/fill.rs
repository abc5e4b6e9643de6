use serde::Serialize;
use tracing::debug;

use crate::config::AutofillConfig;
use crate::element::Element;
use crate::error::{Error, Result};
use crate::page::Page;

/// The combobox-like control inside a field container. Clicking it gives the
/// row focus so Tab lands on the adjacent editable control.
const CURRENCY_CONTROL_SELECTOR: &str = r#"[role="combobox"], button[aria-expanded], button"#;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum FillStrategy {
    /// Focus via the currency control, then Tab to the value box.
    TabOrder,
    /// Blind clicks at configured offsets from the container's right edge.
    PositionalClick,
}

/// Per-field result. Everything short of `Filled` is tallied, never raised.
#[derive(Debug, Serialize)]
pub enum FillOutcome {
    Filled(FillStrategy),
    /// The bound cell was empty; the page was never touched.
    SkippedEmpty,
    /// No container matched the label.
    NotFound,
    /// Resolution itself errored (page query failed mid-scan).
    ResolveFailed(String),
    /// Both strategies ran and failed.
    Failed { primary: String, fallback: String },
}

impl FillOutcome {
    pub fn is_filled(&self) -> bool {
        matches!(self, FillOutcome::Filled(_))
    }
}

/// Types a value into the editable control adjacent to a resolved container,
/// primary strategy first, positional fallback second.
pub struct ValueFiller {
    config: AutofillConfig,
}

impl ValueFiller {
    pub fn new(config: &AutofillConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub async fn fill(&self, page: &Page, container: &Element, value: &str) -> FillOutcome {
        if value.is_empty() {
            return FillOutcome::SkippedEmpty;
        }
        let primary = match self.fill_via_tab(page, container, value).await {
            Ok(()) => return FillOutcome::Filled(FillStrategy::TabOrder),
            Err(e) => e,
        };
        debug!(%primary, "tab-order fill failed, trying positional fallback");
        match self.fill_via_position(page, container, value).await {
            Ok(()) => FillOutcome::Filled(FillStrategy::PositionalClick),
            Err(fallback) => FillOutcome::Failed {
                primary: primary.to_string(),
                fallback: fallback.to_string(),
            },
        }
    }

    /// Click the currency control, Escape to close whatever that opened, Tab
    /// to the value box, overwrite it.
    async fn fill_via_tab(&self, page: &Page, container: &Element, value: &str) -> Result<()> {
        let control = container.find_element(CURRENCY_CONTROL_SELECTOR).await?;
        control.click().await?;
        page.press("Escape").await?;
        page.press("Tab").await?;
        page.select_all().await?;
        page.type_chars(value, self.config.type_delay).await?;
        Ok(())
    }

    /// The numeric input usually sits just left of a trailing currency badge;
    /// click each configured inset from the right edge until typing lands.
    async fn fill_via_position(&self, page: &Page, container: &Element, value: &str) -> Result<()> {
        let bbox = container.bounding_box().await?;
        let y = bbox.center_y();
        let mut last: Option<Error> = None;
        for inset in &self.config.fallback_insets {
            let x = bbox.right() - inset;
            if let Err(e) = page.click_at(x, y).await {
                last = Some(e);
                continue;
            }
            if let Err(e) = page.select_all().await {
                last = Some(e);
                continue;
            }
            match page.type_chars(value, self.config.type_delay).await {
                Ok(()) => return Ok(()),
                Err(e) => last = Some(e),
            }
        }
        Err(last.unwrap_or_else(|| {
            Error::ElementNotFound("no fallback click position configured".into())
        }))
    }
}
