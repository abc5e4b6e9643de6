use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::AutofillConfig;
use crate::element::{BoundingBox, Element};
use crate::error::{Error, Result};
use crate::page::Page;

/// Expression that holds once a selector dropdown has rendered its list.
const DROPDOWN_OPEN_JS: &str =
    r#"!!document.querySelector('[role="listbox"], [role="option"], [aria-expanded="true"]')"#;

/// A page element suspected of being a currency selector. Discarded after the
/// switch pass.
pub struct Candidate {
    pub element: Element,
    pub bbox: Option<BoundingBox>,
}

/// Where in the switch sequence a candidate failed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum SwitchStep {
    OpenDropdown,
    TypeFilter,
    FilterSettle,
    Confirm,
}

#[derive(Debug, Serialize)]
pub struct SwitchFailure {
    pub index: usize,
    pub step: SwitchStep,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct SwitchReport {
    pub attempted: usize,
    pub changed: usize,
    pub failures: Vec<SwitchFailure>,
}

struct StepError {
    step: SwitchStep,
    source: Error,
}

impl StepError {
    fn at(step: SwitchStep) -> impl FnOnce(Error) -> StepError {
        move |source| StepError { step, source }
    }
}

/// Finds every selector widget still showing the source currency and drives
/// each one to the target currency. Failures are isolated per widget; no
/// widget is retried.
pub struct CurrencySwitcher {
    config: AutofillConfig,
}

impl CurrencySwitcher {
    pub fn new(config: &AutofillConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    pub async fn switch_all(&self, page: &Page) -> Result<SwitchReport> {
        let candidates = self.discover(page).await?;
        info!(widgets = candidates.len(), target = %self.config.target_currency, "starting currency pass");

        let mut report = SwitchReport {
            attempted: candidates.len(),
            changed: 0,
            failures: Vec::new(),
        };
        for (index, candidate) in candidates.iter().enumerate() {
            match self.switch_one(page, &candidate.element).await {
                Ok(()) => {
                    info!(widget = index + 1, total = candidates.len(), "switched");
                    report.changed += 1;
                }
                Err(StepError { step, source }) => {
                    warn!(widget = index + 1, ?step, %source, "switch failed");
                    report.failures.push(SwitchFailure {
                        index,
                        step,
                        reason: source.to_string(),
                    });
                }
            }
            // Let the widget's own mutation finish before poking the next one.
            tokio::time::sleep(self.config.pacing_delay).await;
        }
        Ok(report)
    }

    /// Collect candidate widgets: the field-container convention first, a
    /// broad tag scan if that finds nothing, then cap and positional dedup.
    /// The cap runs first so the quadratic dedup stays bounded.
    pub async fn discover(&self, page: &Page) -> Result<Vec<Candidate>> {
        let mut candidates = self.scan_containers(page).await?;
        if candidates.is_empty() {
            debug!("no containers matched, falling back to broad scan");
            candidates = self.scan_broad(page).await?;
        }
        candidates.truncate(self.config.max_candidates);

        let boxes: Vec<Option<BoundingBox>> = candidates.iter().map(|c| c.bbox).collect();
        let keep = positional_unique(&boxes, self.config.dedup_tolerance);
        let deduped: Vec<Candidate> = candidates
            .into_iter()
            .enumerate()
            .filter(|(i, _)| keep.contains(i))
            .map(|(_, c)| c)
            .collect();
        Ok(deduped)
    }

    async fn scan_containers(&self, page: &Page) -> Result<Vec<Candidate>> {
        let elements = match page.find_elements(&self.config.container_selector).await {
            Ok(elements) => elements,
            Err(_) => return Ok(Vec::new()),
        };
        let mut candidates = Vec::new();
        for element in elements {
            let text = match element.inner_text().await {
                Ok(text) => text,
                Err(_) => continue,
            };
            if !text.contains(&self.config.source_currency) {
                continue;
            }
            let bbox = element.bounding_box().await.ok();
            candidates.push(Candidate { element, bbox });
        }
        Ok(candidates)
    }

    /// Any div/button/select/input-like element showing the source currency
    /// with a box large enough to be interactive rather than decorative.
    async fn scan_broad(&self, page: &Page) -> Result<Vec<Candidate>> {
        let elements = match page.find_elements("div, button, select, input").await {
            Ok(elements) => elements,
            Err(_) => return Ok(Vec::new()),
        };
        let min = self.config.min_widget_size;
        let mut candidates = Vec::new();
        for element in elements {
            let text = match element.inner_text().await {
                Ok(text) => text,
                Err(_) => continue,
            };
            if !text.contains(&self.config.source_currency) {
                continue;
            }
            let Ok(bbox) = element.bounding_box().await else {
                continue;
            };
            if bbox.width <= min || bbox.height <= min {
                continue;
            }
            candidates.push(Candidate {
                element,
                bbox: Some(bbox),
            });
        }
        Ok(candidates)
    }

    /// Open the dropdown, filter it to the target code, confirm. The filter
    /// poll is the load-bearing wait: the confirm keys race the widget's
    /// re-render without it.
    async fn switch_one(
        &self,
        page: &Page,
        widget: &Element,
    ) -> std::result::Result<(), StepError> {
        widget
            .click()
            .await
            .map_err(StepError::at(SwitchStep::OpenDropdown))?;
        page.wait_until("currency dropdown to open", DROPDOWN_OPEN_JS)
            .await
            .map_err(StepError::at(SwitchStep::OpenDropdown))?;

        page.select_all()
            .await
            .map_err(StepError::at(SwitchStep::TypeFilter))?;
        page.type_chars(&self.config.target_currency, self.config.type_delay)
            .await
            .map_err(StepError::at(SwitchStep::TypeFilter))?;

        let settled = filtered_option_js(&self.config.target_currency)
            .map_err(StepError::at(SwitchStep::FilterSettle))?;
        page.wait_until("dropdown filter to settle", &settled)
            .await
            .map_err(StepError::at(SwitchStep::FilterSettle))?;

        page.press("ArrowDown")
            .await
            .map_err(StepError::at(SwitchStep::Confirm))?;
        page.press("Enter")
            .await
            .map_err(StepError::at(SwitchStep::Confirm))?;
        Ok(())
    }
}

/// Expression that holds once a visible option shows the given currency code.
fn filtered_option_js(code: &str) -> Result<String> {
    let code_js = serde_json::to_string(code).map_err(|e| Error::JsError(e.to_string()))?;
    Ok(format!(
        r#"Array.from(document.querySelectorAll('[role="option"]')).some(o => (o.textContent || '').includes({code_js}) && o.offsetParent !== null)"#
    ))
}

/// Indices of candidates that are positionally distinct: a candidate whose
/// box is within the tolerance of an already-kept one (on both axes) is the
/// same logical widget. Candidates with no geometry are kept.
pub(crate) fn positional_unique(boxes: &[Option<BoundingBox>], tolerance: f64) -> Vec<usize> {
    let mut keep: Vec<usize> = Vec::new();
    for (i, bbox) in boxes.iter().enumerate() {
        let duplicate = match bbox {
            Some(b) => keep.iter().any(|&k| {
                boxes[k]
                    .as_ref()
                    .is_some_and(|other| b.within(other, tolerance))
            }),
            None => false,
        };
        if !duplicate {
            keep.push(i);
        }
    }
    keep
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(x: f64, y: f64) -> Option<BoundingBox> {
        Some(BoundingBox {
            x,
            y,
            width: 60.0,
            height: 24.0,
        })
    }

    #[test]
    fn near_duplicates_collapse() {
        let boxes = vec![bbox(100.0, 100.0), bbox(105.0, 95.0)];
        assert_eq!(positional_unique(&boxes, 10.0), vec![0]);
    }

    #[test]
    fn offset_on_one_axis_is_distinct() {
        let boxes = vec![bbox(100.0, 100.0), bbox(115.0, 100.0), bbox(100.0, 110.0)];
        assert_eq!(positional_unique(&boxes, 10.0), vec![0, 1, 2]);
    }

    #[test]
    fn boxless_candidates_are_kept() {
        let boxes = vec![bbox(100.0, 100.0), None, bbox(100.0, 101.0)];
        assert_eq!(positional_unique(&boxes, 10.0), vec![0, 1]);
    }

    #[test]
    fn duplicates_inside_the_cap_collapse() {
        let boxes = vec![
            bbox(100.0, 100.0),
            bbox(101.0, 100.0),
            bbox(100.0, 160.0),
            bbox(102.0, 161.0),
            bbox(100.0, 220.0),
        ];
        assert_eq!(positional_unique(&boxes, 10.0), vec![0, 2, 4]);
    }

    #[test]
    fn twenty_raw_candidates_cap_then_dedup_to_seventeen() {
        // 17 distinct rows, then 3 re-discoveries of earlier rows at the tail.
        let mut boxes: Vec<Option<BoundingBox>> =
            (0..17).map(|i| bbox(100.0, 100.0 + 40.0 * i as f64)).collect();
        boxes.push(bbox(101.0, 100.0));
        boxes.push(bbox(100.0, 141.0));
        boxes.push(bbox(99.0, 180.0));
        assert_eq!(boxes.len(), 20);

        boxes.truncate(17);
        assert_eq!(positional_unique(&boxes, 10.0).len(), 17);
    }
}
