use std::time::Duration;

/// Tuning knobs for one autofill run.
///
/// The pixel values (dedup tolerance, minimum widget size, fallback insets)
/// describe the target form's visual layout and are deliberately configuration
/// rather than constants.
#[derive(Debug, Clone)]
pub struct AutofillConfig {
    /// Remote debugging URL of the already-running browser.
    pub cdp_url: String,
    /// Currency code the widgets currently show.
    pub source_currency: String,
    /// Currency code to switch every widget to.
    pub target_currency: String,
    /// CSS selector matching the form's field-container convention.
    pub container_selector: String,
    /// Hard cap on currency candidates processed in one pass.
    pub max_candidates: usize,
    /// Candidates whose boxes differ by less than this on both axes are the
    /// same logical widget.
    pub dedup_tolerance: f64,
    /// Minimum width/height for the broad-scan fallback to treat an element
    /// as interactive rather than decorative text.
    pub min_widget_size: f64,
    /// Insets from a container's right edge where the value input is likely
    /// to sit, tried in order by the positional fill fallback.
    pub fallback_insets: Vec<f64>,
    /// Upper bound for `wait_until` predicate polling.
    pub poll_timeout: Duration,
    /// Pause after the bulk currency pass before field positions are trusted.
    pub settle_delay: Duration,
    /// Pause between consecutive widgets/fields.
    pub pacing_delay: Duration,
    /// Pause between simulated keystrokes.
    pub type_delay: Duration,
}

impl Default for AutofillConfig {
    fn default() -> Self {
        Self {
            cdp_url: "http://127.0.0.1:9222".into(),
            source_currency: "USD".into(),
            target_currency: "INR".into(),
            container_selector: r#"[id^="spl-form-element_"]"#.into(),
            max_candidates: 17,
            dedup_tolerance: 10.0,
            min_widget_size: 20.0,
            fallback_insets: vec![14.0, 50.0, 100.0],
            poll_timeout: Duration::from_secs(2),
            settle_delay: Duration::from_millis(1000),
            pacing_delay: Duration::from_millis(100),
            type_delay: Duration::from_millis(5),
        }
    }
}

impl AutofillConfig {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

pub struct ConfigBuilder {
    config: AutofillConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: AutofillConfig::default(),
        }
    }

    pub fn cdp_url(mut self, url: impl Into<String>) -> Self {
        self.config.cdp_url = url.into();
        self
    }

    pub fn source_currency(mut self, code: impl Into<String>) -> Self {
        self.config.source_currency = code.into();
        self
    }

    pub fn target_currency(mut self, code: impl Into<String>) -> Self {
        self.config.target_currency = code.into();
        self
    }

    pub fn container_selector(mut self, selector: impl Into<String>) -> Self {
        self.config.container_selector = selector.into();
        self
    }

    pub fn max_candidates(mut self, cap: usize) -> Self {
        self.config.max_candidates = cap;
        self
    }

    pub fn dedup_tolerance(mut self, pixels: f64) -> Self {
        self.config.dedup_tolerance = pixels;
        self
    }

    pub fn fallback_insets(mut self, insets: Vec<f64>) -> Self {
        self.config.fallback_insets = insets;
        self
    }

    pub fn poll_timeout(mut self, timeout: Duration) -> Self {
        self.config.poll_timeout = timeout;
        self
    }

    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.config.settle_delay = delay;
        self
    }

    pub fn pacing_delay(mut self, delay: Duration) -> Self {
        self.config.pacing_delay = delay;
        self
    }

    pub fn type_delay(mut self, delay: Duration) -> Self {
        self.config.type_delay = delay;
        self
    }

    pub fn build(self) -> AutofillConfig {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
