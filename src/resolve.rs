use std::collections::HashMap;

use async_trait::async_trait;
use tracing::debug;

use crate::binding::Binding;
use crate::element::Element;
use crate::error::Result;
use crate::page::Page;

/// Run-scoped map from label to container id. Owned by the run's resolver so
/// resolutions never leak between runs or tests.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: HashMap<String, String>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries.get(label).map(String::as_str)
    }

    pub fn insert(&mut self, label: impl Into<String>, id: impl Into<String>) {
        self.entries.insert(label.into(), id.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Capability: turn a binding's label into a container element id.
/// Returning `Ok(None)` means this strategy has nothing; the next one runs.
#[async_trait]
pub trait Locate: Send + Sync {
    async fn locate(
        &self,
        page: &Page,
        binding: &Binding,
        cache: &ResolutionCache,
    ) -> Result<Option<String>>;
}

/// Reuse an identifier resolved earlier in this run, if it is still on the page.
pub struct CacheLookup;

#[async_trait]
impl Locate for CacheLookup {
    async fn locate(
        &self,
        page: &Page,
        binding: &Binding,
        cache: &ResolutionCache,
    ) -> Result<Option<String>> {
        let Some(id) = cache.get(&binding.label) else {
            return Ok(None);
        };
        if element_exists(page, id).await {
            Ok(Some(id.to_string()))
        } else {
            Ok(None)
        }
    }
}

/// Direct lookup of a container id supplied in the binding.
pub struct ExplicitId;

#[async_trait]
impl Locate for ExplicitId {
    async fn locate(
        &self,
        page: &Page,
        binding: &Binding,
        _cache: &ResolutionCache,
    ) -> Result<Option<String>> {
        let Some(id) = binding.container_id.as_deref() else {
            return Ok(None);
        };
        if element_exists(page, id).await {
            Ok(Some(id.to_string()))
        } else {
            Ok(None)
        }
    }
}

/// Scan every element matching the field-container convention and take the
/// first whose visible text contains the label (substring match).
pub struct StructuralScan {
    pub container_selector: String,
}

#[async_trait]
impl Locate for StructuralScan {
    async fn locate(
        &self,
        page: &Page,
        binding: &Binding,
        _cache: &ResolutionCache,
    ) -> Result<Option<String>> {
        let containers = match page.find_elements(&self.container_selector).await {
            Ok(containers) => containers,
            Err(_) => return Ok(None),
        };
        for container in containers {
            let text = match container.inner_text().await {
                Ok(text) => text,
                Err(_) => continue,
            };
            if !text.contains(&binding.label) {
                continue;
            }
            // A container without an id cannot be refetched or cached.
            match container.id().await {
                Ok(Some(id)) => return Ok(Some(id)),
                _ => continue,
            }
        }
        Ok(None)
    }
}

/// Resolves labels to container elements: cache, then explicit id, then the
/// structural scan. Successful resolutions are written back to the cache, so
/// a label is scanned at most once per run. Not-found is a normal outcome.
pub struct FieldResolver {
    cache: ResolutionCache,
    scan: StructuralScan,
}

impl FieldResolver {
    pub fn new(container_selector: impl Into<String>) -> Self {
        Self {
            cache: ResolutionCache::new(),
            scan: StructuralScan {
                container_selector: container_selector.into(),
            },
        }
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    pub async fn resolve(&mut self, page: &Page, binding: &Binding) -> Result<Option<Element>> {
        let Some(id) = self.locate(page, binding).await? else {
            debug!(label = %binding.label, "no container matched");
            return Ok(None);
        };
        self.cache.insert(binding.label.as_str(), id.as_str());
        match page.find_element(&id_selector(&id)).await {
            Ok(el) => Ok(Some(el)),
            Err(_) => Ok(None),
        }
    }

    async fn locate(&self, page: &Page, binding: &Binding) -> Result<Option<String>> {
        let cached = CacheLookup;
        let explicit = ExplicitId;
        let strategies: [&dyn Locate; 3] = [&cached, &explicit, &self.scan];
        for strategy in strategies {
            if let Some(id) = strategy.locate(page, binding, &self.cache).await? {
                return Ok(Some(id));
            }
        }
        Ok(None)
    }
}

fn id_selector(id: &str) -> String {
    format!(r#"[id="{id}"]"#)
}

async fn element_exists(page: &Page, id: &str) -> bool {
    match page.find_elements(&id_selector(id)).await {
        Ok(matches) => !matches.is_empty(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_is_keyed_by_exact_label() {
        let mut cache = ResolutionCache::new();
        cache.insert("Annual Salary", "spl-form-element_7");
        assert_eq!(cache.get("Annual Salary"), Some("spl-form-element_7"));
        assert_eq!(cache.get("annual salary"), None);
        assert_eq!(cache.get("Annual Salary "), None);
    }

    #[test]
    fn reinsert_overwrites_the_entry() {
        let mut cache = ResolutionCache::new();
        cache.insert("Monthly Bonus", "spl-form-element_3");
        cache.insert("Monthly Bonus", "spl-form-element_9");
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("Monthly Bonus"), Some("spl-form-element_9"));
    }

    #[test]
    fn id_selector_quotes_the_identifier() {
        assert_eq!(id_selector("spl-form-element_1"), r#"[id="spl-form-element_1"]"#);
    }
}
