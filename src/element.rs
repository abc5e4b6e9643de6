use chromiumoxide::cdp::browser_protocol::dom::GetBoxModelParams;
use chromiumoxide::element::Element as CrElement;
use chromiumoxide::page::Page as CrPage;

use crate::error::{Error, Result};

/// Viewport-space rectangle of a rendered element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn center_y(&self) -> f64 {
        self.y + self.height / 2.0
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Whether another box sits within `tolerance` pixels on both axes,
    /// close enough to be the same logical widget.
    pub fn within(&self, other: &BoundingBox, tolerance: f64) -> bool {
        (self.x - other.x).abs() < tolerance && (self.y - other.y).abs() < tolerance
    }
}

/// Wrapper around a chromiumoxide Element. Carries a page handle because box
/// geometry is a page-level CDP command.
pub struct Element {
    inner: CrElement,
    page: CrPage,
}

impl Element {
    pub(crate) fn new(inner: CrElement, page: CrPage) -> Self {
        Self { inner, page }
    }

    /// Returns a reference to the underlying chromiumoxide Element.
    pub fn inner(&self) -> &CrElement {
        &self.inner
    }

    /// Click this element (scrolls into view first).
    pub async fn click(&self) -> Result<()> {
        self.inner.click().await?;
        Ok(())
    }

    /// Get the inner text of this element ("" when it has none).
    pub async fn inner_text(&self) -> Result<String> {
        Ok(self.inner.inner_text().await?.unwrap_or_default())
    }

    /// Get the value of an attribute on this element.
    pub async fn attribute(&self, name: &str) -> Result<Option<String>> {
        Ok(self.inner.attribute(name).await?)
    }

    /// The element's `id` attribute, if any.
    pub async fn id(&self) -> Result<Option<String>> {
        self.attribute("id").await
    }

    /// The element's rendered box from the CDP box model (content quad).
    /// Fails for detached or unrendered elements.
    pub async fn bounding_box(&self) -> Result<BoundingBox> {
        let params = GetBoxModelParams::builder()
            .backend_node_id(self.inner.backend_node_id)
            .build();
        let resp = self.page.execute(params).await?;
        let quad = resp.result.model.content.inner();
        if quad.len() < 8 {
            return Err(Error::ElementNotFound("element has no box model".into()));
        }
        let xs = [quad[0], quad[2], quad[4], quad[6]];
        let ys = [quad[1], quad[3], quad[5], quad[7]];
        let min_x = xs.iter().cloned().fold(f64::INFINITY, f64::min);
        let max_x = xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let min_y = ys.iter().cloned().fold(f64::INFINITY, f64::min);
        let max_y = ys.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        Ok(BoundingBox {
            x: min_x,
            y: min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        })
    }

    /// Find a child element matching the given CSS selector.
    pub async fn find_element(&self, selector: &str) -> Result<Element> {
        let el = self
            .inner
            .find_element(selector)
            .await
            .map_err(|e| Error::ElementNotFound(e.to_string()))?;
        Ok(Element::new(el, self.page.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boxes_within_tolerance_match() {
        let a = BoundingBox { x: 100.0, y: 200.0, width: 40.0, height: 20.0 };
        let b = BoundingBox { x: 109.0, y: 191.0, width: 44.0, height: 22.0 };
        assert!(a.within(&b, 10.0));
    }

    #[test]
    fn boxes_apart_on_either_axis_differ() {
        let a = BoundingBox { x: 100.0, y: 200.0, width: 40.0, height: 20.0 };
        let same_y = BoundingBox { x: 110.0, y: 200.0, width: 40.0, height: 20.0 };
        let same_x = BoundingBox { x: 100.0, y: 212.0, width: 40.0, height: 20.0 };
        assert!(!a.within(&same_y, 10.0));
        assert!(!a.within(&same_x, 10.0));
    }

    #[test]
    fn center_and_right_edge() {
        let b = BoundingBox { x: 10.0, y: 20.0, width: 100.0, height: 30.0 };
        assert_eq!(b.center_y(), 35.0);
        assert_eq!(b.right(), 110.0);
    }
}
