//! `viewBox` repair for markup returned by the rendering service.
//!
//! The service sometimes returns a graphic whose `viewBox` starts at a
//! negative origin. Embedded as-is, the part of the drawing left of or above
//! zero gets clipped. [`correct_viewport`] moves the frame to the origin,
//! grows it by the size of the negative offset and shifts the content back
//! into view with a `translate` on the root element.
//!
//! # Example
//!
//! ```
//! use inkframe::viewport::correct_viewport;
//!
//! let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="-10 -5 100 50"></svg>"#;
//! let fixed = correct_viewport(svg);
//! assert_eq!(fixed.viewport.unwrap().to_string(), "0 0 110 55");
//! assert!(fixed.markup.starts_with(r#"<svg transform="translate(10 5)" xmlns="#));
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::debug;

static VIEWBOX_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"viewBox="([^"]*)""#).expect("viewBox pattern is valid"));
static SVG_OPEN_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<svg\b[^>]*>").expect("svg tag pattern is valid"));
static TRANSFORM_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\stransform="([^"]*)""#).expect("transform pattern is valid"));

/// The coordinate frame declared by a `viewBox` attribute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewportBox {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Offset needed to bring content at a negative origin back into view.
    ///
    /// Each component is `-min(0, origin)`, so it is zero for non-negative
    /// origins.
    pub fn shift(&self) -> (f64, f64) {
        (negative_part(self.x), negative_part(self.y))
    }

    /// True if either origin component is negative.
    pub fn needs_shift(&self) -> bool {
        self.x < 0.0 || self.y < 0.0
    }

    /// The frame anchored at (0, 0) and enlarged by the negative offset.
    ///
    /// Applied unconditionally: a non-negative origin is dropped and the
    /// extent is kept as-is.
    pub fn corrected(&self) -> Self {
        let (dx, dy) = self.shift();
        Self::new(0.0, 0.0, self.width + dx, self.height + dy)
    }
}

fn negative_part(v: f64) -> f64 {
    if v < 0.0 { -v } else { 0.0 }
}

impl fmt::Display for ViewportBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.x, self.y, self.width, self.height)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ViewBoxError {
    #[error("expected 4 numbers in viewBox, found {0}")]
    Arity(usize),
    #[error("invalid viewBox number {0:?}")]
    Number(String),
}

impl FromStr for ViewportBox {
    type Err = ViewBoxError;

    /// Parse `"x y width height"`. Whitespace and commas both separate values.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|part| !part.is_empty())
            .collect();
        if parts.len() != 4 {
            return Err(ViewBoxError::Arity(parts.len()));
        }
        let mut values = [0.0_f64; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| ViewBoxError::Number((*part).to_string()))?;
        }
        let [x, y, width, height] = values;
        Ok(Self::new(x, y, width, height))
    }
}

/// Markup after viewport correction.
#[derive(Debug, Clone, PartialEq)]
pub struct Correction {
    /// The corrected frame, or `None` if the markup had no usable `viewBox`.
    pub viewport: Option<ViewportBox>,
    pub markup: String,
}

impl Correction {
    fn unchanged(markup: &str) -> Self {
        Self {
            viewport: None,
            markup: markup.to_string(),
        }
    }
}

/// Re-anchor the first `viewBox` in `markup` at the origin.
///
/// Markup without a `viewBox`, or with one that is not four finite numbers,
/// is returned byte-for-byte with no viewport. Otherwise the attribute value
/// is replaced by the corrected frame and, for a negative origin, the first
/// `<svg` opening tag gets a `translate` transform. Running the correction on
/// its own output changes nothing.
pub fn correct_viewport(markup: &str) -> Correction {
    let Some(value) = VIEWBOX_ATTR.captures(markup).and_then(|caps| caps.get(1)) else {
        return Correction::unchanged(markup);
    };
    let original = match value.as_str().parse::<ViewportBox>() {
        Ok(viewport) => viewport,
        Err(err) => {
            debug!(viewbox = value.as_str(), %err, "leaving markup unchanged");
            return Correction::unchanged(markup);
        }
    };

    let corrected = original.corrected();
    if !(corrected.width.is_finite() && corrected.height.is_finite()) {
        debug!(original = %original, "corrected viewBox overflows, leaving markup unchanged");
        return Correction::unchanged(markup);
    }
    let mut rewritten = String::with_capacity(markup.len() + 40);
    rewritten.push_str(&markup[..value.start()]);
    rewritten.push_str(&corrected.to_string());
    rewritten.push_str(&markup[value.end()..]);

    if original.needs_shift() {
        let (dx, dy) = original.shift();
        rewritten = insert_translate(&rewritten, dx, dy);
    }

    debug!(original = %original, corrected = %corrected, "corrected viewBox");
    Correction {
        viewport: Some(corrected),
        markup: rewritten,
    }
}

/// Add `translate(dx dy)` to the first `<svg` opening tag.
///
/// An existing `transform` on that tag is extended rather than duplicated.
fn insert_translate(markup: &str, dx: f64, dy: f64) -> String {
    let Some(tag) = SVG_OPEN_TAG.find(markup) else {
        debug!("no <svg> element to shift");
        return markup.to_string();
    };
    let translate = format!("translate({dx} {dy})");

    let (at, insertion) = match TRANSFORM_ATTR.captures(tag.as_str()).and_then(|caps| caps.get(1)) {
        Some(existing) => (tag.start() + existing.start(), format!("{translate} ")),
        None => (tag.start() + "<svg".len(), format!(" transform=\"{translate}\"")),
    };

    let mut out = String::with_capacity(markup.len() + insertion.len());
    out.push_str(&markup[..at]);
    out.push_str(&insertion);
    out.push_str(&markup[at..]);
    out
}
