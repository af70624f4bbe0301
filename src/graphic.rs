//! Outcome of one render request.

use std::fmt;

use crate::viewport::ViewportBox;

/// Aspect ratio policy for embedding: scale to fit, centered.
pub const PRESERVE_ASPECT_RATIO: &str = "xMidYMid meet";

/// Either a display-ready graphic or a failure message, never both.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderResult {
    Graphic(Graphic),
    Failure(RenderFailure),
}

impl RenderResult {
    pub const fn is_graphic(&self) -> bool {
        matches!(self, Self::Graphic(_))
    }

    pub const fn graphic(&self) -> Option<&Graphic> {
        match self {
            Self::Graphic(graphic) => Some(graphic),
            Self::Failure(_) => None,
        }
    }

    pub const fn failure(&self) -> Option<&RenderFailure> {
        match self {
            Self::Graphic(_) => None,
            Self::Failure(failure) => Some(failure),
        }
    }
}

impl From<Graphic> for RenderResult {
    fn from(graphic: Graphic) -> Self {
        Self::Graphic(graphic)
    }
}

impl From<RenderFailure> for RenderResult {
    fn from(failure: RenderFailure) -> Self {
        Self::Failure(failure)
    }
}

/// Corrected vector markup returned by the rendering service.
#[derive(Debug, Clone, PartialEq)]
pub struct Graphic {
    pub markup: String,
    /// Frame to display the markup in; `None` when the service sent no
    /// usable `viewBox`.
    pub viewport: Option<ViewportBox>,
}

impl Graphic {
    /// Wrap the markup in an outer `<svg>` that fits and centers it.
    pub fn embed(&self) -> String {
        let view_box = self
            .viewport
            .map(|vb| format!(" viewBox=\"{vb}\""))
            .unwrap_or_default();
        format!(
            "<svg{view_box} preserveAspectRatio=\"{PRESERVE_ASPECT_RATIO}\" class=\"w-full h-full\">{}</svg>",
            self.markup
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The service answered with a non-success status.
    ServiceRejection,
    /// No status was obtained: connection, timeout or body decoding error.
    TransportFailure,
}

/// A human-readable reason shown in place of the graphic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderFailure {
    pub kind: FailureKind,
    pub message: String,
    pub status: Option<u16>,
}

impl RenderFailure {
    pub fn rejected(status: u16) -> Self {
        Self {
            kind: FailureKind::ServiceRejection,
            message: format!("Failed to render diagram: HTTP {status}"),
            status: Some(status),
        }
    }

    pub fn transport(description: impl fmt::Display) -> Self {
        Self {
            kind: FailureKind::TransportFailure,
            message: format!("Failed to render diagram: {description}"),
            status: None,
        }
    }
}

impl fmt::Display for RenderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_message_carries_status() {
        let failure = RenderFailure::rejected(404);
        assert_eq!(failure.message, "Failed to render diagram: HTTP 404");
        assert_eq!(failure.status, Some(404));
        assert_eq!(failure.kind, FailureKind::ServiceRejection);
    }

    #[test]
    fn test_transport_failure_has_no_status() {
        let failure = RenderFailure::transport("connection refused");
        assert_eq!(failure.to_string(), "Failed to render diagram: connection refused");
        assert_eq!(failure.status, None);
    }

    #[test]
    fn test_embed_sets_viewbox_and_fit_policy() {
        let graphic = Graphic {
            markup: "<svg></svg>".to_string(),
            viewport: Some(ViewportBox::new(0.0, 0.0, 110.0, 55.0)),
        };
        assert_eq!(
            graphic.embed(),
            r#"<svg viewBox="0 0 110 55" preserveAspectRatio="xMidYMid meet" class="w-full h-full"><svg></svg></svg>"#
        );
    }

    #[test]
    fn test_embed_without_viewport_omits_viewbox() {
        let graphic = Graphic {
            markup: "<svg/>".to_string(),
            viewport: None,
        };
        assert!(!graphic.embed().contains("viewBox"));
    }

    #[test]
    fn test_result_accessors_are_exclusive() {
        let result = RenderResult::from(RenderFailure::rejected(500));
        assert!(!result.is_graphic());
        assert!(result.graphic().is_none());
        assert_eq!(result.failure().and_then(|f| f.status), Some(500));
    }
}
