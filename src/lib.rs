// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. viewport::ViewportBox)
    clippy::module_name_repetitions
)]

//! # Inkframe
//!
//! Diagram rendering through a remote SVG service.
//!
//! Diagram text is trimmed, encoded into URL-safe base64 and fetched from the
//! rendering service as `GET <service>/<payload>`. The returned SVG often has
//! a `viewBox` with a negative origin; it is re-anchored at (0, 0) and the
//! content shifted back into view so nothing is clipped when embedded.
//!
//! ## Modules
//!
//! - [`source`]: Normalization, payload encoding, upload decoding
//! - [`client`]: The rendering service client
//! - [`viewport`]: `viewBox` correction
//! - [`graphic`]: Render results
//! - [`session`]: Dropping results of superseded renders
//! - [`watcher`]: Debounced file watching for live re-rendering
//! - [`config`]: Flag defaults from rc files

pub mod client;
pub mod config;
pub mod graphic;
pub mod session;
pub mod source;
pub mod viewport;
pub mod watcher;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::client::RenderClient;
    pub use crate::graphic::{FailureKind, Graphic, RenderFailure, RenderResult};
    pub use crate::session::RenderSession;
    pub use crate::source::{DiagramSource, EncodedPayload, normalize};
    pub use crate::viewport::{ViewportBox, correct_viewport};
}
