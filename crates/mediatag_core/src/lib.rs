//! Media Tagger Core - Backend logic for Media Tagger
//!
//! This crate contains all business logic with zero UI dependencies.
//! It drives the external face/speech analysis tools, embeds metadata
//! into photos and videos, and routes the tagged copies to their final
//! destination. It can be used by a GUI front end or the CLI.

pub mod config;
pub mod discovery;
pub mod embed;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod process;
pub mod protocol;
pub mod reconcile;
pub mod routing;
pub mod session;
pub mod sidecar;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_returns_value() {
        assert!(!version().is_empty());
    }
}
