//! Backend implementations for the render module
//!
//! Device backends implement [`GraphicsContext`](super::GraphicsContext).
//! The headless backend records every call instead of executing it, which
//! makes the renderer testable without a GPU.

/// Command-recording backend for tests and tooling
pub mod headless;
