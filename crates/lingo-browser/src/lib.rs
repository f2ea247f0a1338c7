//! Browser DOM layer for the lingo text enhancer.
//!
//! This crate binds `lingo-core` to live pages. It assumes a
//! `wasm32-unknown-unknown` target running as an extension content script.
//!
//! # Architecture
//!
//! - `surface`: `DomSurface`, the `TextSurface` over inputs, textareas and
//!   contentEditable roots
//! - `dispatch`: synthetic input, paste and keyboard events
//! - `clipboard`: async Clipboard API writes
//! - `strategies`: the browser mutation cascade
//! - `overlay`: shadow-root dropdown and word picker
//! - `listeners`: document event wiring around `EnhancerContext`
//! - `store`, `runtime`: `chrome.storage` and `chrome.runtime` bindings
//!
//! # Re-exports
//!
//! This crate re-exports `lingo-core` so consumers only need to depend on
//! `lingo-browser`.

pub use lingo_core;
pub use lingo_core::*;

pub mod clipboard;
pub mod dispatch;
pub mod listeners;
pub mod overlay;
pub mod runtime;
pub mod store;
pub mod strategies;
pub mod surface;

pub use listeners::Enhancer;
pub use overlay::{Overlay, OverlayEvent};
pub use store::{ChromeStore, ChromeSubscription};
pub use strategies::cascade;
pub use surface::DomSurface;
