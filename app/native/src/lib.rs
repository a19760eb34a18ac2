//! Notch Capsule - a hover-activated overlay panel controller.
//!
//! The capsule is a small window under the top edge of the screen that
//! expands into a larger panel while the pointer rests on it. This library
//! provides the expansion controller, its animators and platform seams, the
//! configuration layer, and the CLI.
//!
//! The Tauri adapter lives behind the `tauri` feature; without it the crate
//! drives a [`platform::headless::HeadlessWindow`].

pub mod capsule;
pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod platform;
pub mod schema;
