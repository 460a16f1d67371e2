//! Core logic for the Typology group bot.
//!
//! Framework-agnostic: Telegram and the external tools (yt-dlp, ffmpeg, the
//! chat model) live behind ports implemented in adapter crates.

pub mod app;
pub mod clip;
pub mod commands;
pub mod config;
pub mod cooldown;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod gate;
pub mod general;
pub mod links;
pub mod logging;
pub mod moderation;
pub mod platform;
pub mod ports;
pub mod relay;
pub mod scratch;
pub mod texts;

#[cfg(test)]
mod testing;

pub use errors::{Error, Result};
