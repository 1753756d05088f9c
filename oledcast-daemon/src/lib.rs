//! # oledcast-daemon
//!
//! Background service that drives a GameSense 128×40 OLED panel. It
//! registers with the local device service, listens for the browser
//! extension on loopback, and runs the render loop until Ctrl-C.
//!
//! ## Panels
//!
//! - **Hardware**: CPU/GPU/RAM stats (highest priority when enabled).
//! - **Media**: now playing, from the extension or the OS media session.
//! - **Clock**: the fallback.

pub mod config;
pub mod service;
