//! Hardware-independent core library for aero-rs
//!
//! This crate contains all platform-agnostic logic for the aero environmental
//! monitor: the sampling pipeline, the shared measurement snapshot, the
//! scrolling history graphs, the display compositor, and the backlight power
//! controller.
//!
//! It is `#![no_std]` with `extern crate alloc` so it compiles on both
//! embedded targets (ESP32-S3) and desktop hosts (for the simulator and tests).

#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod clock;
pub mod compositor;
pub mod config;
pub mod graph;
pub mod layout;
pub mod panel;
pub mod power;
pub mod reader;
pub mod sample;
pub mod shared;
pub mod telemetry;
