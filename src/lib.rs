//! Bin-collection dashboard for a battery-powered tri-colour e-ink panel.
//!
//! Everything here is hardware-independent: the firmware binary wires these
//! pieces to ESP-IDF peripherals, and the host test suite drives them with
//! canned HTTP responses and an in-memory frame.

pub mod battery;
pub mod catalog;
pub mod config;
pub mod epd;
pub mod fetch;
pub mod framebuffer;
pub mod layout;
pub mod lifecycle;
pub mod render;
pub mod scene;
pub mod schedule;
pub mod time_ref;
