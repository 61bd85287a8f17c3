//! # btlq
//!
//! Decoders for Bluetooth controller link-quality telemetry.
//!
//! This library decodes two vendor diagnostic report formats: Intel
//! extended telemetry (a TLV stream describing one ACL or SCO link) and
//! the AOSP Bluetooth Quality Report (a fixed-layout record). Events are
//! routed by manufacturer identifier, decoded with strict bounds checking,
//! and reported as structured records or human-readable summary lines.

pub mod aosp;
pub mod capture;
pub mod config;
pub mod error;
pub mod intel;
pub mod journal;
pub mod report;
pub mod sink;
