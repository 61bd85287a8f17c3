//! # Intel Extended Telemetry Module
//!
//! Decoding of Intel controller extended telemetry vendor events.
//!
//! This module handles:
//! - TLV stream walking with strict bounds checks
//! - Tag dispatch through a static subevent table
//! - ACL vs SCO record selection by connection-handle tag
//! - Synthetic payload encoding for fixtures and round-trip tests

pub mod protocol;
pub mod table;
pub mod decoder;
pub mod encoder;
