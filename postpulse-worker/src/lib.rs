//! # PostPulse Worker Library
//!
//! Background process that publishes scheduled posts once their time comes.
//!
//! ## Modules
//!
//! - `config`: Environment configuration
//! - `sweep`: The periodic publish sweep

pub mod config;
pub mod sweep;
