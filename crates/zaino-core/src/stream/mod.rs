//! Real-time flow sampling
//!
//! - Polling schedule, fallback policy and render hook ([`sample_stream`])
//! - Single-flight guard around each fetch ([`gate`])

pub mod gate;
pub mod sample_stream;
