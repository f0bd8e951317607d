//! Flow sample history and derived statistics
//!
//! Holds the rolling window of flow-rate samples shown on the dashboard
//! chart and the min/max/average figures computed from it.

pub mod buffer;
