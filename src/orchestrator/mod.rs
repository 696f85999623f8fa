//! Background task orchestration.
//!
//! Covers the periodic clock driver and the headless engine event logger.

pub mod event_consumer;
pub mod tick_driver;
