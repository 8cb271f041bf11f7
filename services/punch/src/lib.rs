//! Punch-in/out workflow for the HRMS attendance client
//!
//! The [`orchestrator::PunchOrchestrator`] drives one attendance screen:
//! it checks permissions, loads the user and the latest attendance record,
//! and runs the capture → locate → geocode → submit sequence against
//! device capabilities abstracted in [`capabilities`].

pub mod biometric;
pub mod capabilities;
pub mod config;
pub mod devices;
pub mod error;
pub mod locator;
pub mod orchestrator;
pub mod timer;

pub use error::{Notice, PunchError, PunchResult};
pub use orchestrator::{Devices, PunchOrchestrator, PunchReceipt, PunchState};
