//! Hardware-independent core library for vacuum-rs
//!
//! This crate contains all platform-agnostic logic for the differential vacuum
//! gauge: sampling and filtering of the two pressure transducers, calibration,
//! unit conversion, the display state machine with its menu, and the
//! sub-character bargraph renderer.
//!
//! It is `#![no_std]` without an allocator, so it compiles on small
//! microcontrollers and on desktop hosts (for the simulator and tests). The
//! display and ADC drivers are supplied by the caller through the
//! [`display::CharDisplay`] and [`sampling::PressureInputs`] traits.

#![no_std]

pub mod bargraph;
pub mod calibration;
pub mod char_buffer;
pub mod config;
pub mod display;
pub mod gauge;
pub mod menu;
pub mod range;
pub mod sampling;
pub mod shared;
pub mod units;
pub mod views;
