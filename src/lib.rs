#![cfg_attr(not(test), no_std)]

// This must go first so the logging macros are visible to the other modules.
mod fmt;

#[cfg(feature = "rp2040")]
pub mod clock;
pub mod config;
#[cfg(feature = "rp2040")]
pub mod dac;
pub mod divider;
pub mod error;
pub mod gpio;
pub mod peripheral;
pub mod sweep;
#[cfg(feature = "rp2040")]
pub mod time;
