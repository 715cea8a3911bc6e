//! Emnode driver interface
//!
//! The crate provides an interface between a CAN device driver and the emnode
//! stack. Limited scope facilitates compatibility across versions.
//! Driver crates should depend on this crate. Emnode stack users should depend
//! on the `emnode` crate instead.
//!
//! A driver exposes a [`bus::Bus`] implementation: timeout-bounded transmit
//! and receive of single [`frame::Frame`]s, a non-blocking pending check, and
//! hardware acceptance-filter registration. The stack polls the bus
//! cooperatively; it never holds a receive open beyond the caller-supplied
//! timeout, and it relies on the hardware filter bank (not software matching)
//! to decide which frames reach it at all.
//!
//! Filter registration returns an opaque [`frame::FilterSlot`]. The driver
//! must annotate every received frame with the slot that matched it; the
//! stack uses that annotation as its dispatch key.

#![no_std]

pub mod bus;
pub mod frame;

pub mod time {
    pub use embassy_time::{Duration, Instant};
}
