//! # Emnode
//!
//! This library provides a typed application-layer protocol for many logical
//! sensor nodes sharing one Classic CAN bus in no_std environments. It uses
//! fixed-capacity storage throughout, requiring no dynamic memory allocation.
//!
//! ```text
//!  ┌──────────────┐     poll_once      ┌────────────┐
//!  │ Control loop ├───────────────────►│  Registry  │
//!  └──────────────┘                    └──────┬─────┘
//!                                             │ filter-slot /
//!  ┌──────────────┐    Bus trait              │ address routing
//!  │  CAN driver  │◄──────────────┐           ▼
//!  └──────────────┘               │    ┌────────────┐
//!                                 ├────┤  Handlers  │
//!  ┌───────────────────────┐      │    └────────────┘
//!  │ codec / transfer APIs │◄─────┘
//!  └───────────────────────┘
//! ```
//!
//! Components:
//! * _Registry_ ([`node::Registry`]) is the arena of node descriptors: per-node
//!   address, filter table, request handler, and owned name/info strings.
//!   Its `poll_once` is the dispatch loop: it fetches at most one pending
//!   frame from the driver and routes it to at most one handler.
//! * _Handlers_ ([`node::Handler`]) are user objects reacting to frames. They
//!   receive an [`node::Endpoint`] bound to the owning node for typed replies.
//! * _Codec_ ([`codec`]) encodes and decodes scalar and short-array integer
//!   values behind a one-byte [`envelope::Envelope`] descriptor, with the
//!   data-kind tag verified on every decode.
//! * _Transfer_ ([`transfer`]) carries name/info strings across multiple
//!   frames, with a zero-byte terminator, a bounded requester buffer, and a
//!   deadline on the requesting side.
//! * The CAN driver is consumed through the [`bus::Bus`] trait from
//!   `emnode-driver`; the stack never touches hardware directly.
//!
//! ## Concurrency model
//!
//! The stack is single-threaded and cooperative. One control loop calls
//! `poll_once` repeatedly; handlers run to completion on that thread before
//! the next frame is processed. Received frames are staged in a single-slot
//! latest-wins mailbox that every poll overwrites, so a handler must extract
//! what it needs before returning. Only the driver's transmit/receive may
//! block, and only up to an explicit timeout. The registry is not re-entrant
//! and not thread-safe by design.
//!
//! ## Example
//!
//! ```no_run
//! use emnode::bus::{Bus, BusError};
//! use emnode::codec;
//! use emnode::core::{category, NodeAddress};
//! use emnode::frame::{FilterSlot, Frame};
//! use emnode::node::{Endpoint, FilterTarget, Handler, Registry};
//! use emnode::time::Duration;
//! #
//! # struct NullBus;
//! # impl Bus for NullBus {
//! #     fn transmit(&mut self, _: &Frame, _: Duration) -> Result<(), BusError> { Ok(()) }
//! #     fn receive(&mut self, _: Duration) -> Result<Frame, BusError> { Err(BusError::NoData) }
//! #     fn is_frame_pending(&mut self) -> bool { false }
//! #     fn add_filter_id(&mut self, _: NodeAddress) -> Result<FilterSlot, BusError> { Ok(FilterSlot::new(0)) }
//! #     fn add_filter_mask(&mut self, _: NodeAddress, _: u16) -> Result<FilterSlot, BusError> { Ok(FilterSlot::new(0)) }
//! #     fn init(&mut self) -> Result<(), BusError> { Ok(()) }
//! #     fn enable(&mut self) -> Result<(), BusError> { Ok(()) }
//! #     fn sleep(&mut self) -> Result<(), BusError> { Ok(()) }
//! #     fn set_bitrate(&mut self, _: emnode::core::Bitrate) -> Result<(), BusError> { Ok(()) }
//! # }
//! /// Answers "give me your current value" with the latest pressure reading.
//! struct PitotRequest;
//!
//! impl Handler for PitotRequest {
//!     fn handle(&mut self, mut endpoint: Endpoint<'_>, _frame: &Frame) {
//!         endpoint.send(1013u16).ok();
//!     }
//! }
//!
//! struct ThrottleWatch;
//!
//! impl Handler for ThrottleWatch {
//!     fn handle(&mut self, _endpoint: Endpoint<'_>, frame: &Frame) {
//!         if let Ok(position) = codec::decode::<u16>(frame) {
//!             // act on the new throttle position
//!             let _ = position;
//!         }
//!     }
//! }
//!
//! let mut bus = NullBus;
//! let mut on_request = PitotRequest;
//! let mut on_throttle = ThrottleWatch;
//!
//! let mut registry: Registry<4, 4> = Registry::new();
//! let pitot = registry.register(category::PRESSURE, Some(&mut on_request)).unwrap();
//! registry.set_name(pitot, "pitot").unwrap();
//! registry
//!     .add_filter(&mut bus, pitot, FilterTarget::Id(category::SWITCH), &mut on_throttle)
//!     .unwrap();
//!
//! loop {
//!     registry.poll_once(&mut bus);
//! }
//! ```
#![no_std]

pub use emnode_core as core;
pub use emnode_driver::{bus, frame, time};

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod codec;
pub mod envelope;
pub mod node;
pub mod transfer;
