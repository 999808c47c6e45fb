//! # DerbyTimer
//!
//! Multi-lane gravity race timer with a single-byte serial protocol.
//!
//! ## Architecture
//!
//! One cooperative control loop ([`RaceTimer::tick`]) owns all state:
//! - Start gate and buttons feed debounced edges
//! - The race FSM polls lane sensors while a heat runs
//! - Results and protocol lines go out on the serial link
//! - The display shows one of four screens between races
//!
//! Timing logic is pure and hardware-free; hardware sits behind the
//! capability traits in [`hal`].

#![cfg_attr(not(test), no_std)]

pub mod clock;
pub mod command;
pub mod config;
pub mod hal;
pub mod lane;
pub mod logging;
pub mod poller;
pub mod race;
pub mod results;
pub mod screen;
pub mod timer;
pub mod uart_logger;

pub use clock::{Clock, Tick};
pub use command::{dispatch, Reply, Response};
pub use config::{ConfigError, TimerConfig};
pub use lane::{DetectionReport, Lane, LaneRegistry, LaneStatus, MAX_LANES};
pub use logging::{LogLevel, LogStream};
pub use poller::{poll_lanes, FinishPolicy, PollOutcome};
pub use race::{RaceContext, RaceStatus, Transition, TriggerState};
pub use screen::ScreenMode;
pub use timer::{Board, RaceTimer};
