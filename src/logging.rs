//! RT-safe diagnostic logging for DerbyTimer.
//!
//! # Architecture
//!
//! ```text
//! Tick loop              LogStream             Log UART
//! ─────────              ─────────             ────────
//!
//! timer_info!() ──────▶ [L0][L1][L2] ──────▶ UART1 TX
//! fixed buffer           bounded ring          drained between
//! non-blocking           drops when full       ticks, never racing
//! ```
//!
//! Logging never touches the protocol UART and never blocks the tick.
//! Messages may be dropped if the ring is full; drops are counted.

use core::fmt::{self, Write};

use heapless::{Deque, String};

use crate::clock::Tick;

/// Maximum message length (longer messages are truncated).
pub const MAX_MSG_LEN: usize = 96;

/// Default ring capacity (number of entries).
pub const LOG_CAPACITY: usize = 32;

/// Log level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl LogLevel {
    /// Convert to string for output.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }
}

/// A single log entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    /// Clock tick when the entry was pushed.
    pub timestamp_us: Tick,
    pub level: LogLevel,
    pub msg: String<MAX_MSG_LEN>,
}

/// Writer that keeps as much of the message as fits.
struct Truncating<'a>(&'a mut String<MAX_MSG_LEN>);

impl Write for Truncating<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            if self.0.push(c).is_err() {
                break;
            }
        }
        Ok(())
    }
}

/// Bounded log ring owned by the tick loop.
pub struct LogStream<const N: usize = LOG_CAPACITY> {
    entries: Deque<LogEntry, N>,
    /// Entries above this level are discarded without counting.
    max_level: LogLevel,
    dropped: u32,
}

impl<const N: usize> LogStream<N> {
    /// Create an empty stream accepting `Info` and more severe.
    pub const fn new() -> Self {
        Self {
            entries: Deque::new(),
            max_level: LogLevel::Info,
            dropped: 0,
        }
    }

    /// Set the most verbose level kept.
    pub fn set_max_level(&mut self, level: LogLevel) {
        self.max_level = level;
    }

    #[inline]
    pub fn enabled(&self, level: LogLevel) -> bool {
        level <= self.max_level
    }

    /// Push a formatted entry (never blocks).
    ///
    /// Returns `true` if queued, `false` if filtered or dropped (ring full).
    pub fn push(&mut self, timestamp_us: Tick, level: LogLevel, args: fmt::Arguments<'_>) -> bool {
        if !self.enabled(level) {
            return false;
        }
        if self.entries.is_full() {
            self.dropped = self.dropped.saturating_add(1);
            return false;
        }

        let mut msg = String::new();
        let _ = Truncating(&mut msg).write_fmt(args);
        self.entries
            .push_back(LogEntry {
                timestamp_us,
                level,
                msg,
            })
            .is_ok()
    }

    /// Take the oldest entry.
    #[inline]
    pub fn drain(&mut self) -> Option<LogEntry> {
        self.entries.pop_front()
    }

    /// Get count of dropped messages.
    #[inline]
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Reset dropped counter (e.g., after reporting).
    #[inline]
    pub fn reset_dropped(&mut self) {
        self.dropped = 0;
    }

    #[inline]
    pub fn has_entries(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Get number of entries waiting to be drained.
    #[inline]
    pub fn pending(&self) -> usize {
        self.entries.len()
    }
}

impl<const N: usize> Default for LogStream<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Log macro for the tick loop.
///
/// # Example
///
/// ```ignore
/// timer_log!(LogLevel::Info, self.log, now, "lane {} finished", n);
/// ```
#[macro_export]
macro_rules! timer_log {
    ($level:expr, $stream:expr, $timestamp:expr, $($arg:tt)*) => {{
        $stream.push($timestamp, $level, format_args!($($arg)*));
    }};
}

/// Info log.
#[macro_export]
macro_rules! timer_info {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::timer_log!($crate::logging::LogLevel::Info, $stream, $timestamp, $($arg)*)
    };
}

/// Warning log.
#[macro_export]
macro_rules! timer_warn {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::timer_log!($crate::logging::LogLevel::Warn, $stream, $timestamp, $($arg)*)
    };
}

/// Error log.
#[macro_export]
macro_rules! timer_error {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::timer_log!($crate::logging::LogLevel::Error, $stream, $timestamp, $($arg)*)
    };
}

/// Debug log.
#[macro_export]
macro_rules! timer_debug {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::timer_log!($crate::logging::LogLevel::Debug, $stream, $timestamp, $($arg)*)
    };
}
