//! Diagnostic log output on a dedicated TX-only UART.
//!
//! UART0 carries the race protocol, so diagnostics go out on UART1.
//! Requires an external USB-UART adapter (CH340, CP2102, etc).
//!
//! # Hardware Setup
//!
//! ```text
//! ESP32 GPIO17 (UART1 TX) ──────▶ USB-UART RX
//!                                  └─▶ PC Serial Monitor
//! ```

use crate::logging::{LogEntry, LogStream};

#[cfg(target_os = "espidf")]
use esp_idf_svc::hal::gpio;
#[cfg(target_os = "espidf")]
use esp_idf_svc::hal::peripheral::Peripheral;
#[cfg(target_os = "espidf")]
use esp_idf_svc::hal::uart::{self, UartTxDriver};

/// Formatted line buffer size.
pub const LINE_BUF_LEN: usize = 160;

/// Format log entry to bytes.
///
/// Format: `[timestamp_us] LEVEL: message\n`
pub fn format_log_entry(entry: &LogEntry, buf: &mut [u8]) -> usize {
    use core::fmt::Write;

    struct BufWriter<'a> {
        buf: &'a mut [u8],
        pos: usize,
    }

    impl<'a> Write for BufWriter<'a> {
        fn write_str(&mut self, s: &str) -> core::fmt::Result {
            let bytes = s.as_bytes();
            let remaining = self.buf.len() - self.pos;
            let to_write = bytes.len().min(remaining);
            self.buf[self.pos..self.pos + to_write].copy_from_slice(&bytes[..to_write]);
            self.pos += to_write;
            Ok(())
        }
    }

    let mut writer = BufWriter { buf, pos: 0 };

    let _ = write!(
        writer,
        "[{:10}] {}: {}\n",
        entry.timestamp_us,
        entry.level.as_str(),
        entry.msg.as_str()
    );

    writer.pos
}

/// Drain every pending entry into `sink`, then report drops once.
///
/// `sink` receives complete formatted lines.
pub fn drain_log<const N: usize>(log: &mut LogStream<N>, mut sink: impl FnMut(&[u8])) -> usize {
    let mut buf = [0u8; LINE_BUF_LEN];
    let mut lines = 0;

    while let Some(entry) = log.drain() {
        let len = format_log_entry(&entry, &mut buf);
        sink(&buf[..len]);
        lines += 1;
    }

    let dropped = log.dropped();
    if dropped > 0 {
        use core::fmt::Write;
        let mut msg: heapless::String<48> = heapless::String::new();
        let _ = write!(msg, "[WARN] Dropped: {}\n", dropped);
        sink(msg.as_bytes());
        log.reset_dropped();
        lines += 1;
    }

    lines
}

/// Initialize a TX-only UART for logging output.
#[cfg(target_os = "espidf")]
pub fn init_uart_logger<'d>(
    uart: impl Peripheral<P = uart::UART1> + 'd,
    tx_pin: impl Peripheral<P = impl gpio::OutputPin> + 'd,
    baud_rate: u32,
) -> Result<UartTxDriver<'d>, esp_idf_svc::sys::EspError> {
    let uart_config = uart::config::Config::default()
        .baudrate(esp_idf_svc::hal::units::Hertz(baud_rate));

    UartTxDriver::new(
        uart,
        tx_pin,
        Option::<gpio::AnyIOPin>::None, // CTS
        Option::<gpio::AnyIOPin>::None, // RTS
        &uart_config,
    )
}

/// Write all pending log entries to the log UART.
#[cfg(target_os = "espidf")]
pub fn write_log_to_uart<const N: usize>(uart: &mut UartTxDriver<'_>, log: &mut LogStream<N>) {
    drain_log(log, |line| {
        let _ = uart.write(line);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LogLevel, MAX_MSG_LEN};

    fn entry(timestamp_us: u32, level: LogLevel, text: &str) -> LogEntry {
        let mut msg = heapless::String::<MAX_MSG_LEN>::new();
        msg.push_str(text).unwrap();
        LogEntry { timestamp_us, level, msg }
    }

    #[test]
    fn test_format_log_entry() {
        let mut buf = [0u8; LINE_BUF_LEN];
        let len = format_log_entry(&entry(1234567, LogLevel::Info, "Hello world"), &mut buf);

        let formatted = core::str::from_utf8(&buf[..len]).unwrap();
        assert_eq!(formatted, "[   1234567] INFO: Hello world\n");
    }

    #[test]
    fn test_format_into_short_buffer() {
        let mut buf = [0u8; 8];
        let len = format_log_entry(&entry(1, LogLevel::Error, "overflow"), &mut buf);
        assert_eq!(len, 8);
    }

    #[test]
    fn test_drain_reports_drops() {
        let mut log = LogStream::<1>::new();
        log.push(5, LogLevel::Warn, format_args!("first"));
        log.push(6, LogLevel::Warn, format_args!("second"));

        let mut out = std::vec::Vec::new();
        let lines = drain_log(&mut log, |line| out.extend_from_slice(line));

        assert_eq!(lines, 2);
        let text = std::string::String::from_utf8(out).unwrap();
        assert!(text.contains("WARN: first"));
        assert!(text.contains("Dropped: 1"));
        assert_eq!(log.dropped(), 0);
    }
}
