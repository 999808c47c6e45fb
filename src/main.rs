//! DerbyTimer - Main entry point
//!
//! On ESP-IDF this brings up the hardware and runs the tick loop forever.
//! On any other target it runs one scripted heat against the simulation
//! doubles and prints what the race software and log UART would see.

#[cfg(target_os = "espidf")]
fn main() -> Result<(), esp_idf_svc::sys::EspError> {
    esp_idf_svc::sys::link_patches();
    firmware::run()
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    simulation::run();
}

#[cfg(target_os = "espidf")]
mod firmware {
    use esp_idf_svc::hal::adc::attenuation::DB_11;
    use esp_idf_svc::hal::adc::oneshot::config::AdcChannelConfig;
    use esp_idf_svc::hal::adc::oneshot::{AdcChannelDriver, AdcDriver};
    use esp_idf_svc::hal::delay::FreeRtos;
    use esp_idf_svc::hal::gpio::{AnyIOPin, IOPin, OutputPin};
    use esp_idf_svc::hal::peripherals::Peripherals;
    use esp_idf_svc::hal::uart::{config::Config, UartDriver};
    use esp_idf_svc::hal::units::Hertz;
    use esp_idf_svc::sys::EspError;

    use derby_timer::hal::esp::{EspClock, GpioInput, LedIndicator, MirrorDisplay, UartLink};
    use derby_timer::hal::{Debouncer, SensorFn};
    use derby_timer::uart_logger::{init_uart_logger, write_log_to_uart};
    use derby_timer::{timer_error, timer_info, Board, Clock, RaceStatus, RaceTimer, TimerConfig};

    /// Reading reported for a failed conversion: beam clear, so the lane
    /// falls through to the timeout instead of finishing early.
    const ADC_FAULT_READING: u16 = u16::MAX;

    pub fn run() -> Result<(), EspError> {
        let config = TimerConfig::DEFAULT;
        let peripherals = Peripherals::take()?;
        let clock = EspClock;

        // Diagnostics: UART1 TX on GPIO17
        let mut log_uart = init_uart_logger(peripherals.uart1, peripherals.pins.gpio17, config.log_baud)?;

        let mut timer = RaceTimer::new(config);
        timer_info!(timer.log_mut(), clock.now(), "{}", env!("VERSION_STRING"));

        if let Err(e) = config.validate() {
            timer_error!(timer.log_mut(), clock.now(), "config rejected: {}", e);
            write_log_to_uart(&mut log_uart, timer.log_mut());
            return Ok(());
        }

        // Protocol: UART0 on the USB bridge (GPIO1 TX, GPIO3 RX)
        let protocol = UartDriver::new(
            peripherals.uart0,
            peripherals.pins.gpio1,
            peripherals.pins.gpio3,
            Option::<AnyIOPin>::None,
            Option::<AnyIOPin>::None,
            &Config::new().baudrate(Hertz(config.serial_baud)),
        )?;
        let mut serial = UartLink::new(protocol);

        // Lane sensors on ADC1, wired per TimerConfig::DEFAULT
        let adc = AdcDriver::new(peripherals.adc1)?;
        let adc_config = AdcChannelConfig {
            attenuation: DB_11,
            ..Default::default()
        };
        let mut lane1 = AdcChannelDriver::new(&adc, peripherals.pins.gpio33, &adc_config)?;
        let mut lane2 = AdcChannelDriver::new(&adc, peripherals.pins.gpio32, &adc_config)?;
        let mut lane3 = AdcChannelDriver::new(&adc, peripherals.pins.gpio39, &adc_config)?;
        let mut lane4 = AdcChannelDriver::new(&adc, peripherals.pins.gpio36, &adc_config)?;
        let mut sensors = SensorFn(|channel: u8| {
            let reading = match channel {
                33 => lane1.read_raw(),
                32 => lane2.read_raw(),
                39 => lane3.read_raw(),
                36 => lane4.read_raw(),
                _ => return ADC_FAULT_READING,
            };
            reading.unwrap_or(ADC_FAULT_READING)
        });

        let now = clock.now();
        let mut trigger = Debouncer::new(
            GpioInput::pull_up(peripherals.pins.gpio2.downgrade())?,
            config.trigger_debounce_ms,
            now,
        );
        let mut mode_button = Debouncer::new(
            GpioInput::pull_up(peripherals.pins.gpio15.downgrade())?,
            config.button_debounce_ms,
            now,
        );
        let mut detect_button = Debouncer::new(
            GpioInput::pull_up(peripherals.pins.gpio13.downgrade())?,
            config.button_debounce_ms,
            now,
        );
        let mut indicator = LedIndicator::new(peripherals.pins.gpio4.downgrade_output())?;
        let mut display = MirrorDisplay::new();

        timer.boot(&mut Board {
            clock: &clock,
            sensors: &mut sensors,
            trigger: &mut trigger,
            mode_button: &mut mode_button,
            detect_button: &mut detect_button,
            display: &mut display,
            serial: &mut serial,
            indicator: &mut indicator,
        });

        loop {
            timer.tick(&mut Board {
                clock: &clock,
                sensors: &mut sensors,
                trigger: &mut trigger,
                mode_button: &mut mode_button,
                detect_button: &mut detect_button,
                display: &mut display,
                serial: &mut serial,
                indicator: &mut indicator,
            });

            // Racing: spin without yielding so every lane is polled each pass
            if timer.status() != RaceStatus::RaceInProgress {
                if let Some(screen) = display.take_dirty() {
                    let _ = log_uart.write(b"[screen]\n");
                    let _ = log_uart.write(screen.as_bytes());
                    let _ = log_uart.write(b"\n");
                }
                write_log_to_uart(&mut log_uart, timer.log_mut());
                FreeRtos::delay_ms(1);
            }
        }
    }
}

#[cfg(not(target_os = "espidf"))]
mod simulation {
    use derby_timer::clock::Tick;
    use derby_timer::hal::sim::SimBench;
    use derby_timer::uart_logger::drain_log;
    use derby_timer::{Clock, LogLevel, RaceTimer, TimerConfig};

    /// Simulated loop period.
    const STEP_US: Tick = 200;

    const BEAM_CLEAR: u16 = 4095;
    const BEAM_BLOCKED: u16 = 150;

    /// `(channel, microseconds after release)` for each car that finishes.
    /// Lane 4 never trips and is forced by the timeout.
    const FINISHES: [(u8, Tick); 3] = [(33, 2_431_200), (39, 2_502_800), (32, 2_618_400)];

    pub fn run() {
        let config = TimerConfig::DEFAULT;
        let mut bench = SimBench::new(BEAM_CLEAR);
        let mut timer = RaceTimer::new(config);
        timer.log_mut().set_max_level(LogLevel::Debug);

        timer.boot(&mut bench.board());
        bench.serial.send(b"G");
        run_for(&mut timer, &mut bench, 100_000, &[]);

        // Gate opens, heat runs to completion or timeout
        bench.trigger.set_level(true);
        let release = bench.clock.now() + STEP_US;
        run_for(&mut timer, &mut bench, 11_000_000, &FINISHES.map(|(ch, at)| (ch, release + at)));

        // Gate closed again, race software resets for the next heat
        bench.trigger.set_level(false);
        bench.serial.send(b"FR");
        run_for(&mut timer, &mut bench, 10_000, &[]);

        println!("--- serial ---");
        print!("{}", bench.serial.output());
        println!("--- display ---");
        println!("{}", bench.display.screen());
        println!("--- log ---");
        drain_log(timer.log_mut(), |line| print!("{}", String::from_utf8_lossy(line)));
    }

    /// Tick for `duration` microseconds, blocking beams at scheduled ticks.
    fn run_for(timer: &mut RaceTimer, bench: &mut SimBench, duration: Tick, finishes: &[(u8, Tick)]) {
        let end = bench.clock.now() + duration;
        while bench.clock.now() < end {
            bench.clock.advance(STEP_US);
            let now = bench.clock.now();
            for &(channel, at) in finishes {
                if now >= at {
                    bench.sensors.set(channel, BEAM_BLOCKED);
                }
            }
            timer.tick(&mut bench.board());
        }
        for &(channel, _) in finishes {
            bench.sensors.set(channel, BEAM_CLEAR);
        }
    }
}
