//! Board support for the GF2: USB identity, control line wiring, SPI setup
//! and the timing the parts need

use crate::bridge::{Channel, ClockPhase, ClockPolarity, ClockRate, CsMode, Pin, SpiMode};
use crate::lines::{ControlLine, Polarity};

/// USB vendor ID
pub const VID: u16 = 0x10c4;
/// USB product ID
pub const PID: u16 = 0x8bf1;

/// Address of the bulk OUT endpoint used for SPI writes
pub const EPOUT: u8 = 0x01;

/// AD9834 master clock in kHz
pub const MCLK: f64 = 80_000.0;

pub const FREQUENCY_MIN: f64 = 0.0;
pub const FREQUENCY_MAX: f64 = 40_000.0;
pub const AMPLITUDE_MIN: f64 = 0.0;
pub const AMPLITUDE_MAX: f64 = 8.0;

/// Pause after every SPI transfer before the chip select is released, and
/// between dependent steps of a reset sequence
pub const SETTLE_US: u32 = 100;
/// Time the comparator output needs to settle after a shutdown
pub const COMPARATOR_SETTLE_MS: u32 = 10;

// AD9834: SCLK idles high, data sampled on the falling edge
pub const WAVEGEN_SPI: SpiMode = SpiMode {
    clock: ClockRate::Mhz12,
    polarity: ClockPolarity::IdleHigh,
    phase: ClockPhase::LeadingEdge,
    cs_mode: CsMode::PushPull,
};

// AD5310: SCLK idles low, data sampled on the falling edge
pub const DAC_SPI: SpiMode = SpiMode {
    clock: ClockRate::Mhz12,
    polarity: ClockPolarity::IdleLow,
    phase: ClockPhase::TrailingEdge,
    cs_mode: CsMode::PushPull,
};

pub const fn spi_mode(channel: Channel) -> SpiMode {
    match channel {
        Channel::WaveGen => WAVEGEN_SPI,
        Channel::Dac => DAC_SPI,
    }
}

/// Which bridge pin drives each control line, and how the pin level relates
/// to the line's logical state. GPIO0 and GPIO1 are the chip selects.
pub const fn line_pin(line: ControlLine) -> (Pin, Polarity) {
    match line {
        // RESET high holds the AD9834 in reset
        ControlLine::WaveGenReset => (Pin::Gpio2, Polarity::Inverted),
        ControlLine::DacSleep => (Pin::Gpio3, Polarity::Inverted),
        ControlLine::FreqSelect => (Pin::Gpio4, Polarity::Direct),
        ControlLine::PhaseSelect => (Pin::Gpio5, Polarity::Direct),
        // SHDN high stops the clock comparator
        ControlLine::ComparatorShutdown => (Pin::Gpio6, Polarity::Inverted),
    }
}
