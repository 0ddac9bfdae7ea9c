//! Capabilities the driver needs from the CP2130 USB-to-SPI bridge
//!
//! USB enumeration, transfers and descriptor access live behind these traits.
//! The driver only sequences calls into them.

use core::fmt::{Debug, Display};

pub use embedded_hal::digital::v2::PinState;

use crate::error::ConnectError;

/// SPI channels wired on the GF2, each with its own chip select
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// AD9834 waveform generator
    WaveGen,
    /// AD5310 amplitude DAC
    Dac,
}

impl Channel {
    /// Channel number as the bridge counts them
    pub const fn index(self) -> u8 {
        match self {
            Channel::WaveGen => 0,
            Channel::Dac => 1,
        }
    }
}

/// General purpose pins of the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pin {
    Gpio0,
    Gpio1,
    Gpio2,
    Gpio3,
    Gpio4,
    Gpio5,
    Gpio6,
    Gpio7,
    Gpio8,
    Gpio9,
    Gpio10,
}

impl Pin {
    pub const COUNT: usize = 11;

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// SPI clock frequencies the bridge can generate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockRate {
    Mhz12,
    Mhz6,
    Mhz3,
    Khz1500,
    Khz750,
    Khz375,
    Khz187_5,
    Khz93_75,
}

impl ClockRate {
    pub const fn hz(self) -> u32 {
        match self {
            ClockRate::Mhz12 => 12_000_000,
            ClockRate::Mhz6 => 6_000_000,
            ClockRate::Mhz3 => 3_000_000,
            ClockRate::Khz1500 => 1_500_000,
            ClockRate::Khz750 => 750_000,
            ClockRate::Khz375 => 375_000,
            ClockRate::Khz187_5 => 187_500,
            ClockRate::Khz93_75 => 93_750,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockPolarity {
    IdleLow,
    IdleHigh,
}

/// Clock edge on which data is sampled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockPhase {
    LeadingEdge,
    TrailingEdge,
}

/// Chip select output driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsMode {
    OpenDrain,
    PushPull,
}

/// Electrical configuration of one SPI channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpiMode {
    pub clock: ClockRate,
    pub polarity: ClockPolarity,
    pub phase: ClockPhase,
    pub cs_mode: CsMode,
}

/// USB configuration block stored in the bridge's one-time programmable ROM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UsbConfig {
    pub vid: u16,
    pub pid: u16,
    /// Device release number, major part. The board revision is encoded here
    pub major_release: u8,
    pub minor_release: u8,
    /// Requested bus current, in units of 2 mA
    pub max_power: u8,
    pub power_mode: u8,
    pub transfer_priority: u8,
}

/// Silicon revision reported by the bridge chip itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SiliconVersion {
    pub major: u8,
    pub minor: u8,
}

/// An open connection to one bridge
///
/// Every fallible call reports its own failure; deciding whether to carry on
/// is left to the caller.
pub trait Bridge {
    type Error: Debug + Display;

    /// Bulk write `data` to the OUT endpoint at `endpoint`
    fn spi_write(&mut self, data: &[u8], endpoint: u8) -> Result<(), Self::Error>;
    /// Assert the chip select of `channel`, releasing every other one
    fn select_cs(&mut self, channel: Channel) -> Result<(), Self::Error>;
    /// Release the chip select of `channel`
    fn disable_cs(&mut self, channel: Channel) -> Result<(), Self::Error>;
    fn gpio(&mut self, pin: Pin) -> Result<PinState, Self::Error>;
    fn set_gpio(&mut self, pin: Pin, level: PinState) -> Result<(), Self::Error>;
    fn configure_spi_mode(&mut self, channel: Channel, mode: &SpiMode) -> Result<(), Self::Error>;
    /// Turn off inter-byte, pre-assert and post-assert delays on `channel`
    fn disable_spi_delays(&mut self, channel: Channel) -> Result<(), Self::Error>;
    /// Reset the bridge, which takes the whole device with it
    fn reset(&mut self) -> Result<(), Self::Error>;
    fn disconnected(&self) -> bool;
    /// Release the handle. Must be safe to call more than once
    fn close(&mut self);
    fn manufacturer_desc(&mut self) -> Result<String, Self::Error>;
    fn product_desc(&mut self) -> Result<String, Self::Error>;
    fn serial_desc(&mut self) -> Result<String, Self::Error>;
    fn usb_config(&mut self) -> Result<UsbConfig, Self::Error>;
    fn silicon_version(&mut self) -> Result<SiliconVersion, Self::Error>;
}

/// Finds and opens bridges
pub trait Connector {
    type Bridge: Bridge;

    /// Serial numbers of every attached bridge matching `vid`/`pid`
    fn list_devices(
        &self,
        vid: u16,
        pid: u16,
    ) -> Result<Vec<String>, <Self::Bridge as Bridge>::Error>;

    /// Open the bridge with the given serial number, or the first match if `None`
    fn open(&self, vid: u16, pid: u16, serial: Option<&str>) -> Result<Self::Bridge, ConnectError>;
}
