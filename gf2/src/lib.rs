//! Driver for the GF2 function generator
//!
//! The GF2 pairs an AD9834 DDS (frequency, phase, waveform) on SPI channel 0
//! with an AD5310 DAC (amplitude) on channel 1, both behind a CP2130
//! USB-to-SPI bridge whose GPIOs drive the parts' control pins.
//!
//! The USB side is abstracted as [`Bridge`] and [`Connector`]; this crate
//! turns physical requests into register codes, frames and pin sequences.
//!
//! ```
//! use gf2::mock::{MockBridge, MockConnector};
//! use gf2::{Gf2Device, FSEL0};
//!
//! let bridge = MockBridge::new();
//! let connector = MockConnector::new().with_device(bridge.clone());
//! let mut gf2 = Gf2Device::new(bridge.delay());
//! gf2.open(&connector, None).unwrap();
//! gf2.setup_channel0().unwrap();
//! gf2.setup_channel1().unwrap();
//! gf2.clear().unwrap();
//! gf2.set_frequency(FSEL0, 1000.0).unwrap();
//! gf2.set_amplitude(4.0).unwrap();
//! gf2.start().unwrap();
//! assert!(gf2.errors().is_empty());
//! ```

pub mod bridge;
pub mod bsp;
mod bus;
pub mod codec;
mod command;
mod device;
mod error;
pub mod frame;
pub mod lines;
pub mod mock;

pub use bridge::{
    Bridge, Channel, Connector, Pin, PinState, SiliconVersion, SpiMode, UsbConfig,
};
pub use bus::{Delay, StdDelay};
pub use device::{list_devices, Gf2Device, FSEL0, FSEL1, PSEL0, PSEL1};
pub use error::{ConnectError, Error, ErrorLog, OutOfRange, SUCCESS};
pub use transport::{Action, Command, FreqRegister, PhaseRegister, Response, StatusPayload, Waveform};
