//! A session with one GF2 function generator

use tracing::{info, warn};
use transport::{FreqRegister, PhaseRegister, Waveform};

use crate::bridge::{Bridge, Channel, Connector, SiliconVersion, UsbConfig};
use crate::bsp::{spi_mode, PID, VID};
use crate::bus::{Bus, Delay};
use crate::codec::{self, Quantity};
use crate::error::{ConnectError, Error, ErrorLog};
use crate::frame;
use crate::lines::{self, ControlLine, LineState};

/// Frequency register 0, as a write target or active selection
pub const FSEL0: FreqRegister = FreqRegister::Freq0;
/// Frequency register 1, as a write target or active selection
pub const FSEL1: FreqRegister = FreqRegister::Freq1;
/// Phase register 0, as a write target or active selection
pub const PSEL0: PhaseRegister = PhaseRegister::Phase0;
/// Phase register 1, as a write target or active selection
pub const PSEL1: PhaseRegister = PhaseRegister::Phase1;

/// Serial numbers of every attached GF2
pub fn list_devices<C: Connector>(
    connector: &C,
) -> Result<Vec<String>, Error<<C::Bridge as Bridge>::Error>> {
    connector.list_devices(VID, PID).map_err(Error::Bridge)
}

/// Owns the bridge connection to one device
///
/// A session starts closed and only talks to hardware after [`open`] has
/// succeeded. While closed, every device operation fails with
/// [`Error::NotOpen`] without touching anything.
///
/// Bridge failures inside an operation do not cut it short. Each one is
/// appended to [`errors`], and the operation returns the first of them once
/// all its steps have run.
///
/// [`open`]: Gf2Device::open
/// [`errors`]: Gf2Device::errors
#[derive(Debug)]
pub struct Gf2Device<B: Bridge, D> {
    bridge: Option<B>,
    delay: D,
    errors: ErrorLog,
    waveform: Option<Waveform>,
}

impl<B, D> Gf2Device<B, D>
where
    B: Bridge,
    D: Delay,
{
    pub fn new(delay: D) -> Self {
        Self {
            bridge: None,
            delay,
            errors: ErrorLog::new(),
            waveform: None,
        }
    }

    /// Attach to the GF2 with the given serial number, or the first one found
    ///
    /// An already open connection is closed first.
    pub fn open<C>(&mut self, connector: &C, serial: Option<&str>) -> Result<(), ConnectError>
    where
        C: Connector<Bridge = B>,
    {
        self.close();
        match connector.open(VID, PID, serial) {
            Ok(bridge) => {
                info!("Opened GF2 {}", serial.unwrap_or("(first found)"));
                self.bridge = Some(bridge);
                Ok(())
            }
            Err(e) => {
                warn!("Failed to open GF2: {e}");
                Err(e)
            }
        }
    }

    pub fn is_open(&self) -> bool {
        self.bridge.is_some()
    }

    /// Whether an open connection has lost its device
    pub fn disconnected(&self) -> bool {
        self.bridge.as_ref().is_some_and(B::disconnected)
    }

    /// Release the bridge. Does nothing if already closed
    pub fn close(&mut self) {
        if let Some(mut bridge) = self.bridge.take() {
            bridge.close();
            self.waveform = None;
            info!("Closed GF2");
        }
    }

    /// Every bridge failure recorded since the last [`take_errors`](Self::take_errors)
    pub fn errors(&self) -> &ErrorLog {
        &self.errors
    }

    pub fn take_errors(&mut self) -> ErrorLog {
        std::mem::take(&mut self.errors)
    }

    pub(crate) fn bus(&mut self) -> Result<Bus<'_, B, D>, Error<B::Error>> {
        let bridge = self.bridge.as_mut().ok_or(Error::NotOpen)?;
        Ok(Bus::new(bridge, &mut self.delay, &mut self.errors))
    }

    fn with_bus<T>(
        &mut self,
        f: impl FnOnce(&mut Bus<'_, B, D>) -> T,
    ) -> Result<T, Error<B::Error>> {
        let mut bus = self.bus()?;
        let out = f(&mut bus);
        bus.finish()?;
        Ok(out)
    }

    /// Configure the AD9834 SPI channel. Required once before any waveform
    /// generator transfer
    pub fn setup_channel0(&mut self) -> Result<(), Error<B::Error>> {
        self.setup_channel(Channel::WaveGen)
    }

    /// Configure the AD5310 SPI channel. Required once before any amplitude
    /// transfer
    pub fn setup_channel1(&mut self) -> Result<(), Error<B::Error>> {
        self.setup_channel(Channel::Dac)
    }

    fn setup_channel(&mut self, channel: Channel) -> Result<(), Error<B::Error>> {
        let mode = spi_mode(channel);
        self.with_bus(|bus| {
            bus.run("configure SPI mode", |b| b.configure_spi_mode(channel, &mode));
            bus.run("disable SPI delays", |b| b.disable_spi_delays(channel));
        })
    }

    /// Reset the bridge, and with it the whole device. The connection is
    /// unusable afterwards and should be closed
    pub fn reset(&mut self) -> Result<(), Error<B::Error>> {
        info!("Resetting GF2");
        self.waveform = None;
        self.with_bus(|bus| {
            bus.run("reset device", |b| b.reset());
        })
    }

    /// Zero all frequency, phase and amplitude registers, select sine output
    /// and register 0 for both frequency and phase, then enable every stage
    pub fn clear(&mut self) -> Result<(), Error<B::Error>> {
        self.with_bus(lines::clear)?;
        self.waveform = Some(Waveform::Sine);
        Ok(())
    }

    pub fn start(&mut self) -> Result<(), Error<B::Error>> {
        self.with_bus(lines::start)
    }

    pub fn stop(&mut self) -> Result<(), Error<B::Error>> {
        self.with_bus(lines::stop)
    }

    /// Set the output amplitude in volts peak-to-peak
    pub fn set_amplitude(&mut self, amplitude: f64) -> Result<(), Error<B::Error>> {
        let code = codec::encode(Quantity::Amplitude, amplitude)?;
        let data = frame::amplitude(code as u16);
        self.with_bus(|bus| bus.write_register(Channel::Dac, &data))
    }

    /// Load `reg` with a frequency in kHz. The active register is unchanged
    pub fn set_frequency(
        &mut self,
        reg: FreqRegister,
        frequency: f64,
    ) -> Result<(), Error<B::Error>> {
        let code = codec::encode(Quantity::Frequency, frequency)?;
        let data = frame::frequency(reg, code);
        self.with_bus(|bus| bus.write_register(Channel::WaveGen, &data))
    }

    /// Load `reg` with a phase in degrees. The active register is unchanged
    pub fn set_phase(&mut self, reg: PhaseRegister, phase: f64) -> Result<(), Error<B::Error>> {
        let code = codec::encode(Quantity::Phase, phase)?;
        let data = frame::phase(reg, code as u16);
        self.with_bus(|bus| bus.write_register(Channel::WaveGen, &data))
    }

    pub fn set_waveform(&mut self, waveform: Waveform) -> Result<(), Error<B::Error>> {
        let data = frame::control_word(waveform);
        let written = self.with_bus(|bus| bus.write_register(Channel::WaveGen, &data));
        // A partial transfer leaves the shape unknown
        self.waveform = written.is_ok().then_some(waveform);
        written
    }

    pub fn set_sine_wave(&mut self) -> Result<(), Error<B::Error>> {
        self.set_waveform(Waveform::Sine)
    }

    pub fn set_triangle_wave(&mut self) -> Result<(), Error<B::Error>> {
        self.set_waveform(Waveform::Triangle)
    }

    /// Last shape written by this session. The AD9834 can't be read back
    pub fn waveform(&self) -> Option<Waveform> {
        self.waveform
    }

    /// Make `reg` the frequency register that drives the output
    pub fn select_frequency(&mut self, reg: FreqRegister) -> Result<(), Error<B::Error>> {
        self.set_line(ControlLine::FreqSelect, LineState::from(reg))
    }

    pub fn frequency_selection(&mut self) -> Result<FreqRegister, Error<B::Error>> {
        self.line(ControlLine::FreqSelect).map(lines::freq_register)
    }

    /// Make `reg` the phase register that drives the output
    pub fn select_phase(&mut self, reg: PhaseRegister) -> Result<(), Error<B::Error>> {
        self.set_line(ControlLine::PhaseSelect, LineState::from(reg))
    }

    pub fn phase_selection(&mut self) -> Result<PhaseRegister, Error<B::Error>> {
        self.line(ControlLine::PhaseSelect).map(lines::phase_register)
    }

    /// Take the waveform generator out of reset, or hold it there
    pub fn set_wave_gen_enabled(&mut self, enabled: bool) -> Result<(), Error<B::Error>> {
        self.set_line(ControlLine::WaveGenReset, LineState::from(enabled))
    }

    pub fn is_wave_gen_enabled(&mut self) -> Result<bool, Error<B::Error>> {
        self.line(ControlLine::WaveGenReset).map(LineState::is_asserted)
    }

    /// Wake the amplitude DAC, or put it to sleep
    pub fn set_dac_enabled(&mut self, enabled: bool) -> Result<(), Error<B::Error>> {
        self.set_line(ControlLine::DacSleep, LineState::from(enabled))
    }

    pub fn is_dac_enabled(&mut self) -> Result<bool, Error<B::Error>> {
        self.line(ControlLine::DacSleep).map(LineState::is_asserted)
    }

    /// Run or shut down the clock comparator
    pub fn set_clock_enabled(&mut self, enabled: bool) -> Result<(), Error<B::Error>> {
        self.set_line(ControlLine::ComparatorShutdown, LineState::from(enabled))
    }

    pub fn is_clock_enabled(&mut self) -> Result<bool, Error<B::Error>> {
        self.line(ControlLine::ComparatorShutdown).map(LineState::is_asserted)
    }

    fn set_line(&mut self, line: ControlLine, state: LineState) -> Result<(), Error<B::Error>> {
        self.with_bus(|bus| bus.drive(line, state))
    }

    fn line(&mut self, line: ControlLine) -> Result<LineState, Error<B::Error>> {
        // A failed read has already been turned into an error by `finish`
        self.with_bus(|bus| bus.read(line))
            .map(|state| state.unwrap_or(LineState::Deasserted))
    }

    pub fn manufacturer_desc(&mut self) -> Result<String, Error<B::Error>> {
        self.descriptor("read manufacturer descriptor", B::manufacturer_desc)
    }

    pub fn product_desc(&mut self) -> Result<String, Error<B::Error>> {
        self.descriptor("read product descriptor", B::product_desc)
    }

    pub fn serial_desc(&mut self) -> Result<String, Error<B::Error>> {
        self.descriptor("read serial descriptor", B::serial_desc)
    }

    /// Bridge USB configuration, including the release numbers that encode
    /// the board revision
    pub fn usb_config(&mut self) -> Result<UsbConfig, Error<B::Error>> {
        self.descriptor("read USB configuration", B::usb_config)
    }

    /// Silicon revision of the CP2130 bridge
    pub fn silicon_version(&mut self) -> Result<SiliconVersion, Error<B::Error>> {
        self.descriptor("read silicon version", B::silicon_version)
    }

    fn descriptor<T: Default>(
        &mut self,
        what: &str,
        read: fn(&mut B) -> Result<T, B::Error>,
    ) -> Result<T, Error<B::Error>> {
        self.with_bus(|bus| bus.run(what, read))
            .map(Option::unwrap_or_default)
    }

    /// Amplitude the DAC will actually produce for a request, in Vpp
    pub fn expected_amplitude(amplitude: f64) -> f64 {
        codec::expected(Quantity::Amplitude, amplitude)
    }

    /// Frequency the generator will actually produce for a request, in kHz
    pub fn expected_frequency(frequency: f64) -> f64 {
        codec::expected(Quantity::Frequency, frequency)
    }

    /// Phase the generator will actually apply for a request, in [0, 360) degrees
    pub fn expected_phase(phase: f64) -> f64 {
        codec::expected(Quantity::Phase, phase)
    }
}

impl<B: Bridge, D> Drop for Gf2Device<B, D> {
    fn drop(&mut self) {
        if let Some(mut bridge) = self.bridge.take() {
            bridge.close();
        }
    }
}
