//! Dispatch of [`transport`] commands onto a session

use tracing::debug;
use transport::{Action, Command, Response, StatusPayload};

use crate::bridge::Bridge;
use crate::bus::Delay;
use crate::device::Gf2Device;
use crate::error::Error;

impl<B, D> Gf2Device<B, D>
where
    B: Bridge,
    D: Delay,
{
    /// Snapshot of every control line
    pub fn status(&mut self) -> Result<StatusPayload, Error<B::Error>> {
        Ok(StatusPayload {
            wave_gen_enabled: self.is_wave_gen_enabled()?,
            dac_enabled: self.is_dac_enabled()?,
            clock_enabled: self.is_clock_enabled()?,
            frequency: self.frequency_selection()?,
            phase: self.phase_selection()?,
        })
    }

    /// Run one command and report back
    pub fn execute(&mut self, cmd: &Command) -> Result<Response, Error<B::Error>> {
        debug!("Executing {cmd:?}");
        match *cmd {
            Command::Status => return self.status().map(Response::Status),
            Command::Clear => self.clear()?,
            Command::Start => self.start()?,
            Command::Stop => self.stop()?,
            Command::Control(action) => match action {
                Action::SetAmplitude(v) => self.set_amplitude(v)?,
                Action::SetFrequency(reg, v) => self.set_frequency(reg, v)?,
                Action::SelectFrequency(reg) => self.select_frequency(reg)?,
                Action::SetPhase(reg, v) => self.set_phase(reg, v)?,
                Action::SelectPhase(reg) => self.select_phase(reg)?,
                Action::SetWaveform(w) => self.set_waveform(w)?,
                Action::WaveGenPower(en) => self.set_wave_gen_enabled(en)?,
                Action::DacPower(en) => self.set_dac_enabled(en)?,
                Action::ClockPower(en) => self.set_clock_enabled(en)?,
            },
        }
        Ok(Response::Ack)
    }
}
