//! Types that describe operations on a GF2 waveform generator, shared between
//! the driver and whatever host tooling scripts it
#![cfg_attr(not(test), no_std)]

use serde::{Deserialize, Serialize};

/// One of the two AD9834 frequency registers
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FreqRegister {
    #[default]
    Freq0,
    Freq1,
}

/// One of the two AD9834 phase registers
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhaseRegister {
    #[default]
    Phase0,
    Phase1,
}

/// Output waveform shape
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Waveform {
    #[default]
    Sine,
    Triangle,
}

/// Single-step actions that can be performed
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Set the output amplitude in volts peak-to-peak (0 to 8)
    SetAmplitude(f64),
    /// Load a frequency register, in kHz (0 to 40000). Does not change the active register
    SetFrequency(FreqRegister, f64),
    /// Make a frequency register the active one
    SelectFrequency(FreqRegister),
    /// Load a phase register, in degrees. Does not change the active register
    SetPhase(PhaseRegister, f64),
    /// Make a phase register the active one
    SelectPhase(PhaseRegister),
    /// Choose between sine and triangle output
    SetWaveform(Waveform),
    /// Control the reset state of the waveform generator
    WaveGenPower(bool),
    /// Control the sleep state of the amplitude DAC
    DacPower(bool),
    /// Control the shutdown state of the clock comparator
    ClockPower(bool),
}

/// Control line state sent in response to a [`Command::Status`] call
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusPayload {
    /// Waveform generator out of reset
    pub wave_gen_enabled: bool,
    /// Amplitude DAC awake
    pub dac_enabled: bool,
    /// Clock comparator running
    pub clock_enabled: bool,
    /// Frequency register driving the output
    pub frequency: FreqRegister,
    /// Phase register driving the output
    pub phase: PhaseRegister,
}

/// Payloads from host tooling to the driver
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Status,
    /// Zero every register, select sine output and re-enable all stages
    Clear,
    /// Pulse the generator reset and let it run
    Start,
    /// Hold the generator in reset
    Stop,
    Control(Action),
}

/// Payloads from the driver back to host tooling
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub enum Response {
    Status(StatusPayload),
    Ack,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_from_json() {
        let script = r#"[
            "Clear",
            {"Control": {"SetFrequency": ["Freq1", 1000.0]}},
            {"Control": {"SelectFrequency": "Freq1"}},
            {"Control": {"SetWaveform": "Triangle"}},
            "Start"
        ]"#;
        let cmds: Vec<Command> = serde_json::from_str(script).unwrap();
        assert_eq!(
            cmds,
            vec![
                Command::Clear,
                Command::Control(Action::SetFrequency(FreqRegister::Freq1, 1000.0)),
                Command::Control(Action::SelectFrequency(FreqRegister::Freq1)),
                Command::Control(Action::SetWaveform(Waveform::Triangle)),
                Command::Start,
            ]
        );
    }

    #[test]
    fn status_defaults_to_register_zero() {
        let status = StatusPayload::default();
        assert_eq!(status.frequency, FreqRegister::Freq0);
        assert_eq!(status.phase, PhaseRegister::Phase0);
        assert!(!status.wave_gen_enabled);
    }

    #[test]
    fn status_response_round_trips() {
        let resp = Response::Status(StatusPayload {
            wave_gen_enabled: true,
            dac_enabled: true,
            clock_enabled: false,
            frequency: FreqRegister::Freq1,
            phase: PhaseRegister::Phase0,
        });
        let text = serde_json::to_string(&resp).unwrap();
        assert_eq!(serde_json::from_str::<Response>(&text).unwrap(), resp);
    }
}
