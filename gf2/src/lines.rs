//! Control lines and the reset sequences that depend on their ordering
//!
//! Each line has a logical state that is independent of how the pin is
//! wired. [`crate::bsp::line_pin`] holds the polarity of every line, so
//! nothing else in the driver inverts pin levels by hand.

use tracing::info;
use transport::{FreqRegister, PhaseRegister};

use crate::bridge::{Bridge, Channel, PinState};
use crate::bsp::{COMPARATOR_SETTLE_MS, SETTLE_US};
use crate::bus::{Bus, Delay};
use crate::frame;

/// GPIO-driven control inputs of the GF2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlLine {
    /// AD9834 RESET. Asserted means the generator runs
    WaveGenReset,
    /// DAC SLEEP. Asserted means the DAC is awake
    DacSleep,
    /// AD9834 FSELECT. Asserted selects FREQ1
    FreqSelect,
    /// AD9834 PSELECT. Asserted selects PHASE1
    PhaseSelect,
    /// Comparator shutdown. Asserted means the clock output runs
    ComparatorShutdown,
}

/// How a pin level maps onto a line's logical state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// High pin is asserted
    Direct,
    /// Low pin is asserted
    Inverted,
}

/// Logical state of a control line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineState {
    Asserted,
    Deasserted,
}

impl LineState {
    pub const fn is_asserted(self) -> bool {
        matches!(self, LineState::Asserted)
    }
}

impl From<bool> for LineState {
    fn from(asserted: bool) -> Self {
        if asserted {
            LineState::Asserted
        } else {
            LineState::Deasserted
        }
    }
}

impl Polarity {
    /// Pin level that puts a line in `state`
    pub fn level(self, state: LineState) -> PinState {
        let high = match self {
            Polarity::Direct => state.is_asserted(),
            Polarity::Inverted => !state.is_asserted(),
        };
        if high {
            PinState::High
        } else {
            PinState::Low
        }
    }

    /// Logical state a line is in when its pin reads `level`
    pub fn state(self, level: PinState) -> LineState {
        let asserted = level == PinState::High;
        LineState::from(match self {
            Polarity::Direct => asserted,
            Polarity::Inverted => !asserted,
        })
    }
}

impl From<FreqRegister> for LineState {
    fn from(reg: FreqRegister) -> Self {
        LineState::from(reg == FreqRegister::Freq1)
    }
}

impl From<PhaseRegister> for LineState {
    fn from(reg: PhaseRegister) -> Self {
        LineState::from(reg == PhaseRegister::Phase1)
    }
}

pub(crate) fn freq_register(state: LineState) -> FreqRegister {
    match state {
        LineState::Asserted => FreqRegister::Freq1,
        LineState::Deasserted => FreqRegister::Freq0,
    }
}

pub(crate) fn phase_register(state: LineState) -> PhaseRegister {
    match state {
        LineState::Asserted => PhaseRegister::Phase1,
        LineState::Deasserted => PhaseRegister::Phase0,
    }
}

/// Bring every stage to a known zero state with sine output
///
/// The AD9834 only honours the RESET pin once PIN/SW is set, and PIN/SW can
/// only be written while the part is out of reset. So the control word goes
/// in first, and the reset edge comes after it.
pub(crate) fn clear<B: Bridge, D: Delay>(bus: &mut Bus<'_, B, D>) {
    info!("Clearing waveform generator");
    bus.drive(ControlLine::WaveGenReset, LineState::Asserted);
    bus.write_register(Channel::WaveGen, &frame::SINE_WAVE);
    bus.settle_us(SETTLE_US);
    // Rising RESET zeroes the phase accumulator
    bus.drive(ControlLine::WaveGenReset, LineState::Deasserted);
    bus.write_register(Channel::WaveGen, &frame::CLEAR_WAVEGEN);
    bus.settle_us(SETTLE_US);
    bus.write_register(Channel::Dac, &frame::CLEAR_DAC);
    bus.settle_us(SETTLE_US);
    bus.drive(ControlLine::DacSleep, LineState::Asserted);
    bus.drive(ControlLine::FreqSelect, LineState::from(FreqRegister::Freq0));
    bus.drive(ControlLine::PhaseSelect, LineState::from(PhaseRegister::Phase0));
    bus.drive(ControlLine::ComparatorShutdown, LineState::Asserted);
    bus.drive(ControlLine::WaveGenReset, LineState::Asserted);
}

/// Pulse RESET so the output restarts from a known phase, even if it was
/// already running
pub(crate) fn start<B: Bridge, D: Delay>(bus: &mut Bus<'_, B, D>) {
    info!("Starting waveform generator");
    bus.drive(ControlLine::WaveGenReset, LineState::Deasserted);
    bus.drive(ControlLine::WaveGenReset, LineState::Asserted);
}

/// Hold the generator in reset and cycle the comparator if it was running
pub(crate) fn stop<B: Bridge, D: Delay>(bus: &mut Bus<'_, B, D>) {
    info!("Stopping waveform generator");
    bus.drive(ControlLine::WaveGenReset, LineState::Deasserted);
    if bus.read(ControlLine::ComparatorShutdown) == Some(LineState::Asserted) {
        bus.drive(ControlLine::ComparatorShutdown, LineState::Deasserted);
        bus.settle_ms(COMPARATOR_SETTLE_MS);
        bus.drive(ControlLine::ComparatorShutdown, LineState::Asserted);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverted_lines_assert_low() {
        assert_eq!(Polarity::Inverted.level(LineState::Asserted), PinState::Low);
        assert_eq!(Polarity::Inverted.level(LineState::Deasserted), PinState::High);
        assert_eq!(Polarity::Inverted.state(PinState::Low), LineState::Asserted);
    }

    #[test]
    fn direct_lines_assert_high() {
        assert_eq!(Polarity::Direct.level(LineState::Asserted), PinState::High);
        assert_eq!(Polarity::Direct.state(PinState::Low), LineState::Deasserted);
    }

    #[test]
    fn level_and_state_agree() {
        for polarity in [Polarity::Direct, Polarity::Inverted] {
            for state in [LineState::Asserted, LineState::Deasserted] {
                assert_eq!(polarity.state(polarity.level(state)), state);
            }
        }
    }

    #[test]
    fn register_one_is_asserted() {
        assert_eq!(LineState::from(FreqRegister::Freq1), LineState::Asserted);
        assert_eq!(LineState::from(PhaseRegister::Phase0), LineState::Deasserted);
        assert_eq!(freq_register(LineState::Asserted), FreqRegister::Freq1);
        assert_eq!(phase_register(LineState::Deasserted), PhaseRegister::Phase0);
    }
}
