//! Byte frames for AD9834 and AD5310 register writes
//!
//! All frames are big-endian 16-bit words. AD9834 words carry the target
//! register in their top bits; AD5310 words carry the 10-bit code in bits
//! 11..2 with normal power-down mode (bits 13..12 zero).

use transport::{FreqRegister, PhaseRegister, Waveform};

/// AD9834 control register: B28 set so a frequency register takes two
/// consecutive 14-bit loads, PIN/SW set so RESET, SLEEP, FSELECT and
/// PSELECT follow the control pins. MODE selects the triangle output.
const CONTROL_B28: u16 = 0x2000;
const CONTROL_PIN_SW: u16 = 0x0200;
const CONTROL_MODE: u16 = 0x0002;

/// Control word for sinusoidal output
pub const SINE_WAVE: [u8; 2] = (CONTROL_B28 | CONTROL_PIN_SW).to_be_bytes();
/// Control word for triangular output
pub const TRIANGLE_WAVE: [u8; 2] = (CONTROL_B28 | CONTROL_PIN_SW | CONTROL_MODE).to_be_bytes();

/// Zeroes FREQ0 (both halves), FREQ1 (both halves), PHASE0 and PHASE1 in one transfer
pub const CLEAR_WAVEGEN: [u8; 12] = [
    0x40, 0x00, 0x40, 0x00, 0x80, 0x00, 0x80, 0x00, 0xc0, 0x00, 0xe0, 0x00,
];
/// Zeroes the amplitude DAC
pub const CLEAR_DAC: [u8; 2] = [0x00, 0x00];

const FREQ_MASK: u32 = 0x3fff;
const PHASE_MASK: u16 = 0x0fff;
const AMPLITUDE_MASK: u16 = 0x03ff;

/// AD9834 register a data word is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterSelector {
    Freq0,
    Freq1,
    Phase0,
    Phase1,
}

impl RegisterSelector {
    /// High-order address bits merged into each 16-bit word
    pub const fn tag(self) -> u16 {
        match self {
            RegisterSelector::Freq0 => 0x4000,
            RegisterSelector::Freq1 => 0x8000,
            RegisterSelector::Phase0 => 0xc000,
            RegisterSelector::Phase1 => 0xe000,
        }
    }
}

impl From<FreqRegister> for RegisterSelector {
    fn from(reg: FreqRegister) -> Self {
        match reg {
            FreqRegister::Freq0 => RegisterSelector::Freq0,
            FreqRegister::Freq1 => RegisterSelector::Freq1,
        }
    }
}

impl From<PhaseRegister> for RegisterSelector {
    fn from(reg: PhaseRegister) -> Self {
        match reg {
            PhaseRegister::Phase0 => RegisterSelector::Phase0,
            PhaseRegister::Phase1 => RegisterSelector::Phase1,
        }
    }
}

pub const fn control_word(waveform: Waveform) -> [u8; 2] {
    match waveform {
        Waveform::Sine => SINE_WAVE,
        Waveform::Triangle => TRIANGLE_WAVE,
    }
}

/// Load a 28-bit tuning word: the 14 LSBs first, then the 14 MSBs, both
/// tagged with the same register
pub fn frequency(reg: FreqRegister, code: u32) -> [u8; 4] {
    let tag = RegisterSelector::from(reg).tag();
    let lsb = tag | (code & FREQ_MASK) as u16;
    let msb = tag | ((code >> 14) & FREQ_MASK) as u16;
    let [b0, b1] = lsb.to_be_bytes();
    let [b2, b3] = msb.to_be_bytes();
    [b0, b1, b2, b3]
}

pub fn phase(reg: PhaseRegister, code: u16) -> [u8; 2] {
    (RegisterSelector::from(reg).tag() | (code & PHASE_MASK)).to_be_bytes()
}

pub fn amplitude(code: u16) -> [u8; 2] {
    ((code & AMPLITUDE_MASK) << 2).to_be_bytes()
}
