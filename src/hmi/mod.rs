//! HMI command protocol — the binary host link.
//!
//! Fixed-size frame exchange with the host-side presentation layer:
//! every frame is at most [`BUFFER_SIZE`] bytes, the first byte is the
//! command opcode, the rest is opcode-specific. All multi-byte numeric
//! fields are big-endian on the wire (see [`codec`]).

pub mod codec;
pub mod protocol;
pub mod transport;

pub use protocol::HmiProtocol;

/// Fixed transport frame size: one full-speed USB bulk packet.
pub const BUFFER_SIZE: usize = 64;

/// Recipe upload capacity: 4 bytes per step flanked by opcode and
/// terminator inside one frame.
pub const MAX_RECIPE_STEPS: usize = (BUFFER_SIZE - 2) / 4;

/// Host → device command opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    Start = 1,
    Stop = 2,
    StartRecipe = 3,
    GetCurrentSample = 4,
    GetStatus = 5,
    SetAmbient = 6,
    SetPid = 7,
    GetPid = 8,
    /// Recipe terminator marker. Never sent as a command on its own.
    EndRecipe = 0xFF,
}

impl Command {
    /// Decode an opcode byte. Unknown values return `None` and the frame
    /// is ignored.
    pub fn from_opcode(b: u8) -> Option<Self> {
        match b {
            1 => Some(Self::Start),
            2 => Some(Self::Stop),
            3 => Some(Self::StartRecipe),
            4 => Some(Self::GetCurrentSample),
            5 => Some(Self::GetStatus),
            6 => Some(Self::SetAmbient),
            7 => Some(Self::SetPid),
            8 => Some(Self::GetPid),
            0xFF => Some(Self::EndRecipe),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_roundtrip() {
        for cmd in [
            Command::Start,
            Command::Stop,
            Command::StartRecipe,
            Command::GetCurrentSample,
            Command::GetStatus,
            Command::SetAmbient,
            Command::SetPid,
            Command::GetPid,
            Command::EndRecipe,
        ] {
            assert_eq!(Command::from_opcode(cmd as u8), Some(cmd));
        }
    }

    #[test]
    fn unknown_opcodes_rejected() {
        assert_eq!(Command::from_opcode(0), None);
        assert_eq!(Command::from_opcode(9), None);
        assert_eq!(Command::from_opcode(0xFE), None);
    }

    #[test]
    fn fifteen_steps_fit_a_frame() {
        assert_eq!(MAX_RECIPE_STEPS, 15);
        assert!(MAX_RECIPE_STEPS * 4 + 2 <= BUFFER_SIZE);
    }
}
