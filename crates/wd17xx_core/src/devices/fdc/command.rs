/*
    MartyPC
    https://github.com/dbalsom/martypc

    Copyright 2022-2025 Daniel Balsom

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------

    devices::fdc::command.rs

    Command byte decoding for the WD17xx.

      Pattern    Command          Type
      0000hVrr   Restore          I
      0001hVrr   Seek             I
      001uhVrr   Step             I
      010uhVrr   Step In          I
      011uhVrr   Step Out         I
      100mSECa   Read Sector      II
      101mSECa   Write Sector     II
      1100xE00   Read Address     III
      1110xE00   Read Track       III
      1111xE00   Write Track      III
      1101IIII   Force Interrupt  IV
*/

use crate::device_types::fdc::CommandType;
use modular_bitfield::{bitfield, prelude::*};
use std::fmt::Display;

/// Flags of a Type I command byte.
#[bitfield]
#[derive(Copy, Clone, Debug)]
pub struct StepFlags {
    /// Index into the step rate table.
    pub rate: B2,
    /// Verify the destination track by reading an ID field.
    pub verify: bool,
    /// 0 loads the head at the beginning of the command.
    pub no_head_load: bool,
    /// Update the track register on each step. Only meaningful for the step commands.
    pub update: bool,
    #[skip]
    op: B3,
}

/// Flags of a Type II or Type III command byte.
#[bitfield]
#[derive(Copy, Clone, Debug)]
pub struct TransferFlags {
    /// Write a Deleted Data Address Mark.
    pub deleted: bool,
    /// Compare the side of the ID field against `side`.
    pub side_compare: bool,
    /// Delay for head settling before starting.
    pub settle_delay: bool,
    /// Expected side of the ID field when comparing.
    pub side: bool,
    /// Transfer multiple records.
    pub multi: bool,
    #[skip]
    op: B3,
}

/// Interrupt conditions of a Force Interrupt command byte, in the chip's bit order:
/// I0 (bit 0) not ready to ready, I1 ready to not ready, I2 every index pulse and
/// I3 (bit 3) immediate. 0xD0 aborts without arming anything.
#[bitfield]
#[derive(Copy, Clone, Debug)]
pub struct InterruptFlags {
    pub nr_to_r: bool,
    pub r_to_nr: bool,
    pub index_pulse: bool,
    pub immediate: bool,
    #[skip]
    op: B4,
}

#[derive(Copy, Clone, Debug)]
pub enum Command {
    Restore(StepFlags),
    Seek(StepFlags),
    Step(StepFlags),
    StepIn(StepFlags),
    StepOut(StepFlags),
    ReadSector(TransferFlags),
    WriteSector(TransferFlags),
    ReadAddress(TransferFlags),
    ReadTrack(TransferFlags),
    WriteTrack(TransferFlags),
    ForceInterrupt(InterruptFlags),
}

impl Command {
    pub fn decode(byte: u8) -> Self {
        let step = StepFlags::from_bytes([byte]);
        let xfer = TransferFlags::from_bytes([byte]);
        match byte >> 4 {
            0x0 => Command::Restore(step),
            0x1 => Command::Seek(step),
            0x2 | 0x3 => Command::Step(step),
            0x4 | 0x5 => Command::StepIn(step),
            0x6 | 0x7 => Command::StepOut(step),
            0x8 | 0x9 => Command::ReadSector(xfer),
            0xA | 0xB => Command::WriteSector(xfer),
            0xC => Command::ReadAddress(xfer),
            0xD => Command::ForceInterrupt(InterruptFlags::from_bytes([byte])),
            0xE => Command::ReadTrack(xfer),
            _ => Command::WriteTrack(xfer),
        }
    }

    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Restore(_) | Command::Seek(_) | Command::Step(_) | Command::StepIn(_) | Command::StepOut(_) => {
                CommandType::TypeI
            }
            Command::ReadSector(_) | Command::WriteSector(_) => CommandType::TypeII,
            Command::ReadAddress(_) | Command::ReadTrack(_) | Command::WriteTrack(_) => CommandType::TypeIII,
            Command::ForceInterrupt(_) => CommandType::TypeIV,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Restore(_) => "Restore",
            Command::Seek(_) => "Seek",
            Command::Step(_) => "Step",
            Command::StepIn(_) => "Step In",
            Command::StepOut(_) => "Step Out",
            Command::ReadSector(_) => "Read Sector",
            Command::WriteSector(_) => "Write Sector",
            Command::ReadAddress(_) => "Read Address",
            Command::ReadTrack(_) => "Read Track",
            Command::WriteTrack(_) => "Write Track",
            Command::ForceInterrupt(_) => "Force Interrupt",
        }
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_every_nibble() {
        let expected = [
            (0x00, "Restore", CommandType::TypeI),
            (0x1F, "Seek", CommandType::TypeI),
            (0x20, "Step", CommandType::TypeI),
            (0x30, "Step", CommandType::TypeI),
            (0x48, "Step In", CommandType::TypeI),
            (0x70, "Step Out", CommandType::TypeI),
            (0x88, "Read Sector", CommandType::TypeII),
            (0x9C, "Read Sector", CommandType::TypeII),
            (0xA1, "Write Sector", CommandType::TypeII),
            (0xC4, "Read Address", CommandType::TypeIII),
            (0xD0, "Force Interrupt", CommandType::TypeIV),
            (0xE4, "Read Track", CommandType::TypeIII),
            (0xF4, "Write Track", CommandType::TypeIII),
        ];
        for (byte, name, command_type) in expected {
            let command = Command::decode(byte);
            assert_eq!(command.name(), name, "byte {:02X}", byte);
            assert_eq!(command.command_type(), command_type, "byte {:02X}", byte);
        }
    }

    #[test]
    fn decode_step_flags() {
        match Command::decode(0x5E) {
            Command::StepIn(flags) => {
                assert!(flags.update());
                assert!(flags.no_head_load());
                assert!(flags.verify());
                assert_eq!(flags.rate(), 2);
            }
            other => panic!("unexpected {}", other),
        }
        match Command::decode(0x03) {
            Command::Restore(flags) => {
                assert!(!flags.no_head_load());
                assert!(!flags.verify());
                assert_eq!(flags.rate(), 3);
            }
            other => panic!("unexpected {}", other),
        }
    }

    #[test]
    fn decode_transfer_flags() {
        match Command::decode(0xBF) {
            Command::WriteSector(flags) => {
                assert!(flags.multi());
                assert!(flags.side());
                assert!(flags.settle_delay());
                assert!(flags.side_compare());
                assert!(flags.deleted());
            }
            other => panic!("unexpected {}", other),
        }
    }

    #[test]
    fn decode_interrupt_flags() {
        match Command::decode(0xD8) {
            Command::ForceInterrupt(flags) => {
                assert!(flags.immediate());
                assert!(!flags.index_pulse());
            }
            other => panic!("unexpected {}", other),
        }
        match Command::decode(0xD4) {
            Command::ForceInterrupt(flags) => {
                assert!(flags.index_pulse());
                assert!(!flags.immediate());
            }
            other => panic!("unexpected {}", other),
        }
        match Command::decode(0xD1) {
            Command::ForceInterrupt(flags) => {
                assert!(flags.nr_to_r());
                assert!(!flags.r_to_nr() && !flags.index_pulse() && !flags.immediate());
            }
            other => panic!("unexpected {}", other),
        }
        match Command::decode(0xD2) {
            Command::ForceInterrupt(flags) => {
                assert!(flags.r_to_nr());
                assert!(!flags.nr_to_r());
            }
            other => panic!("unexpected {}", other),
        }
    }
}
