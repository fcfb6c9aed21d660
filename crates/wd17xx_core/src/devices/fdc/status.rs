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

    devices::fdc::status.rs

    Status register composition.

    The meaning of most status bits depends on the type of the last command. Type I
    and Type IV commands present the Type I layout; Type II and Type III commands
    present the Type II layout.
*/

use crate::device_types::fdc::CommandType;
use modular_bitfield::{bitfield, prelude::*};

pub const STATUS_BUSY: u8 = 0b0000_0001;
pub const STATUS_INDEX: u8 = 0b0000_0010;
pub const STATUS_DRQ: u8 = 0b0000_0010;
pub const STATUS_TRACK0: u8 = 0b0000_0100;
pub const STATUS_LOST_DATA: u8 = 0b0000_0100;
pub const STATUS_CRC_ERROR: u8 = 0b0000_1000;
pub const STATUS_SEEK_ERROR: u8 = 0b0001_0000;
pub const STATUS_RECORD_NOT_FOUND: u8 = 0b0001_0000;
pub const STATUS_HEAD_LOADED: u8 = 0b0010_0000;
pub const STATUS_RECORD_TYPE: u8 = 0b0010_0000;
pub const STATUS_WRITE_PROTECTED: u8 = 0b0100_0000;
pub const STATUS_NOT_READY: u8 = 0b1000_0000;

/// Latched status conditions. Live drive signals (ready, track 0, write protect input) and
/// the busy/DRQ state are not stored here; they are sampled when the status is composed.
#[derive(Copy, Clone, Debug, Default)]
pub struct StatusFlags {
    pub head_loaded: bool,
    pub seek_error: bool,
    pub crc_error: bool,
    pub lost_data: bool,
    pub record_not_found: bool,
    pub record_type: bool,
    pub write_protected: bool,
}

impl StatusFlags {
    /// Clear the error conditions a new command starts without. The head load state persists.
    pub fn clear_errors(&mut self) {
        *self = StatusFlags {
            head_loaded: self.head_loaded,
            ..Default::default()
        };
    }
}

#[bitfield]
#[derive(Copy, Clone)]
struct TypeIStatusByte {
    busy: bool,
    index: bool,
    track0: bool,
    crc_error: bool,
    seek_error: bool,
    head_loaded: bool,
    write_protected: bool,
    not_ready: bool,
}

#[bitfield]
#[derive(Copy, Clone)]
struct TypeIIStatusByte {
    busy: bool,
    drq: bool,
    lost_data: bool,
    crc_error: bool,
    record_not_found: bool,
    record_type: bool,
    write_protected: bool,
    not_ready: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StatusView {
    TypeI {
        not_ready: bool,
        write_protected: bool,
        head_loaded: bool,
        seek_error: bool,
        crc_error: bool,
        track0: bool,
        index: bool,
        busy: bool,
    },
    TypeII {
        not_ready: bool,
        write_protected: bool,
        record_type: bool,
        record_not_found: bool,
        crc_error: bool,
        lost_data: bool,
        drq: bool,
        busy: bool,
    },
}

impl StatusView {
    /// Serialize to the byte presented on the status register.
    pub fn to_byte(&self) -> u8 {
        match *self {
            StatusView::TypeI {
                not_ready,
                write_protected,
                head_loaded,
                seek_error,
                crc_error,
                track0,
                index,
                busy,
            } => TypeIStatusByte::new()
                .with_not_ready(not_ready)
                .with_write_protected(write_protected)
                .with_head_loaded(head_loaded)
                .with_seek_error(seek_error)
                .with_crc_error(crc_error)
                .with_track0(track0)
                .with_index(index)
                .with_busy(busy)
                .into_bytes()[0],
            StatusView::TypeII {
                not_ready,
                write_protected,
                record_type,
                record_not_found,
                crc_error,
                lost_data,
                drq,
                busy,
            } => TypeIIStatusByte::new()
                .with_not_ready(not_ready)
                .with_write_protected(write_protected)
                .with_record_type(record_type)
                .with_record_not_found(record_not_found)
                .with_crc_error(crc_error)
                .with_lost_data(lost_data)
                .with_drq(drq)
                .with_busy(busy)
                .into_bytes()[0],
        }
    }

    /// Interpret a status byte according to the type of the command that produced it.
    pub fn from_byte(command_type: CommandType, byte: u8) -> Self {
        match command_type {
            CommandType::TypeI | CommandType::TypeIV => {
                let s = TypeIStatusByte::from_bytes([byte]);
                StatusView::TypeI {
                    not_ready: s.not_ready(),
                    write_protected: s.write_protected(),
                    head_loaded: s.head_loaded(),
                    seek_error: s.seek_error(),
                    crc_error: s.crc_error(),
                    track0: s.track0(),
                    index: s.index(),
                    busy: s.busy(),
                }
            }
            CommandType::TypeII | CommandType::TypeIII => {
                let s = TypeIIStatusByte::from_bytes([byte]);
                StatusView::TypeII {
                    not_ready: s.not_ready(),
                    write_protected: s.write_protected(),
                    record_type: s.record_type(),
                    record_not_found: s.record_not_found(),
                    crc_error: s.crc_error(),
                    lost_data: s.lost_data(),
                    drq: s.drq(),
                    busy: s.busy(),
                }
            }
        }
    }

    pub fn busy(&self) -> bool {
        match *self {
            StatusView::TypeI { busy, .. } | StatusView::TypeII { busy, .. } => busy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_i_layout() {
        let view = StatusView::TypeI {
            not_ready: false,
            write_protected: true,
            head_loaded: true,
            seek_error: false,
            crc_error: false,
            track0: true,
            index: false,
            busy: true,
        };
        let byte = view.to_byte();
        assert_eq!(byte, STATUS_WRITE_PROTECTED | STATUS_HEAD_LOADED | STATUS_TRACK0 | STATUS_BUSY);
        assert_eq!(StatusView::from_byte(CommandType::TypeI, byte), view);
    }

    #[test]
    fn type_ii_layout() {
        let view = StatusView::TypeII {
            not_ready: true,
            write_protected: false,
            record_type: true,
            record_not_found: true,
            crc_error: false,
            lost_data: true,
            drq: true,
            busy: false,
        };
        let byte = view.to_byte();
        assert_eq!(
            byte,
            STATUS_NOT_READY | STATUS_RECORD_TYPE | STATUS_RECORD_NOT_FOUND | STATUS_LOST_DATA | STATUS_DRQ
        );
        assert_eq!(StatusView::from_byte(CommandType::TypeIII, byte), view);
    }

    #[test]
    fn same_byte_two_meanings() {
        match StatusView::from_byte(CommandType::TypeIV, 0x24) {
            StatusView::TypeI { track0, head_loaded, .. } => assert!(track0 && head_loaded),
            other => panic!("unexpected {:?}", other),
        }
        match StatusView::from_byte(CommandType::TypeII, 0x24) {
            StatusView::TypeII { lost_data, record_type, .. } => assert!(lost_data && record_type),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn clear_errors_keeps_head_load() {
        let mut flags = StatusFlags {
            head_loaded: true,
            seek_error: true,
            lost_data: true,
            ..Default::default()
        };
        flags.clear_errors();
        assert!(flags.head_loaded);
        assert!(!flags.seek_error);
        assert!(!flags.lost_data);
    }
}
