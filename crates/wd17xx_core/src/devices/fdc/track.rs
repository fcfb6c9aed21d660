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

    devices::fdc::track.rs

    Type III commands: Read Address, Read Track and Write Track.
*/

use super::{
    controller::{ControllerPhase, FloppyController, SearchPurpose},
    crc::id_field_crc,
};
use crate::{
    device_traits::signals::HostSignals,
    device_types::{chrn::SectorId, fdc::DriveError},
    scheduler::Scheduler,
};

/// ID address mark as written in a Write Track data stream.
pub const FORMAT_ID_MARK: u8 = 0xFE;
/// Data address marks as written in a Write Track data stream.
pub const FORMAT_DATA_MARK: u8 = 0xFB;
pub const FORMAT_DELETED_DATA_MARK: u8 = 0xF8;
/// Filler used when a formatted ID is not followed by a data field.
pub const FORMAT_DEFAULT_FILLER: u8 = 0xE5;

/// A sector described by a Write Track data stream.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct FormatEntry {
    pub cylinder: u8,
    pub head: u8,
    pub sector: u8,
    pub length_code: u8,
    pub filler: u8,
}

/// Scan a Write Track data stream for ID fields. Each ID's filler byte is the first byte
/// of the data field that follows it, and the data field is skipped so its contents are
/// never mistaken for an ID mark.
pub fn parse_format_stream(data: &[u8]) -> Vec<FormatEntry> {
    let mut entries = Vec::new();
    let mut i = 0;

    while i + 4 < data.len() {
        if data[i] != FORMAT_ID_MARK {
            i += 1;
            continue;
        }

        let mut entry = FormatEntry {
            cylinder: data[i + 1],
            head: data[i + 2],
            sector: data[i + 3],
            length_code: data[i + 4],
            filler: FORMAT_DEFAULT_FILLER,
        };
        i += 5;

        let mut j = i;
        while j < data.len() && data[j] != FORMAT_ID_MARK {
            if data[j] == FORMAT_DATA_MARK || data[j] == FORMAT_DELETED_DATA_MARK {
                if let Some(filler) = data.get(j + 1) {
                    entry.filler = *filler;
                }
                i = j + 1 + SectorId::decode_size(entry.length_code);
                break;
            }
            j += 1;
        }

        entries.push(entry);
    }
    entries
}

impl<S: Scheduler, H: HostSignals> FloppyController<S, H> {
    pub(super) fn begin_read_address(&mut self) {
        if !self.drive_ready() {
            return self.complete_not_ready();
        }
        self.phase = ControllerPhase::SearchingSector;
        self.start_search(SearchPurpose::Address);
    }

    /// Examine the next ID field for Read Address. Any ID will do.
    pub(super) fn address_step(&mut self) {
        if let Some(id) = self.fetch_id() {
            let crc = id_field_crc(id.to_bytes(), self.density.is_mfm());
            self.buffer[..4].copy_from_slice(&id.to_bytes());
            self.buffer[4] = (crc >> 8) as u8;
            self.buffer[5] = crc as u8;
            // The chip copies the cylinder into the sector register.
            self.sector_register = id.cylinder;
            self.log_cmd("address_step", &format!("{} crc:{:04X}", id, crc));
            self.start_transfer(6, ControllerPhase::TransferringRead);
            return;
        }
        self.continue_search();
    }

    pub(super) fn begin_read_track(&mut self) {
        if !self.drive_ready() {
            return self.complete_not_ready();
        }
        let head = self.head_select;
        let mfm = self.density.is_mfm();
        let len = self.density.track_size().min(self.buffer.len());

        let data = match self.drive_mut() {
            Some(drive) => drive.read_track_raw(head, mfm),
            None => Ok(Vec::new()),
        }
        .unwrap_or_else(|e| {
            log::warn!("begin_read_track(): drive read failed: {}", e);
            Vec::new()
        });

        let n = data.len().min(len);
        self.buffer[..n].copy_from_slice(&data[..n]);
        self.log_cmd("begin_read_track", &format!("{} bytes", n));
        if n == 0 {
            return self.complete_data_done();
        }
        self.start_transfer(n, ControllerPhase::TransferringRead);
    }

    pub(super) fn begin_write_track(&mut self) {
        if !self.drive_ready() {
            return self.complete_not_ready();
        }
        if self.drive().is_some_and(|d| d.is_write_protected()) {
            self.status.write_protected = true;
            self.log_cmd("begin_write_track", "media is write protected");
            return self.complete_error();
        }
        let len = self.density.track_size().min(self.buffer.len());
        self.log_cmd("begin_write_track", &format!("expecting {} bytes", len));
        self.start_transfer(len, ControllerPhase::Formatting);
    }

    /// The whole track has been received. Create a sector for every ID field in it.
    pub(super) fn write_track_done(&mut self) {
        let entries = parse_format_stream(&self.buffer[..self.data_offset]);
        let head = self.head_select;
        let mut result = Ok(());

        if let Some(drive) = self.drives[self.drive_select].as_deref_mut() {
            result = drive.begin_format(head);
            for entry in entries.iter() {
                if result.is_err() {
                    break;
                }
                result = drive.format_sector(entry.cylinder, entry.head, entry.sector, entry.length_code, entry.filler);
            }
        }

        match result {
            Ok(()) => {
                self.log_cmd("write_track_done", &format!("formatted {} sectors", entries.len()));
                self.complete_data_done();
            }
            Err(e) => {
                log::warn!("write_track_done(): format failed: {}", e);
                self.status.write_protected = matches!(e, DriveError::WriteProtected);
                self.complete_error();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_finds_ids_and_fillers() {
        let mut stream = vec![0x4E; 16];
        stream.extend_from_slice(&[0xF5, 0xF5, 0xF5, 0xFE, 2, 0, 1, 0, 0xF7]);
        stream.extend_from_slice(&[0x4E; 22]);
        stream.extend_from_slice(&[0xF5, 0xF5, 0xF5, 0xFB]);
        // Data field full of bytes that look like ID marks.
        stream.extend_from_slice(&[0xFE; 128]);
        stream.extend_from_slice(&[0xF7, 0x4E, 0x4E]);
        stream.extend_from_slice(&[0xFE, 2, 0, 2, 0, 0xF7, 0x4E]);
        stream.extend_from_slice(&[0x4E; 16]);

        let entries = parse_format_stream(&stream);
        assert_eq!(
            entries,
            vec![
                FormatEntry {
                    cylinder: 2,
                    head: 0,
                    sector: 1,
                    length_code: 0,
                    filler: 0xFE
                },
                FormatEntry {
                    cylinder: 2,
                    head: 0,
                    sector: 2,
                    length_code: 0,
                    filler: FORMAT_DEFAULT_FILLER
                },
            ]
        );
    }

    #[test]
    fn parse_ignores_truncated_id() {
        assert!(parse_format_stream(&[0x4E, 0x4E, 0xFE, 1, 0]).is_empty());
    }
}
