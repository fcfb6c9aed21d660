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

    devices::fdc::sector.rs

    Type II commands: Read Sector and Write Sector.
*/

use super::controller::{ControllerPhase, FloppyController, SearchPurpose, TransferState};
use crate::{
    device_traits::signals::HostSignals,
    device_types::{chrn::SectorId, fdc::DriveError},
    scheduler::Scheduler,
};

impl<S: Scheduler, H: HostSignals> FloppyController<S, H> {
    /// Begin a Read Sector for the sector register on the track register's cylinder.
    /// When `side_compare` is set and the chip supports it, only IDs whose head matches
    /// `requested_head` are accepted.
    pub fn begin_read_sector(&mut self, multi: bool, side_compare: bool, requested_head: u8) {
        self.xfer = TransferState {
            write: false,
            multi,
            side_compare,
            requested_head,
            deleted: false,
        };
        if !self.drive_ready() {
            return self.complete_not_ready();
        }
        self.log_cmd(
            "begin_read_sector",
            &format!(
                "c:{} h:{} s:{} multi:{} side_compare:{}",
                self.track_register, self.head_select, self.sector_register, multi, side_compare
            ),
        );
        self.search.target_sector = self.sector_register;
        self.phase = ControllerPhase::SearchingSector;
        self.start_search(SearchPurpose::Sector);
    }

    /// Begin a Write Sector. Write protected media fails the command before any data is requested.
    pub fn begin_write_sector(&mut self, multi: bool, side_compare: bool, requested_head: u8, deleted: bool) {
        self.xfer = TransferState {
            write: true,
            multi,
            side_compare,
            requested_head,
            deleted,
        };
        if !self.drive_ready() {
            return self.complete_not_ready();
        }
        if self.drive().is_some_and(|d| d.is_write_protected()) {
            self.status.write_protected = true;
            self.log_cmd("begin_write_sector", "media is write protected");
            return self.complete_error();
        }
        self.log_cmd(
            "begin_write_sector",
            &format!(
                "c:{} h:{} s:{} multi:{} deleted:{}",
                self.track_register, self.head_select, self.sector_register, multi, deleted
            ),
        );
        self.search.target_sector = self.sector_register;
        self.phase = ControllerPhase::SearchingSector;
        self.start_search(SearchPurpose::Sector);
    }

    fn id_matches(&self, id: &SectorId) -> bool {
        if id.cylinder != self.track_register {
            return false;
        }
        if self.xfer.side_compare && self.chip.has_side_select() && id.head != self.xfer.requested_head {
            return false;
        }
        id.sector == self.search.target_sector
    }

    /// Examine the next ID field of a sector search.
    pub(super) fn locate_step(&mut self) {
        if let Some(id) = self.fetch_id() {
            if self.id_matches(&id) {
                return self.sector_found(id);
            }
        }
        self.continue_search();
    }

    fn sector_found(&mut self, id: SectorId) {
        self.sector_register = self.search.target_sector;
        self.sector_length = id.size();
        self.ddam = id.deleted;
        self.sector_id = id;
        self.log_cmd("sector_found", &format!("{} data_id:{}", id, id.data_id));

        if self.xfer.write {
            self.start_transfer(self.sector_length, ControllerPhase::TransferringWrite);
            return;
        }

        let head = self.head_select;
        let len = self.sector_length;
        let result = match self.drive_mut() {
            Some(drive) => drive.read_sector(head, &id, len),
            None => Err(DriveError::NoMedia),
        };
        match result {
            Ok(data) => {
                let n = data.len().min(len);
                self.buffer[..n].copy_from_slice(&data[..n]);
                self.buffer[n..len].fill(0);
                self.start_transfer(len, ControllerPhase::TransferringRead);
            }
            Err(DriveError::CrcError) => {
                self.status.crc_error = true;
                self.log_cmd("sector_found", "drive reported CRC error");
                self.complete_error();
            }
            Err(e) => {
                log::warn!("sector_found(): drive read failed: {}", e);
                self.status.record_not_found = true;
                self.complete_error();
            }
        }
    }

    /// The last byte of a sector has been taken by the host.
    pub(super) fn read_sector_done(&mut self) {
        self.status.record_type = self.ddam;
        if self.xfer.multi {
            self.next_record();
        }
        else {
            self.complete_data_done();
        }
    }

    /// The last byte of a sector has been supplied by the host. Commit it to the drive.
    pub(super) fn write_sector_done(&mut self) {
        let head = self.head_select;
        let id = self.sector_id;
        let deleted = self.xfer.deleted;
        let len = self.sector_length;
        let result = match self.drives[self.drive_select].as_deref_mut() {
            Some(drive) => drive.write_sector(head, &id, &self.buffer[..len], deleted),
            None => Err(DriveError::NoMedia),
        };
        match result {
            Ok(()) => {
                self.log_cmd("write_sector_done", &format!("wrote {} bytes to {}", len, id));
                if self.xfer.multi {
                    self.next_record();
                }
                else {
                    self.complete_data_done();
                }
            }
            Err(DriveError::WriteProtected) => {
                self.status.write_protected = true;
                self.complete_error();
            }
            Err(e) => {
                log::warn!("write_sector_done(): drive write failed: {}", e);
                self.status.record_not_found = true;
                self.complete_error();
            }
        }
    }

    /// Multiple record mode: search for the next sector number. The sector register only
    /// advances once that sector is found, so the command ends with Record Not Found after
    /// the last sector on the track.
    fn next_record(&mut self) {
        self.search.target_sector = self.sector_register.wrapping_add(1);
        self.phase = ControllerPhase::SearchingSector;
        self.start_search(SearchPurpose::Sector);
    }
}
