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

    devices::floppy_drive.rs

    Implements an in-memory floppy drive.

    MemoryFloppyDrive models a drive mechanism: head position, motor, rotation and
    index sensor. Its media is a FloppyMedia shared through an Arc<RwLock<>> so a
    host can inspect or swap the disk while the drive is attached to a controller.
    Sector ID fields are spaced evenly around each track, starting at the index.
*/

use crate::{
    device_traits::floppy::{FloppyDrive, IndexEdge},
    device_types::{
        chrn::SectorId,
        fdc::{DriveError, StepDirection, FM_TRACK_SIZE, MFM_TRACK_SIZE},
    },
    devices::fdc::crc::{data_field_crc, id_field_crc},
};
use anyhow::{anyhow, Error};
use std::sync::{Arc, RwLock};

pub const DEFAULT_RPM: f64 = 300.0;
pub const INDEX_PULSE_US: f64 = 4000.0;
/// Drives can seek a bit beyond the end of the traditional media sizes.
pub const DEFAULT_MAX_CYLINDER: u8 = 83;

macro_rules! read_lock {
    ($arc_lock:expr) => {{
        match $arc_lock.try_read() {
            Ok(guard) => guard,
            Err(_) => return Err(DriveError::MediaLock),
        }
    }};
}

macro_rules! read_lock_opt {
    ($arc_lock:expr) => {{
        match $arc_lock.try_read() {
            Ok(guard) => guard,
            Err(_) => return None,
        }
    }};
}

macro_rules! write_lock {
    ($arc_lock:expr) => {{
        match $arc_lock.try_write() {
            Ok(guard) => guard,
            Err(_) => return Err(DriveError::MediaLock),
        }
    }};
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MediaSector {
    pub id: SectorId,
    pub data: Vec<u8>,
    /// Reads of this sector report a data CRC error.
    pub crc_error: bool,
}

/// A disk held in memory as a list of sectors per track, in rotational order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FloppyMedia {
    heads: usize,
    /// Indexed by [cylinder][head].
    tracks: Vec<Vec<Vec<MediaSector>>>,
    pub mfm: bool,
    write_ct: u64,
}

impl FloppyMedia {
    /// Create unformatted media.
    pub fn new(cylinders: usize, heads: usize, mfm: bool) -> Self {
        Self {
            heads,
            tracks: vec![vec![Vec::new(); heads]; cylinders],
            mfm,
            write_ct: 0,
        }
    }

    /// Create media with every track formatted with `sectors` sectors numbered from
    /// `first_sector`, each filled with `filler`.
    pub fn formatted(
        cylinders: usize,
        heads: usize,
        sectors: u8,
        first_sector: u8,
        length_code: u8,
        filler: u8,
        mfm: bool,
    ) -> Self {
        let mut media = Self::new(cylinders, heads, mfm);
        let size = SectorId::decode_size(length_code);
        for (c, cylinder) in media.tracks.iter_mut().enumerate() {
            for (h, track) in cylinder.iter_mut().enumerate() {
                for s in 0..sectors {
                    track.push(MediaSector {
                        id: SectorId::new(c as u8, h as u8, first_sector.wrapping_add(s), length_code),
                        data: vec![filler; size],
                        crc_error: false,
                    });
                }
            }
        }
        media
    }

    /// Build formatted media from a sector image laid out cylinder by cylinder, head by head.
    pub fn from_linear_bytes(
        bytes: &[u8],
        cylinders: usize,
        heads: usize,
        sectors: u8,
        length_code: u8,
        mfm: bool,
    ) -> Result<Self, Error> {
        let size = SectorId::decode_size(length_code);
        let expected = cylinders * heads * sectors as usize * size;
        if bytes.len() != expected {
            return Err(anyhow!(
                "Image size {} does not match geometry c:{} h:{} s:{} ({} bytes)",
                bytes.len(),
                cylinders,
                heads,
                sectors,
                expected
            ));
        }
        let mut media = Self::formatted(cylinders, heads, sectors, 1, length_code, 0, mfm);
        for (i, chunk) in bytes.chunks_exact(size).enumerate() {
            let s = i % sectors as usize;
            let h = (i / sectors as usize) % heads;
            let c = i / (sectors as usize * heads);
            media.tracks[c][h][s].data.copy_from_slice(chunk);
        }
        Ok(media)
    }

    pub fn into_arc(self) -> Arc<RwLock<Self>> {
        Arc::new(RwLock::new(self))
    }

    pub fn cylinders(&self) -> usize {
        self.tracks.len()
    }

    pub fn heads(&self) -> usize {
        self.heads
    }

    /// Number of sector writes and formats since the media was created.
    pub fn write_ct(&self) -> u64 {
        self.write_ct
    }

    pub fn track(&self, cylinder: usize, head: usize) -> Option<&[MediaSector]> {
        self.tracks.get(cylinder).and_then(|c| c.get(head)).map(|t| t.as_slice())
    }

    fn track_mut(&mut self, cylinder: usize, head: usize) -> Option<&mut Vec<MediaSector>> {
        self.tracks.get_mut(cylinder).and_then(|c| c.get_mut(head))
    }

    /// Return the track at the given position, extending the media's cylinder count if needed.
    fn track_mut_or_extend(&mut self, cylinder: usize, head: usize) -> Option<&mut Vec<MediaSector>> {
        if head >= self.heads {
            return None;
        }
        if cylinder >= self.tracks.len() {
            self.tracks.resize(cylinder + 1, vec![Vec::new(); self.heads]);
        }
        self.track_mut(cylinder, head)
    }

    /// Append a sector to a track, returning its position in the track.
    pub fn add_sector(&mut self, cylinder: usize, head: usize, id: SectorId, data: Vec<u8>) -> Result<usize, Error> {
        let track = self
            .track_mut_or_extend(cylinder, head)
            .ok_or_else(|| anyhow!("Invalid track c:{} h:{}", cylinder, head))?;
        track.push(MediaSector {
            id,
            data,
            crc_error: false,
        });
        Ok(track.len() - 1)
    }

    /// Find a sector by its ID sector number.
    pub fn sector_data(&self, cylinder: usize, head: usize, sector: u8) -> Option<&[u8]> {
        self.track(cylinder, head)?
            .iter()
            .find(|s| s.id.sector == sector)
            .map(|s| s.data.as_slice())
    }

    pub fn sector_data_mut(&mut self, cylinder: usize, head: usize, sector: u8) -> Option<&mut Vec<u8>> {
        self.track_mut(cylinder, head)?
            .iter_mut()
            .find(|s| s.id.sector == sector)
            .map(|s| &mut s.data)
    }

    pub fn set_crc_error(&mut self, cylinder: usize, head: usize, sector: u8, crc_error: bool) -> Result<(), Error> {
        let entry = self
            .track_mut(cylinder, head)
            .and_then(|t| t.iter_mut().find(|s| s.id.sector == sector))
            .ok_or_else(|| anyhow!("Sector c:{} h:{} s:{} not found", cylinder, head, sector))?;
        entry.crc_error = crc_error;
        Ok(())
    }

    pub fn clear_track(&mut self, cylinder: usize, head: usize) {
        if let Some(track) = self.track_mut(cylinder, head) {
            track.clear();
        }
    }

    /// Synthesize the raw bytes of a track using the IBM System 34 (MFM) or System 3740 (FM)
    /// layout, padded with gap bytes to the nominal track length.
    pub fn raw_track(&self, cylinder: usize, head: usize, mfm: bool) -> Vec<u8> {
        let (track_size, gap, sync, sync_len) = if mfm {
            (MFM_TRACK_SIZE, 0x4E, 0x00, 12)
        }
        else {
            (FM_TRACK_SIZE, 0xFF, 0x00, 6)
        };
        let mut raw = Vec::with_capacity(track_size);

        let mark = |raw: &mut Vec<u8>, byte: u8| {
            raw.extend(std::iter::repeat(sync).take(sync_len));
            if mfm {
                raw.extend_from_slice(&[0xA1, 0xA1, 0xA1]);
            }
            raw.push(byte);
        };

        // Gap 4a, index mark, gap 1.
        raw.extend(std::iter::repeat(gap).take(if mfm { 80 } else { 40 }));
        raw.extend(std::iter::repeat(sync).take(sync_len));
        if mfm {
            raw.extend_from_slice(&[0xC2, 0xC2, 0xC2]);
        }
        raw.push(0xFC);
        raw.extend(std::iter::repeat(gap).take(if mfm { 50 } else { 26 }));

        for sector in self.track(cylinder, head).unwrap_or(&[]) {
            let chrn = sector.id.to_bytes();
            mark(&mut raw, 0xFE);
            raw.extend_from_slice(&chrn);
            let crc = id_field_crc(chrn, mfm);
            raw.extend_from_slice(&crc.to_be_bytes());
            raw.extend(std::iter::repeat(gap).take(if mfm { 22 } else { 11 }));

            let dam = if sector.id.deleted { 0xF8 } else { 0xFB };
            mark(&mut raw, dam);
            raw.extend_from_slice(&sector.data);
            let mut crc = data_field_crc(dam, &sector.data, mfm);
            if sector.crc_error {
                crc = !crc;
            }
            raw.extend_from_slice(&crc.to_be_bytes());
            raw.extend(std::iter::repeat(gap).take(if mfm { 54 } else { 27 }));
        }

        raw.resize(track_size, gap);
        raw
    }
}

pub struct MemoryFloppyDrive {
    drive_n: usize,
    cylinder: u8,
    max_cylinder: u8,
    motor_on: bool,
    write_protected: bool,
    media: Option<Arc<RwLock<FloppyMedia>>>,
    /// Position within the current revolution.
    rotation_us: f64,
    revolution_us: f64,
    format_head: u8,
}

impl Default for MemoryFloppyDrive {
    fn default() -> Self {
        Self {
            drive_n: 0,
            cylinder: 0,
            max_cylinder: DEFAULT_MAX_CYLINDER,
            motor_on: false,
            write_protected: false,
            media: None,
            rotation_us: 0.0,
            revolution_us: 60_000_000.0 / DEFAULT_RPM,
            format_head: 0,
        }
    }
}

impl MemoryFloppyDrive {
    pub fn new(drive_n: usize) -> Self {
        Self {
            drive_n,
            ..Default::default()
        }
    }

    /// Create a drive with media already inserted.
    pub fn with_media(drive_n: usize, media: Arc<RwLock<FloppyMedia>>, write_protected: bool) -> Self {
        let mut drive = Self::new(drive_n);
        drive.insert_media(media, write_protected);
        drive
    }

    pub fn insert_media(&mut self, media: Arc<RwLock<FloppyMedia>>, write_protected: bool) {
        self.media = Some(media);
        self.write_protected = write_protected;
        self.rotation_us = 0.0;
        log::debug!("Drive {}: media inserted (write protect: {})", self.drive_n, write_protected);
    }

    pub fn eject_media(&mut self) -> Option<Arc<RwLock<FloppyMedia>>> {
        log::debug!("Drive {}: media ejected", self.drive_n);
        self.media.take()
    }

    pub fn media(&self) -> Option<Arc<RwLock<FloppyMedia>>> {
        self.media.clone()
    }

    pub fn set_write_protect(&mut self, write_protected: bool) {
        self.write_protected = write_protected;
    }

    pub fn set_rpm(&mut self, rpm: f64) -> Result<(), Error> {
        // A revolution must outlast the index pulse.
        if !(rpm > 0.0) || 60_000_000.0 / rpm <= INDEX_PULSE_US {
            return Err(anyhow!("Invalid rotation speed: {}", rpm));
        }
        self.revolution_us = 60_000_000.0 / rpm;
        Ok(())
    }

    pub fn set_max_cylinder(&mut self, max_cylinder: u8) {
        self.max_cylinder = max_cylinder;
    }

    /// Place the head directly on a cylinder, as if the drive had been left there.
    pub fn set_cylinder(&mut self, cylinder: u8) {
        self.cylinder = cylinder.min(self.max_cylinder);
    }

    pub fn cylinder(&self) -> u8 {
        self.cylinder
    }

    pub fn motor_on(&self) -> bool {
        self.motor_on
    }

    pub fn rotation_us(&self) -> f64 {
        self.rotation_us
    }

    pub fn revolution_us(&self) -> f64 {
        self.revolution_us
    }

    /// Current position within the revolution. A position within half a microsecond of the
    /// end of the revolution is treated as the index.
    fn position_us(&self) -> f64 {
        if self.rotation_us >= self.revolution_us - 0.5 {
            self.rotation_us - self.revolution_us
        }
        else {
            self.rotation_us
        }
    }

    fn sectors_on_track(&self, head: u8) -> usize {
        match &self.media {
            Some(media) => match media.try_read() {
                Ok(media) => media.track(self.cylinder as usize, head as usize).map_or(0, |t| t.len()),
                Err(_) => 0,
            },
            None => 0,
        }
    }
}

impl FloppyDrive for MemoryFloppyDrive {
    fn step(&mut self, direction: StepDirection) {
        match direction {
            StepDirection::In => {
                if self.cylinder < self.max_cylinder {
                    self.cylinder += 1;
                }
            }
            StepDirection::Out => {
                self.cylinder = self.cylinder.saturating_sub(1);
            }
        }
        log::trace!("Drive {}: step {} to cylinder {}", self.drive_n, direction, self.cylinder);
    }

    fn at_track0(&self) -> bool {
        self.cylinder == 0
    }

    fn is_ready(&self) -> bool {
        self.motor_on && self.media.is_some()
    }

    fn is_write_protected(&self) -> bool {
        self.write_protected
    }

    fn index_pulse_active(&self) -> bool {
        self.media.is_some() && self.rotation_us < INDEX_PULSE_US
    }

    fn next_address_mark(&mut self, head: u8) -> Option<SectorId> {
        let media = self.media.clone()?;
        let media = read_lock_opt!(media);
        let track = media.track(self.cylinder as usize, head as usize).unwrap_or(&[]);

        if track.is_empty() {
            return None;
        }

        let slot_us = self.revolution_us / track.len() as f64;
        let position = self.position_us();
        let next = (0..track.len())
            .find(|i| *i as f64 * slot_us >= position - 0.5)
            .unwrap_or(0);

        Some(track[next].id.with_data_id(next))
    }

    fn us_to_next_id(&self, head: u8) -> Option<f64> {
        let sectors = self.sectors_on_track(head);
        if sectors == 0 {
            return None;
        }
        let slot_us = self.revolution_us / sectors as f64;
        let position = self.position_us();
        let wait = (0..sectors)
            .map(|i| i as f64 * slot_us)
            .find(|at| *at > position + 0.5)
            .map_or(self.revolution_us - position, |at| at - position);
        Some(wait)
    }

    fn read_sector(&mut self, head: u8, id: &SectorId, len: usize) -> Result<Vec<u8>, DriveError> {
        let media = self.media.clone().ok_or(DriveError::NoMedia)?;
        let media = read_lock!(media);
        let sector = media
            .track(self.cylinder as usize, head as usize)
            .and_then(|t| t.get(id.data_id))
            .ok_or(DriveError::SectorNotFound(id.data_id))?;
        if sector.crc_error {
            return Err(DriveError::CrcError);
        }
        let mut data = sector.data.clone();
        data.resize(len, 0);
        Ok(data)
    }

    fn write_sector(&mut self, head: u8, id: &SectorId, data: &[u8], deleted: bool) -> Result<(), DriveError> {
        if self.write_protected {
            return Err(DriveError::WriteProtected);
        }
        let media = self.media.clone().ok_or(DriveError::NoMedia)?;
        let mut media = write_lock!(media);
        let sector = media
            .track_mut(self.cylinder as usize, head as usize)
            .and_then(|t| t.get_mut(id.data_id))
            .ok_or(DriveError::SectorNotFound(id.data_id))?;
        let n = sector.data.len().min(data.len());
        sector.data[..n].copy_from_slice(&data[..n]);
        sector.id.deleted = deleted;
        sector.crc_error = false;
        media.write_ct += 1;
        Ok(())
    }

    fn read_track_raw(&mut self, head: u8, mfm: bool) -> Result<Vec<u8>, DriveError> {
        let media = self.media.clone().ok_or(DriveError::NoMedia)?;
        let media = read_lock!(media);
        Ok(media.raw_track(self.cylinder as usize, head as usize, mfm))
    }

    fn begin_format(&mut self, head: u8) -> Result<(), DriveError> {
        if self.write_protected {
            return Err(DriveError::WriteProtected);
        }
        let media = self.media.clone().ok_or(DriveError::NoMedia)?;
        let mut media = write_lock!(media);
        media.clear_track(self.cylinder as usize, head as usize);
        self.format_head = head;
        Ok(())
    }

    fn format_sector(
        &mut self,
        cylinder: u8,
        head: u8,
        sector: u8,
        length_code: u8,
        filler: u8,
    ) -> Result<(), DriveError> {
        if self.write_protected {
            return Err(DriveError::WriteProtected);
        }
        let media = self.media.clone().ok_or(DriveError::NoMedia)?;
        let mut media = write_lock!(media);
        let id = SectorId::new(cylinder, head, sector, length_code);
        let track = media
            .track_mut_or_extend(self.cylinder as usize, self.format_head as usize)
            .ok_or(DriveError::SectorNotFound(0))?;
        track.push(MediaSector {
            id,
            data: vec![filler; id.size()],
            crc_error: false,
        });
        media.write_ct += 1;
        log::trace!("Drive {}: formatted {} filler {:02X}", self.drive_n, id, filler);
        Ok(())
    }

    fn set_motor(&mut self, on: bool) {
        self.motor_on = on;
    }

    fn rotate(&mut self, us: f64) -> Vec<IndexEdge> {
        let mut edges = Vec::new();
        if !self.motor_on || self.media.is_none() {
            return edges;
        }
        let mut remaining = us;
        while remaining > 0.0 {
            let next_edge = if self.rotation_us < INDEX_PULSE_US {
                INDEX_PULSE_US
            }
            else {
                self.revolution_us
            };
            let to_edge = next_edge - self.rotation_us;
            if remaining >= to_edge {
                remaining -= to_edge;
                let at_us = us - remaining;
                if next_edge >= self.revolution_us {
                    self.rotation_us = 0.0;
                    edges.push(IndexEdge::new(at_us, true));
                }
                else {
                    self.rotation_us = INDEX_PULSE_US;
                    edges.push(IndexEdge::new(at_us, false));
                }
            }
            else {
                self.rotation_us += remaining;
                remaining = 0.0;
            }
        }
        edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drive_with(media: FloppyMedia) -> (MemoryFloppyDrive, Arc<RwLock<FloppyMedia>>) {
        let media = media.into_arc();
        let mut drive = MemoryFloppyDrive::with_media(0, media.clone(), false);
        drive.set_motor(true);
        (drive, media)
    }

    /// Rotate to each ID field in turn the way a searching controller does.
    fn walk_ids(drive: &mut MemoryFloppyDrive, count: usize) -> Vec<u8> {
        let mut sectors = Vec::new();
        for _ in 0..count {
            let wait = drive.us_to_next_id(0).unwrap();
            drive.rotate(wait);
            sectors.push(drive.next_address_mark(0).unwrap().sector);
        }
        sectors
    }

    #[test]
    fn ids_come_around_once_per_revolution() {
        let (mut drive, _media) = drive_with(FloppyMedia::formatted(2, 1, 4, 1, 1, 0xE5, true));
        // The first ID on the track sits under the index hole.
        assert_eq!(drive.next_address_mark(0).unwrap().sector, 1);
        assert_eq!(drive.us_to_next_id(0), Some(50_000.0));
        assert_eq!(walk_ids(&mut drive, 8), vec![2, 3, 4, 1, 2, 3, 4, 1]);
        assert!(drive.index_pulse_active());
        assert!(drive.rotation_us() < 0.5);
    }

    #[test]
    fn next_address_mark_does_not_rotate() {
        let (mut drive, _media) = drive_with(FloppyMedia::formatted(1, 1, 4, 1, 1, 0xE5, true));
        drive.rotate(60_000.0);
        assert_eq!(drive.next_address_mark(0).unwrap().sector, 3);
        assert_eq!(drive.next_address_mark(0).unwrap().sector, 3);
        assert_eq!(drive.rotation_us(), 60_000.0);
        assert_eq!(drive.us_to_next_id(0), Some(40_000.0));

        // Past the last ID the next one is the first, at the index.
        drive.rotate(100_000.0);
        assert_eq!(drive.next_address_mark(0).unwrap().sector, 1);
        assert_eq!(drive.us_to_next_id(0), Some(40_000.0));
    }

    #[test]
    fn empty_track_has_no_ids() {
        let (mut drive, _media) = drive_with(FloppyMedia::new(2, 1, true));
        assert_eq!(drive.next_address_mark(0), None);
        assert_eq!(drive.us_to_next_id(0), None);
        drive.eject_media();
        assert_eq!(drive.us_to_next_id(0), None);
    }

    #[test]
    fn rotate_reports_edges() {
        let (mut drive, _media) = drive_with(FloppyMedia::formatted(1, 1, 9, 1, 2, 0, true));
        assert!(drive.rotate(1000.0).is_empty());
        assert_eq!(drive.rotate(3000.0), vec![IndexEdge::new(3000.0, false)]);
        assert_eq!(
            drive.rotate(200_000.0),
            vec![IndexEdge::new(196_000.0, true), IndexEdge::new(200_000.0, false)]
        );
        drive.set_motor(false);
        assert!(drive.rotate(400_000.0).is_empty());
    }

    #[test]
    fn step_limits() {
        let mut drive = MemoryFloppyDrive::new(1);
        drive.step(StepDirection::Out);
        assert!(drive.at_track0());
        drive.set_max_cylinder(2);
        for _ in 0..5 {
            drive.step(StepDirection::In);
        }
        assert_eq!(drive.cylinder(), 2);
    }

    #[test]
    fn write_then_read() {
        let (mut drive, media) = drive_with(FloppyMedia::formatted(1, 2, 9, 1, 2, 0xE5, true));
        let id = drive.next_address_mark(1).unwrap();
        drive.write_sector(1, &id, &[0xAA; 512], true).unwrap();
        assert_eq!(drive.read_sector(1, &id, 512).unwrap(), vec![0xAA; 512]);
        let media = media.read().unwrap();
        assert_eq!(media.write_ct(), 1);
        assert_eq!(media.sector_data(0, 1, id.sector), Some(&[0xAA; 512][..]));
        assert!(media.track(0, 1).unwrap()[id.data_id].id.deleted);
    }

    #[test]
    fn write_protect_and_missing_media() {
        let media = FloppyMedia::formatted(1, 1, 1, 1, 0, 0, false).into_arc();
        let mut drive = MemoryFloppyDrive::with_media(0, media, true);
        let id = SectorId::new(0, 0, 1, 0);
        assert_eq!(drive.write_sector(0, &id, &[0; 128], false), Err(DriveError::WriteProtected));
        assert_eq!(drive.format_sector(0, 0, 1, 0, 0xE5), Err(DriveError::WriteProtected));
        drive.eject_media();
        assert!(!drive.is_ready());
        assert_eq!(drive.read_sector(0, &id, 128), Err(DriveError::NoMedia));
    }

    #[test]
    fn linear_image_layout() {
        let mut bytes = vec![0u8; 2 * 2 * 2 * 128];
        for (i, chunk) in bytes.chunks_mut(128).enumerate() {
            chunk.fill(i as u8);
        }
        let media = FloppyMedia::from_linear_bytes(&bytes, 2, 2, 2, 0, false).unwrap();
        assert_eq!(media.sector_data(0, 0, 1).unwrap()[0], 0);
        assert_eq!(media.sector_data(0, 1, 2).unwrap()[0], 3);
        assert_eq!(media.sector_data(1, 0, 1).unwrap()[0], 4);
        assert!(FloppyMedia::from_linear_bytes(&bytes[1..], 2, 2, 2, 0, false).is_err());
    }

    #[test]
    fn raw_track_layout() {
        let media = FloppyMedia::formatted(1, 1, 2, 1, 0, 0xE5, true);
        let raw = media.raw_track(0, 0, true);
        assert_eq!(raw.len(), MFM_TRACK_SIZE);
        // Gap 4a, sync and index mark precede gap 1.
        assert_eq!(raw[80 + 12 + 3], 0xFC);
        let id_mark = raw.windows(4).position(|w| w == [0xA1, 0xA1, 0xA1, 0xFE]).unwrap();
        assert_eq!(&raw[id_mark + 4..id_mark + 8], &[0, 0, 1, 0]);
        let crc = id_field_crc([0, 0, 1, 0], true).to_be_bytes();
        assert_eq!(&raw[id_mark + 8..id_mark + 10], &crc);

        let fm = FloppyMedia::formatted(1, 1, 2, 1, 0, 0xE5, false).raw_track(0, 0, false);
        assert_eq!(fm.len(), FM_TRACK_SIZE);
    }
}
