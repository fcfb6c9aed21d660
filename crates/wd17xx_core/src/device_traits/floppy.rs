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

    device_traits::floppy.rs

    Defines the FloppyDrive trait, the controller's view of a disk drive mechanism
    and its media.
*/

use crate::device_types::{
    chrn::SectorId,
    fdc::{DriveError, StepDirection},
};

/// A change of the index sensor, `at_us` microseconds into a call to [FloppyDrive::rotate].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IndexEdge {
    pub at_us: f64,
    pub active: bool,
}

impl IndexEdge {
    pub fn new(at_us: f64, active: bool) -> Self {
        Self { at_us, active }
    }
}

/// A floppy drive as seen from the controller's side of the drive cable.
///
/// The controller never inspects media directly. Drives report ID fields as they pass under
/// the head via [FloppyDrive::next_address_mark], and read or write sector data addressed by
/// the [SectorId] handle they returned.
pub trait FloppyDrive {
    /// Move the head one cylinder in the given direction. Stepping out at cylinder 0 has no effect.
    fn step(&mut self, direction: StepDirection);

    fn at_track0(&self) -> bool;

    /// Media is inserted and the motor is up to speed.
    fn is_ready(&self) -> bool;

    fn is_write_protected(&self) -> bool;

    /// The index hole is currently under the sensor.
    fn index_pulse_active(&self) -> bool;

    /// Return the ID field currently under the head, or the first one to arrive after the
    /// current position. The drive does not rotate. A track with no ID fields returns None.
    fn next_address_mark(&mut self, head: u8) -> Option<SectorId>;

    /// Microseconds of rotation until the next ID field passes under the head. None if the
    /// track has no ID fields or there is no media.
    fn us_to_next_id(&self, head: u8) -> Option<f64>;

    fn read_sector(&mut self, head: u8, id: &SectorId, len: usize) -> Result<Vec<u8>, DriveError>;

    fn write_sector(&mut self, head: u8, id: &SectorId, data: &[u8], deleted: bool) -> Result<(), DriveError>;

    /// Return the raw contents of the current track, gaps and marks included.
    fn read_track_raw(&mut self, head: u8, mfm: bool) -> Result<Vec<u8>, DriveError>;

    /// Called once before the sectors of a formatted track are reported through
    /// [FloppyDrive::format_sector]. The default implementation does nothing.
    fn begin_format(&mut self, _head: u8) -> Result<(), DriveError> {
        Ok(())
    }

    /// Create a sector on the current track, filled with `filler`.
    fn format_sector(
        &mut self,
        cylinder: u8,
        head: u8,
        sector: u8,
        length_code: u8,
        filler: u8,
    ) -> Result<(), DriveError>;

    fn set_motor(&mut self, on: bool);

    /// Advance the drive's rotation by `us` microseconds, returning every index sensor edge
    /// that occurred, in order. Searches are bounded by counting rising edges, so a drive that
    /// never reports them can only end a search on a match. The default implementation
    /// produces no edges.
    fn rotate(&mut self, _us: f64) -> Vec<IndexEdge> {
        Vec::new()
    }
}
