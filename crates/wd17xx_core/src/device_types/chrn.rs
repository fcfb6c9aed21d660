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

    device_types::chrn.rs

    Defines the sector ID (C/H/R/N) type reported by drive collaborators.
*/

use std::fmt::Display;

/// The contents of a sector's ID field as found passing under the head, along with the
/// data mark type of its data field and an opaque handle the drive uses to locate the data.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct SectorId {
    pub cylinder: u8,
    pub head: u8,
    pub sector: u8,
    pub length_code: u8,
    /// Data field is preceded by a Deleted Data Address Mark.
    pub deleted: bool,
    pub data_id: usize,
}

impl Display for SectorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[c:{} h:{} s:{} n:{}{}]",
            self.cylinder,
            self.head,
            self.sector,
            self.length_code,
            if self.deleted { " deleted" } else { "" }
        )
    }
}

impl SectorId {
    pub fn new(cylinder: u8, head: u8, sector: u8, length_code: u8) -> Self {
        Self {
            cylinder,
            head,
            sector,
            length_code,
            ..Default::default()
        }
    }

    pub fn with_data_id(mut self, data_id: usize) -> Self {
        self.data_id = data_id;
        self
    }

    pub fn with_deleted(mut self, deleted: bool) -> Self {
        self.deleted = deleted;
        self
    }

    /// Sector size in bytes. The WD17xx only honors the low two bits of N.
    pub fn size(&self) -> usize {
        Self::decode_size(self.length_code)
    }

    pub fn decode_size(length_code: u8) -> usize {
        128 << (length_code & 0x03)
    }

    /// The four ID bytes in the order they appear on disk.
    pub fn to_bytes(&self) -> [u8; 4] {
        [self.cylinder, self.head, self.sector, self.length_code]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_wrap_on_two_bits() {
        assert_eq!(SectorId::new(0, 0, 1, 0).size(), 128);
        assert_eq!(SectorId::new(0, 0, 1, 1).size(), 256);
        assert_eq!(SectorId::new(0, 0, 1, 2).size(), 512);
        assert_eq!(SectorId::new(0, 0, 1, 3).size(), 1024);
        assert_eq!(SectorId::new(0, 0, 1, 6).size(), 512);
    }

    #[test]
    fn display() {
        let id = SectorId::new(5, 1, 9, 2).with_deleted(true);
        assert_eq!(id.to_string(), "[c:5 h:1 s:9 n:2 deleted]");
        assert_eq!(id.to_bytes(), [5, 1, 9, 2]);
    }
}
