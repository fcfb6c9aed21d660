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

    devices::fdc::crc.rs

    CRC-16/CCITT as used to protect ID and data fields on IBM format floppies.
*/

pub const CRC_INIT: u16 = 0xFFFF;
const CRC_POLY: u16 = 0x1021;

/// Fold `data` into a running CRC.
pub fn crc16_update(mut crc: u16, data: &[u8]) -> u16 {
    for byte in data {
        crc ^= (*byte as u16) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ CRC_POLY;
            }
            else {
                crc <<= 1;
            }
        }
    }
    crc
}

pub fn crc16(data: &[u8]) -> u16 {
    crc16_update(CRC_INIT, data)
}

/// CRC of an ID field, including its address mark. MFM address marks are preceded by three
/// 0xA1 sync bytes that are covered by the CRC; FM marks are not.
pub fn id_field_crc(chrn: [u8; 4], mfm: bool) -> u16 {
    let crc = if mfm {
        crc16_update(CRC_INIT, &[0xA1, 0xA1, 0xA1])
    }
    else {
        CRC_INIT
    };
    crc16_update(crc16_update(crc, &[0xFE]), &chrn)
}

/// CRC of a data field with the given data address mark.
pub fn data_field_crc(mark: u8, data: &[u8], mfm: bool) -> u16 {
    let crc = if mfm {
        crc16_update(CRC_INIT, &[0xA1, 0xA1, 0xA1])
    }
    else {
        CRC_INIT
    };
    crc16_update(crc16_update(crc, &[mark]), data)
}
