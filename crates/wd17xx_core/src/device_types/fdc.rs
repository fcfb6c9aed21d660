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

    device_types::fdc.rs

    Defines types common to implementations of a WD17xx Floppy Disk Controller
*/

use lazy_static::lazy_static;
use serde::{self, Deserializer};
use serde_derive::Deserialize;
use std::{collections::HashMap, fmt, str::FromStr};
use strum_macros::Display;
#[cfg(test)]
use strum_macros::EnumIter;

/// Raw track length in bytes for double density media. This is also the size of the
/// controller's track buffer.
pub const MFM_TRACK_SIZE: usize = 6144;
/// Raw track length in bytes for single density media.
pub const FM_TRACK_SIZE: usize = 3172;
pub const TRACK_BUFFER_SIZE: usize = MFM_TRACK_SIZE;

pub const MAX_DRIVES: usize = 4;

/// Recording density. The density selects the byte period used to pace data requests and
/// the raw track length used by Read Track and Write Track.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Deserialize, Display)]
#[cfg_attr(test, derive(EnumIter))]
#[serde(rename_all = "snake_case")]
pub enum Density {
    FmLow,
    FmHigh,
    #[default]
    MfmLow,
    MfmHigh,
}

impl Density {
    /// Index into per-density timing tables.
    pub fn index(&self) -> usize {
        match self {
            Density::FmLow => 0,
            Density::FmHigh => 1,
            Density::MfmLow => 2,
            Density::MfmHigh => 3,
        }
    }

    pub fn is_mfm(&self) -> bool {
        matches!(self, Density::MfmLow | Density::MfmHigh)
    }

    pub fn track_size(&self) -> usize {
        if self.is_mfm() {
            MFM_TRACK_SIZE
        }
        else {
            FM_TRACK_SIZE
        }
    }
}

impl FromStr for Density {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, String>
    where
        Self: Sized,
    {
        match s.to_lowercase().as_str() {
            "fm_low" | "fm_lo" | "fm" => Ok(Density::FmLow),
            "fm_high" | "fm_hi" => Ok(Density::FmHigh),
            "mfm_low" | "mfm_lo" | "mfm" => Ok(Density::MfmLow),
            "mfm_high" | "mfm_hi" => Ok(Density::MfmHigh),
            _ => Err("Bad value for density".to_string()),
        }
    }
}

/// The members of the WD17xx family we know how to emulate. They share a command set and
/// differ mostly in side-select handling.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Display)]
#[cfg_attr(test, derive(EnumIter))]
pub enum ChipType {
    Wd1770,
    Wd1772,
    Wd1773,
    Wd179x,
    #[default]
    Wd1793,
    Wd2793,
}

pub struct ChipInfo {
    pub name: &'static str,
    /// Whether the chip compares the side flag of Type II commands against the ID field.
    pub side_select: bool,
}

lazy_static! {
    /// Static descriptive metadata for each supported controller chip.
    pub static ref CHIP_INFO: HashMap<ChipType, ChipInfo> = HashMap::from([
        (ChipType::Wd1770, ChipInfo { name: "WD1770", side_select: false }),
        (ChipType::Wd1772, ChipInfo { name: "WD1772", side_select: false }),
        (ChipType::Wd1773, ChipInfo { name: "WD1773", side_select: true }),
        (ChipType::Wd179x, ChipInfo { name: "WD179x", side_select: false }),
        (ChipType::Wd1793, ChipInfo { name: "WD1793", side_select: true }),
        (ChipType::Wd2793, ChipInfo { name: "WD2793", side_select: true }),
    ]);
}

impl ChipType {
    pub fn name(&self) -> &'static str {
        CHIP_INFO.get(self).map_or("WD17xx", |info| info.name)
    }

    pub fn has_side_select(&self) -> bool {
        CHIP_INFO.get(self).is_some_and(|info| info.side_select)
    }
}

impl FromStr for ChipType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, String>
    where
        Self: Sized,
    {
        match s.to_lowercase().as_str() {
            "wd1770" | "1770" => Ok(ChipType::Wd1770),
            "wd1772" | "1772" => Ok(ChipType::Wd1772),
            "wd1773" | "1773" => Ok(ChipType::Wd1773),
            "wd179x" | "179x" => Ok(ChipType::Wd179x),
            "wd1793" | "1793" => Ok(ChipType::Wd1793),
            "wd2793" | "2793" => Ok(ChipType::Wd2793),
            _ => Err("Bad value for chip type".to_string()),
        }
    }
}

impl<'de> serde::Deserialize<'de> for ChipType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ChipTypeVisitor;

        impl serde::de::Visitor<'_> for ChipTypeVisitor {
            type Value = ChipType;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("`wd1770`, `wd1772`, `wd1773`, `wd179x`, `wd1793` or `wd2793`")
            }

            fn visit_str<E>(self, value: &str) -> Result<ChipType, E>
            where
                E: serde::de::Error,
            {
                ChipType::from_str(value).map_err(|_| E::custom(format!("invalid chip type: {}", value)))
            }
        }

        deserializer.deserialize_str(ChipTypeVisitor)
    }
}

/// WD17xx command families. The command type selects how the status register is interpreted.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Display)]
pub enum CommandType {
    #[default]
    TypeI,
    TypeII,
    TypeIII,
    TypeIV,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Display)]
pub enum StepDirection {
    /// Toward the spindle (higher cylinders).
    #[default]
    In,
    /// Toward track 0.
    Out,
}

/// Errors a drive collaborator may report. The controller folds these into status bits;
/// they never cross the register interface.
#[derive(thiserror::Error, Clone, Copy, Debug, Eq, PartialEq)]
pub enum DriveError {
    #[error("No media in drive")]
    NoMedia,
    #[error("Sector with data id {0} not found")]
    SectorNotFound(usize),
    #[error("CRC error in sector data")]
    CrcError,
    #[error("Media is write protected")]
    WriteProtected,
    #[error("Failed to lock media")]
    MediaLock,
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn chip_metadata_covers_every_chip() {
        for chip in ChipType::iter() {
            assert!(CHIP_INFO.contains_key(&chip), "{} has no metadata", chip);
        }
        assert!(ChipType::Wd1793.has_side_select());
        assert!(ChipType::Wd2793.has_side_select());
        assert!(ChipType::Wd1773.has_side_select());
        assert!(!ChipType::Wd1772.has_side_select());
        assert!(!ChipType::Wd179x.has_side_select());
        assert_eq!(ChipType::Wd1770.name(), "WD1770");
    }

    #[test]
    fn parse_names() {
        assert_eq!("WD1793".parse::<ChipType>(), Ok(ChipType::Wd1793));
        assert_eq!("1772".parse::<ChipType>(), Ok(ChipType::Wd1772));
        assert!("nec765".parse::<ChipType>().is_err());
        assert_eq!("MFM_HI".parse::<Density>(), Ok(Density::MfmHigh));
        assert_eq!("fm".parse::<Density>(), Ok(Density::FmLow));
    }

    #[test]
    fn density_track_sizes() {
        assert_eq!(Density::FmLow.track_size(), FM_TRACK_SIZE);
        assert_eq!(Density::FmHigh.track_size(), FM_TRACK_SIZE);
        assert_eq!(Density::MfmLow.track_size(), MFM_TRACK_SIZE);
        let indices: Vec<usize> = Density::iter().map(|d| d.index()).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }
}
