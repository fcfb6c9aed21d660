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

    fdc_config.rs

    Controller configuration. Every timing constant the controller uses lives here.

    Several of these values were tuned empirically against legacy software rather
    than taken from chip documentation. They are approximate and are kept
    configurable so hosts can adjust them.
*/

use crate::device_types::fdc::{ChipType, Density};
use serde_derive::Deserialize;

pub const DEFAULT_IO_BASE: u16 = 0x00F0;
/// Host clock used to convert tick deltas passed to the IoDevice adapter. This is the
/// IBM PC's 4.77MHz system clock.
pub const DEFAULT_CLOCK_MHZ: f64 = 4.772727;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse controller configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid timing value for {0}: {1}")]
    InvalidTiming(&'static str, f64),
    #[error("Invalid budget for {0}: must be non-zero")]
    InvalidBudget(&'static str),
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct FdcTiming {
    /// Microseconds per byte for FM low, FM high, MFM low and MFM high density.
    pub byte_period_us: [f64; 4],
    /// Step rate in milliseconds for each value of the Type I rate bits.
    pub step_rate_ms: [f64; 4],
    /// Busy time after a Type I command finishes moving the head.
    pub type1_complete_us: f64,
    /// Delay between a Type II/III command write and the start of the command.
    pub command_latency_us: f64,
    /// Head settle delay added when the E flag is set.
    pub settle_delay_us: f64,
    /// Completion delay after an error, in byte periods.
    pub error_delay_bytes: u32,
    /// Completion delay when the drive is not ready, in byte periods.
    pub not_ready_delay_bytes: u32,
    /// Completion delay after the last data byte of a command, in byte periods.
    pub data_done_delay_bytes: u32,
    /// Index pulses a Type II or Read Address search may see before giving up.
    pub search_revolutions: u32,
    /// Index pulses a Type I verify may see before giving up.
    pub verify_revolutions: u32,
    /// Maximum steps a Restore takes looking for track 0.
    pub restore_step_limit: u32,
}

impl Default for FdcTiming {
    fn default() -> Self {
        Self {
            byte_period_us: [128.0, 64.0, 32.0, 16.0],
            step_rate_ms: [6.0, 12.0, 20.0, 30.0],
            type1_complete_us: 100.0,
            command_latency_us: 40.0,
            settle_delay_us: 15_000.0,
            error_delay_bytes: 3,
            not_ready_delay_bytes: 1,
            data_done_delay_bytes: 3,
            search_revolutions: 4,
            verify_revolutions: 5,
            restore_step_limit: 255,
        }
    }
}

impl FdcTiming {
    pub fn byte_period(&self, density: Density) -> f64 {
        self.byte_period_us[density.index()]
    }

    pub fn step_rate_us(&self, rate_bits: u8) -> f64 {
        self.step_rate_ms[(rate_bits & 0x03) as usize] * 1000.0
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct FdcConfig {
    pub chip: ChipType,
    pub density: Density,
    /// Base IO port used by the IoDevice adapter.
    pub io_base: u16,
    /// Host clock in MHz. Elapsed time given to the IoDevice adapter in system ticks is
    /// converted to microseconds with it.
    pub clock_mhz: f64,
    /// When set, a data request the host does not service within one byte period sets
    /// LOST_DATA. Otherwise the controller waits for the host before requesting the next byte.
    pub strict_data_timing: bool,
    pub timing: FdcTiming,
}

impl Default for FdcConfig {
    fn default() -> Self {
        Self {
            chip: ChipType::default(),
            density: Density::default(),
            io_base: DEFAULT_IO_BASE,
            clock_mhz: DEFAULT_CLOCK_MHZ,
            strict_data_timing: false,
            timing: FdcTiming::default(),
        }
    }
}

impl FdcConfig {
    pub fn new(chip: ChipType) -> Self {
        Self {
            chip,
            ..Default::default()
        }
    }

    /// Parse a configuration from a TOML string. Missing fields take their default values.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let config: FdcConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.clock_mhz > 0.0) {
            return Err(ConfigError::InvalidTiming("clock_mhz", self.clock_mhz));
        }
        let t = &self.timing;
        for period in t.byte_period_us.iter() {
            if !(*period > 0.0) {
                return Err(ConfigError::InvalidTiming("byte_period_us", *period));
            }
        }
        for rate in t.step_rate_ms.iter() {
            if !(*rate >= 0.0) {
                return Err(ConfigError::InvalidTiming("step_rate_ms", *rate));
            }
        }
        for (name, value) in [
            ("type1_complete_us", t.type1_complete_us),
            ("command_latency_us", t.command_latency_us),
            ("settle_delay_us", t.settle_delay_us),
        ] {
            if !(value >= 0.0) {
                return Err(ConfigError::InvalidTiming(name, value));
            }
        }
        if t.search_revolutions == 0 {
            return Err(ConfigError::InvalidBudget("search_revolutions"));
        }
        if t.verify_revolutions == 0 {
            return Err(ConfigError::InvalidBudget("verify_revolutions"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = FdcConfig::default();
        assert_eq!(config.chip, ChipType::Wd1793);
        assert_eq!(config.timing.byte_period(Density::FmLow), 128.0);
        assert_eq!(config.timing.byte_period(Density::MfmHigh), 16.0);
        assert_eq!(config.timing.step_rate_us(3), 30_000.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_partial_toml() {
        let config = FdcConfig::from_toml_str(
            r#"
            chip = "wd1772"
            density = "fm_low"
            strict_data_timing = true

            [timing]
            step_rate_ms = [6.0, 12.0, 2.0, 3.0]
            "#,
        )
        .unwrap();
        assert_eq!(config.chip, ChipType::Wd1772);
        assert_eq!(config.density, Density::FmLow);
        assert!(config.strict_data_timing);
        assert_eq!(config.timing.step_rate_us(2), 2_000.0);
        assert_eq!(config.timing.search_revolutions, 4);
        assert_eq!(config.io_base, DEFAULT_IO_BASE);
        assert_eq!(config.clock_mhz, DEFAULT_CLOCK_MHZ);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            FdcConfig::from_toml_str("chip = \"nec765\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            FdcConfig::from_toml_str("[timing]\nbyte_period_us = [128.0, 64.0, 0.0, 16.0]"),
            Err(ConfigError::InvalidTiming("byte_period_us", _))
        ));
        assert!(matches!(
            FdcConfig::from_toml_str("[timing]\nsearch_revolutions = 0"),
            Err(ConfigError::InvalidBudget("search_revolutions"))
        ));
        assert!(matches!(
            FdcConfig::from_toml_str("clock_mhz = 0.0"),
            Err(ConfigError::InvalidTiming("clock_mhz", _))
        ));
    }
}
