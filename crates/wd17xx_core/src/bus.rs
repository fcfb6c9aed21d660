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

    bus.rs

    Defines the IO port interface a host bus uses to reach the controller.
*/

/// The amount of time elapsed on the host since a device was last run. Devices may use the
/// delta to catch up their internal state before servicing a port access.
#[derive(Copy, Clone, Debug)]
pub enum DeviceRunTimeUnit {
    SystemTicks(u32),
    Microseconds(f64),
}

pub const NULL_DELTA_US: DeviceRunTimeUnit = DeviceRunTimeUnit::Microseconds(0.0);
pub const NO_IO_BYTE: u8 = 0xFF;

impl DeviceRunTimeUnit {
    /// Convert the delta into microseconds given the host clock in MHz. Tick counts with no
    /// known clock convert to zero.
    pub fn as_us(&self, clock_mhz: f64) -> f64 {
        match *self {
            DeviceRunTimeUnit::SystemTicks(ticks) => {
                if clock_mhz > 0.0 {
                    ticks as f64 / clock_mhz
                }
                else {
                    0.0
                }
            }
            DeviceRunTimeUnit::Microseconds(us) => us,
        }
    }
}

pub trait IoDevice {
    /// Read a byte from the specified port, given a delta time that may be used to 'catch up'
    /// the device state. The default implementation returns NO_IO_BYTE (0xFF).
    fn read_u8(&mut self, _port: u16, _delta: DeviceRunTimeUnit) -> u8 {
        NO_IO_BYTE
    }

    /// Write a byte to the specified port, given a delta time that may be used to 'catch up'
    /// the device state. The default implementation does nothing.
    fn write_u8(&mut self, _port: u16, _data: u8, _delta: DeviceRunTimeUnit) {}

    /// Return a list of (name, port) pairs the device responds to.
    fn port_list(&self) -> Vec<(String, u16)>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_time_unit_to_us() {
        assert_eq!(DeviceRunTimeUnit::Microseconds(12.5).as_us(4.77), 12.5);
        assert_eq!(DeviceRunTimeUnit::SystemTicks(8).as_us(4.0), 2.0);
        assert_eq!(DeviceRunTimeUnit::SystemTicks(8).as_us(0.0), 0.0);
    }
}
