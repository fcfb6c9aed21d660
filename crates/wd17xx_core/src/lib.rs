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

    lib.rs

    WD17xx floppy disk controller core.

    The controller is driven entirely through its four registers, a Scheduler
    that delivers one-shot delays, and a FloppyDrive collaborator. Nothing in
    this crate touches a global clock or global state.
*/

#![allow(dead_code)]

pub mod bus;
pub mod device_traits;
pub mod device_types;
pub mod devices;
pub mod fdc_config;
pub mod scheduler;

pub use crate::{
    device_traits::{
        floppy::FloppyDrive,
        signals::{HostSignals, NullSignals, SignalLatch},
    },
    device_types::{
        chrn::SectorId,
        fdc::{ChipType, CommandType, Density, DriveError, StepDirection},
    },
    devices::{
        fdc::controller::{FdcDebugState, FloppyController},
        floppy_drive::{FloppyMedia, MemoryFloppyDrive},
    },
    fdc_config::{ConfigError, FdcConfig, FdcTiming},
    scheduler::{DelayEvent, DelayQueue, DelayToken, Scheduler},
};
