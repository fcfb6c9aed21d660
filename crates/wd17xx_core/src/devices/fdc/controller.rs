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

    devices::fdc::controller.rs

    Implements the Western Digital WD17xx Floppy Disk Controller

    The controller exposes four registers. Commands written to the command register
    either complete synchronously or arm a delay through the Scheduler; every delay
    re-enters the controller through on_delay() with a DelayToken carrying the
    generation that armed it. Arming a new delay, a Force Interrupt or a reset bumps
    the generation so any older token is ignored when it arrives.
*/

use std::fmt::Display;

use crate::{
    bus::{DeviceRunTimeUnit, IoDevice, NO_IO_BYTE},
    device_traits::{
        floppy::FloppyDrive,
        signals::{HostSignals, SignalLatch},
    },
    device_types::fdc::{ChipType, CommandType, Density, StepDirection, MAX_DRIVES, TRACK_BUFFER_SIZE},
    device_types::chrn::SectorId,
    devices::fdc::{
        command::{Command, InterruptFlags},
        status::{StatusFlags, StatusView},
    },
    fdc_config::FdcConfig,
    scheduler::{DelayEvent, DelayQueue, DelayToken, Scheduler},
};

use wd17xx_common::{types::history_buffer::HistoryBuffer, util::format_us};

use anyhow::{anyhow, Error};

pub const FDC_LOG_LEN: usize = 1000;

pub const FDC_STATUS_REGISTER: usize = 0x00;
pub const FDC_COMMAND_REGISTER: usize = 0x00;
pub const FDC_TRACK_REGISTER: usize = 0x01;
pub const FDC_SECTOR_REGISTER: usize = 0x02;
pub const FDC_DATA_REGISTER: usize = 0x03;

/// Index pulse edges seen after a head load before the head unloads.
pub const HEAD_LOAD_EDGES: u8 = 2;

/// Command issued by reset(): Restore, no head load, fastest step rate.
pub const RESET_COMMAND: u8 = 0x08;

/// Represents the current phase of the controller. The controller is busy in every phase
/// but Idle.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum ControllerPhase {
    #[default]
    Idle,
    Seeking,
    SearchingSector,
    TransferringRead,
    TransferringWrite,
    Formatting,
    CompletingDelay,
}

impl Display for ControllerPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControllerPhase::Idle => write!(f, "Idle"),
            ControllerPhase::Seeking => write!(f, "Seeking"),
            ControllerPhase::SearchingSector => write!(f, "Searching Sector"),
            ControllerPhase::TransferringRead => write!(f, "Transferring (Read)"),
            ControllerPhase::TransferringWrite => write!(f, "Transferring (Write)"),
            ControllerPhase::Formatting => write!(f, "Formatting"),
            ControllerPhase::CompletingDelay => write!(f, "Completing"),
        }
    }
}

/// What a chain of SearchStep delays is looking for.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub(super) enum SearchPurpose {
    #[default]
    Verify,
    Sector,
    Address,
}

#[derive(Copy, Clone, Debug, Default)]
pub(super) struct SeekState {
    pub(super) restoring: bool,
    pub(super) target: u8,
    pub(super) steps: u32,
    pub(super) rate: u8,
    pub(super) verify: bool,
}

#[derive(Copy, Clone, Debug, Default)]
pub(super) struct SearchState {
    pub(super) active: bool,
    pub(super) purpose: SearchPurpose,
    /// Rising index edges seen since the search started.
    pub(super) revolutions: u32,
    /// Sector number being searched for. The sector register is only updated on a match.
    pub(super) target_sector: u8,
}

#[derive(Copy, Clone, Debug, Default)]
pub(super) struct TransferState {
    pub(super) write: bool,
    pub(super) multi: bool,
    pub(super) side_compare: bool,
    pub(super) requested_head: u8,
    pub(super) deleted: bool,
}

/// Interrupt conditions armed by the last Force Interrupt.
#[derive(Copy, Clone, Debug, Default)]
pub(super) struct InterruptConditions {
    pub(super) nr_to_r: bool,
    pub(super) r_to_nr: bool,
    pub(super) index: bool,
}

impl From<InterruptFlags> for InterruptConditions {
    fn from(flags: InterruptFlags) -> Self {
        Self {
            nr_to_r: flags.nr_to_r(),
            r_to_nr: flags.r_to_nr(),
            index: flags.index_pulse(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct FdcDebugState {
    pub chip: ChipType,
    pub phase: ControllerPhase,
    pub last_cmd: String,
    pub command_type: CommandType,
    pub status_register: u8,
    pub track_register: u8,
    pub sector_register: u8,
    pub data_register: u8,
    pub drive_select: usize,
    pub head_select: u8,
    pub density: Density,
    pub direction: StepDirection,
    pub irq: bool,
    pub drq: bool,
    pub data_remaining: usize,
    pub last_data_read: u8,
    pub last_data_written: u8,
    pub cmd_log: Vec<String>,
}

pub struct FloppyController<S: Scheduler = DelayQueue, H: HostSignals = SignalLatch> {
    pub(super) config: FdcConfig,
    pub(super) chip: ChipType,
    pub(super) scheduler: S,
    pub(super) signals: H,

    pub(super) drives: [Option<Box<dyn FloppyDrive>>; MAX_DRIVES],
    pub(super) drive_select: usize,
    pub(super) head_select: u8,
    pub(super) density: Density,

    pub(super) phase: ControllerPhase,
    pub(super) generation: u64,
    pub(super) command: Option<Command>,
    pub(super) command_byte: u8,
    pub(super) command_type: CommandType,

    pub(super) track_register: u8,
    pub(super) sector_register: u8,
    pub(super) data_register: u8,
    pub(super) direction: StepDirection,
    pub(super) status: StatusFlags,

    pub(super) drq: bool,
    pub(super) irq: bool,
    pub(super) hld_count: u8,
    pub(super) ipl: bool,
    pub(super) index_state: bool,
    pub(super) last_ready: bool,
    pub(super) int_conditions: InterruptConditions,

    pub(super) buffer: Vec<u8>,
    pub(super) data_offset: usize,
    pub(super) data_remaining: usize,

    pub(super) seek: SeekState,
    pub(super) search: SearchState,
    pub(super) xfer: TransferState,

    pub(super) ddam: bool,
    pub(super) sector_length: usize,
    pub(super) sector_id: SectorId,

    pub(super) last_data_read: u8,
    pub(super) last_data_written: u8,
    pub(super) cmd_log: HistoryBuffer<String>,
}

/// IO Port handlers for the FDC. The four registers are decoded relative to the configured
/// IO base. Any elapsed time passed in as microseconds is run before the access.
impl<S: Scheduler, H: HostSignals> IoDevice for FloppyController<S, H> {
    fn read_u8(&mut self, port: u16, delta: DeviceRunTimeUnit) -> u8 {
        self.catch_up(delta);
        match port.wrapping_sub(self.config.io_base) as usize {
            offset @ FDC_STATUS_REGISTER..=FDC_DATA_REGISTER => self.read_register(offset),
            _ => {
                log::warn!("FDC: read from unmapped port {:04X}", port);
                NO_IO_BYTE
            }
        }
    }

    fn write_u8(&mut self, port: u16, data: u8, delta: DeviceRunTimeUnit) {
        self.catch_up(delta);
        match port.wrapping_sub(self.config.io_base) as usize {
            offset @ FDC_COMMAND_REGISTER..=FDC_DATA_REGISTER => self.write_register(offset, data),
            _ => {
                log::warn!("FDC: write to unmapped port {:04X}", port);
            }
        }
    }

    fn port_list(&self) -> Vec<(String, u16)> {
        let base = self.config.io_base;
        vec![
            (String::from("FDC Status/Command Register"), base),
            (String::from("FDC Track Register"), base + FDC_TRACK_REGISTER as u16),
            (String::from("FDC Sector Register"), base + FDC_SECTOR_REGISTER as u16),
            (String::from("FDC Data Register"), base + FDC_DATA_REGISTER as u16),
        ]
    }
}

impl Default for FloppyController<DelayQueue, SignalLatch> {
    fn default() -> Self {
        Self::new(FdcConfig::default(), DelayQueue::new(), SignalLatch::new())
    }
}

impl<S: Scheduler, H: HostSignals> FloppyController<S, H> {
    pub fn new(config: FdcConfig, scheduler: S, signals: H) -> Self {
        let chip = config.chip;
        let density = config.density;
        FloppyController {
            config,
            chip,
            scheduler,
            signals,
            drives: [None, None, None, None],
            drive_select: 0,
            head_select: 0,
            density,
            phase: ControllerPhase::Idle,
            generation: 0,
            command: None,
            command_byte: 0,
            command_type: CommandType::TypeI,
            track_register: 0,
            sector_register: 1,
            data_register: 0,
            direction: StepDirection::In,
            status: StatusFlags::default(),
            drq: false,
            irq: false,
            hld_count: 0,
            ipl: false,
            index_state: false,
            last_ready: false,
            int_conditions: InterruptConditions::default(),
            buffer: vec![0; TRACK_BUFFER_SIZE],
            data_offset: 0,
            data_remaining: 0,
            seek: SeekState::default(),
            search: SearchState::default(),
            xfer: TransferState::default(),
            ddam: false,
            sector_length: 0,
            sector_id: SectorId::default(),
            last_data_read: 0,
            last_data_written: 0,
            cmd_log: HistoryBuffer::new(FDC_LOG_LEN),
        }
    }

    /// Reset the controller. Any command in progress is abandoned and a Restore is issued.
    pub fn reset(&mut self) {
        self.scheduler.cancel_all();
        self.generation += 1;
        self.phase = ControllerPhase::Idle;
        self.command = None;
        self.command_type = CommandType::TypeI;
        self.set_drq(false);
        self.clear_irq();
        self.status = StatusFlags::default();
        self.sector_register = 1;
        self.data_offset = 0;
        self.data_remaining = 0;
        self.hld_count = 0;
        self.int_conditions = InterruptConditions::default();
        self.seek = SeekState::default();
        self.search = SearchState::default();
        self.xfer = TransferState::default();

        self.cmd_log.clear();
        self.log_str("FDC Reset!");

        self.write_command(RESET_COMMAND);
    }

    /// Attach a drive to one of the four drive slots, replacing any drive already there.
    pub fn attach_drive(&mut self, slot: usize, drive: Box<dyn FloppyDrive>) -> Result<(), Error> {
        if slot >= MAX_DRIVES {
            return Err(anyhow!("Invalid drive slot: {}", slot));
        }
        self.drives[slot] = Some(drive);
        if slot == self.drive_select {
            self.sample_selected_drive();
        }
        Ok(())
    }

    pub fn detach_drive(&mut self, slot: usize) -> Option<Box<dyn FloppyDrive>> {
        let drive = self.drives.get_mut(slot).and_then(|d| d.take());
        if slot == self.drive_select {
            self.sample_selected_drive();
        }
        drive
    }

    /// Select the drive addressed by subsequent commands. Driven by host glue, never by commands.
    pub fn select_drive(&mut self, drive_select: usize) {
        if drive_select >= MAX_DRIVES {
            log::warn!("select_drive(): invalid drive {}", drive_select);
            return;
        }
        if drive_select != self.drive_select {
            self.drive_select = drive_select;
            self.sample_selected_drive();
            self.log_str(&format!("Drive {} selected", drive_select));
        }
    }

    pub fn select_side(&mut self, head: u8) {
        self.head_select = head & 0x01;
    }

    pub fn set_density(&mut self, density: Density) {
        if density != self.density {
            self.density = density;
            self.log_str(&format!("Density set to {}", density));
        }
    }

    /// Read one of the four registers. Offsets are masked to two bits.
    pub fn read_register(&mut self, offset: usize) -> u8 {
        debug_assert!(offset < 4, "invalid FDC register offset {}", offset);
        match offset & 0x03 {
            FDC_STATUS_REGISTER => self.read_status(),
            FDC_TRACK_REGISTER => self.track_register,
            FDC_SECTOR_REGISTER => self.sector_register,
            _ => self.read_data(),
        }
    }

    /// Write one of the four registers. Offsets are masked to two bits.
    pub fn write_register(&mut self, offset: usize, data: u8) {
        debug_assert!(offset < 4, "invalid FDC register offset {}", offset);
        match offset & 0x03 {
            FDC_COMMAND_REGISTER => self.write_command(data),
            FDC_TRACK_REGISTER => self.track_register = data,
            FDC_SECTOR_REGISTER => self.sector_register = data,
            _ => self.write_data(data),
        }
    }

    /// Read the status register. This clears the IRQ line.
    pub fn read_status(&mut self) -> u8 {
        let byte = self.status_byte();
        self.clear_irq();
        byte
    }

    pub fn status_byte(&self) -> u8 {
        self.status_view().to_byte()
    }

    /// Compose the status register for the current command type.
    pub fn status_view(&self) -> StatusView {
        let busy = self.is_busy();
        let (ready, write_protect_input, track0) = match self.drive() {
            Some(drive) => (drive.is_ready(), drive.is_write_protected(), drive.at_track0()),
            None => (false, false, false),
        };

        match self.command_type {
            CommandType::TypeI | CommandType::TypeIV => StatusView::TypeI {
                not_ready: !ready,
                write_protected: write_protect_input || self.status.write_protected,
                head_loaded: self.status.head_loaded,
                seek_error: self.status.seek_error,
                crc_error: self.status.crc_error,
                track0,
                index: self.ipl,
                busy,
            },
            CommandType::TypeII | CommandType::TypeIII => StatusView::TypeII {
                not_ready: !ready,
                write_protected: self.status.write_protected,
                record_type: self.status.record_type,
                record_not_found: self.status.record_not_found,
                crc_error: self.status.crc_error,
                lost_data: self.status.lost_data,
                drq: self.drq,
                busy,
            },
        }
    }

    /// Write the command register.
    pub fn write_command(&mut self, byte: u8) {
        let command = Command::decode(byte);

        if self.is_busy() && !matches!(command, Command::ForceInterrupt(_)) {
            log::warn!(
                "write_command(): ignoring {} ({:02X}) while busy in phase {}",
                command,
                byte,
                self.phase
            );
            return;
        }

        self.clear_irq();
        if let Some(drive) = self.drive_mut() {
            drive.set_motor(true);
        }

        self.status.write_protected = false;
        self.status.record_type = false;
        self.status.record_not_found = false;

        self.command = Some(command);
        self.command_byte = byte;
        self.command_type = command.command_type();
        self.log_cmd(
            "write_command",
            &format!("{:02X} drive:{} head:{}", byte, self.drive_select, self.head_select),
        );

        match command {
            Command::ForceInterrupt(flags) => self.force_interrupt(flags),
            Command::Restore(flags)
            | Command::Seek(flags)
            | Command::Step(flags)
            | Command::StepIn(flags)
            | Command::StepOut(flags) => {
                self.int_conditions = InterruptConditions::default();
                self.status.clear_errors();
                self.begin_type1(command, flags);
            }
            Command::ReadSector(flags)
            | Command::WriteSector(flags)
            | Command::ReadAddress(flags)
            | Command::ReadTrack(flags)
            | Command::WriteTrack(flags) => {
                self.int_conditions = InterruptConditions::default();
                self.status.clear_errors();
                self.set_drq(false);
                self.data_offset = 0;
                self.data_remaining = 0;
                self.phase = match command {
                    Command::ReadTrack(_) => ControllerPhase::TransferringRead,
                    Command::WriteTrack(_) => ControllerPhase::Formatting,
                    _ => ControllerPhase::SearchingSector,
                };
                let mut delay = self.config.timing.command_latency_us;
                if flags.settle_delay() {
                    delay += self.config.timing.settle_delay_us;
                }
                self.arm(DelayEvent::CommandStart, delay);
            }
        }
    }

    /// Abort whatever is in progress and arm the interrupt conditions given in the command.
    fn force_interrupt(&mut self, flags: InterruptFlags) {
        self.scheduler.cancel_all();
        self.generation += 1;

        if self.is_busy() {
            self.log_str(&format!("Force Interrupt: aborting in phase {}", self.phase));
        }

        self.phase = ControllerPhase::Idle;
        self.set_drq(false);
        self.data_offset = 0;
        self.data_remaining = 0;
        self.search = SearchState::default();
        self.xfer = TransferState::default();
        self.seek = SeekState::default();

        self.int_conditions = InterruptConditions::from(flags);
        self.last_ready = self.drive_ready();

        if flags.immediate() {
            self.raise_irq();
        }
    }

    /// Start the Type II or Type III command latched in the command register once its start
    /// latency has elapsed.
    fn command_start(&mut self) {
        match self.command {
            Some(Command::ReadSector(flags)) => {
                self.begin_read_sector(flags.multi(), flags.side_compare(), flags.side() as u8);
            }
            Some(Command::WriteSector(flags)) => {
                self.begin_write_sector(flags.multi(), flags.side_compare(), flags.side() as u8, flags.deleted());
            }
            Some(Command::ReadAddress(_)) => self.begin_read_address(),
            Some(Command::ReadTrack(_)) => self.begin_read_track(),
            Some(Command::WriteTrack(_)) => self.begin_write_track(),
            _ => {
                log::error!("command_start(): no command to start");
                self.phase = ControllerPhase::Idle;
            }
        }
    }

    /// Deliver an expired delay. Tokens from an older generation are ignored.
    pub fn on_delay(&mut self, token: DelayToken) {
        if token.generation != self.generation {
            log::trace!(
                "on_delay(): ignoring stale {} (generation {} != {})",
                token.event,
                token.generation,
                self.generation
            );
            return;
        }
        match token.event {
            DelayEvent::CommandStart => self.command_start(),
            DelayEvent::StepPulse => self.seek_step(),
            DelayEvent::SearchStep => self.search_step(),
            DelayEvent::DataRequest => self.data_request(),
            DelayEvent::Complete => self.finish_command(),
        }
    }

    /// Run the controller for `us` microseconds, rotating the selected drive and delivering
    /// every delay that expires along the way.
    pub fn run(&mut self, us: f64) {
        let target = self.scheduler.now_us() + us.max(0.0);

        while let Some(due) = self.scheduler.next_due_us() {
            if due > target {
                break;
            }
            let elapsed = due - self.scheduler.now_us();
            self.rotate_drive(elapsed);
            if let Some(token) = self.scheduler.pop_due(due) {
                self.on_delay(token);
            }
        }

        let remaining = target - self.scheduler.now_us();
        self.rotate_drive(remaining);
        self.scheduler.advance_to(target);
        self.poll_ready();
    }

    fn catch_up(&mut self, delta: DeviceRunTimeUnit) {
        let us = delta.as_us(self.config.clock_mhz);
        if us > 0.0 {
            self.run(us);
        }
    }

    fn rotate_drive(&mut self, us: f64) {
        if us <= 0.0 {
            return;
        }
        let edges = match self.drive_mut() {
            Some(drive) => drive.rotate(us),
            None => return,
        };
        let start = self.scheduler.now_us();
        for edge in edges {
            self.scheduler.advance_to(start + edge.at_us);
            self.index_pulse(edge.active);
        }
    }

    /// Notify the controller of a change of the selected drive's index sensor.
    pub fn index_pulse(&mut self, state: bool) {
        if state == self.index_state {
            return;
        }
        self.index_state = state;
        self.ipl = !self.ipl;

        if self.hld_count > 0 {
            self.hld_count -= 1;
            if self.hld_count == 0 {
                self.status.head_loaded = false;
                log::trace!("index_pulse(): head unloaded");
            }
        }

        if state && self.int_conditions.index {
            log::trace!("index_pulse(): index interrupt");
            self.raise_irq();
        }

        if state && self.search.active {
            self.search.revolutions += 1;
            let budget = match self.search.purpose {
                SearchPurpose::Verify => self.config.timing.verify_revolutions,
                _ => self.config.timing.search_revolutions,
            };
            if self.search.revolutions >= budget {
                self.search_timeout();
            }
        }
    }

    fn poll_ready(&mut self) {
        let ready = self.drive_ready();
        if ready != self.last_ready {
            if (ready && self.int_conditions.nr_to_r) || (!ready && self.int_conditions.r_to_nr) {
                log::trace!("poll_ready(): ready transition interrupt ({})", ready);
                self.raise_irq();
            }
            self.last_ready = ready;
        }
    }

    fn sample_selected_drive(&mut self) {
        self.index_state = self.drive().is_some_and(|d| d.index_pulse_active());
        self.last_ready = self.drive_ready();
    }

    pub(super) fn drive(&self) -> Option<&dyn FloppyDrive> {
        self.drives[self.drive_select].as_deref()
    }

    pub(super) fn drive_mut(&mut self) -> Option<&mut (dyn FloppyDrive + 'static)> {
        self.drives[self.drive_select].as_deref_mut()
    }

    pub(super) fn drive_ready(&self) -> bool {
        self.drive().is_some_and(|d| d.is_ready())
    }

    pub(super) fn byte_period(&self) -> f64 {
        self.config.timing.byte_period(self.density)
    }

    /// Arm a delay for `event`, invalidating any delay armed before it.
    pub(super) fn arm(&mut self, event: DelayEvent, delay_us: f64) {
        self.generation += 1;
        log::trace!("arm(): {} in {}", event, format_us(delay_us));
        self.scheduler.arm_delay(
            delay_us,
            DelayToken {
                generation: self.generation,
                event,
            },
        );
    }

    /// Fetch the ID field under the head of the selected drive.
    pub(super) fn fetch_id(&mut self) -> Option<SectorId> {
        let head = self.head_select;
        self.drive_mut().and_then(|drive| drive.next_address_mark(head))
    }

    /// A SearchStep delay has expired.
    fn search_step(&mut self) {
        match self.search.purpose {
            SearchPurpose::Verify => self.verify_step(),
            SearchPurpose::Sector => self.locate_step(),
            SearchPurpose::Address => self.address_step(),
        }
    }

    pub(super) fn start_search(&mut self, purpose: SearchPurpose) {
        self.search.active = true;
        self.search.purpose = purpose;
        self.search.revolutions = 0;
        self.continue_search();
    }

    /// Wait for the next ID field to come around. A track with no ID fields arms nothing and
    /// the search ends on the index edge that exhausts its revolution budget.
    pub(super) fn continue_search(&mut self) {
        if !self.drive_ready() {
            return self.search_timeout();
        }
        let head = self.head_select;
        match self.drive().and_then(|drive| drive.us_to_next_id(head)) {
            Some(wait_us) => self.arm(DelayEvent::SearchStep, wait_us),
            None => log::trace!("continue_search(): no ID fields on track, waiting for index"),
        }
    }

    /// The revolution budget of the current search is exhausted.
    fn search_timeout(&mut self) {
        let revolutions = self.search.revolutions;
        self.search.active = false;
        match self.search.purpose {
            SearchPurpose::Verify => {
                self.status.seek_error = true;
                self.log_cmd(
                    "search_timeout",
                    &format!("no ID for track {} after {} revolutions", self.track_register, revolutions),
                );
                self.complete_after(self.config.timing.type1_complete_us);
            }
            SearchPurpose::Sector => {
                self.status.record_not_found = true;
                self.log_cmd(
                    "search_timeout",
                    &format!(
                        "sector c:{} s:{} not found after {} revolutions",
                        self.track_register, self.search.target_sector, revolutions
                    ),
                );
                self.complete_error();
            }
            SearchPurpose::Address => {
                self.status.record_not_found = true;
                self.log_cmd("search_timeout", "no ID field found");
                self.complete_error();
            }
        }
    }

    /// Begin streaming `len` bytes of the buffer to or from the host, one byte per byte period.
    pub(super) fn start_transfer(&mut self, len: usize, phase: ControllerPhase) {
        self.search.active = false;
        self.data_offset = 0;
        self.data_remaining = len.min(self.buffer.len());
        self.phase = phase;
        self.arm(DelayEvent::DataRequest, self.byte_period());
    }

    /// A byte period has elapsed during a transfer.
    fn data_request(&mut self) {
        if self.data_remaining == 0 {
            return;
        }
        let strict = self.config.strict_data_timing;
        match self.phase {
            ControllerPhase::TransferringRead => {
                if self.drq {
                    // The host missed the byte. It is overwritten by the next one.
                    self.status.lost_data = true;
                    log::trace!("data_request(): lost data at offset {}", self.data_offset);
                    self.data_offset += 1;
                    self.data_remaining -= 1;
                    if self.data_remaining == 0 {
                        self.set_drq(false);
                        self.read_transfer_done();
                        return;
                    }
                    self.data_register = self.buffer[self.data_offset];
                }
                else {
                    self.data_register = self.buffer[self.data_offset];
                    self.set_drq(true);
                }
            }
            ControllerPhase::TransferringWrite | ControllerPhase::Formatting => {
                if self.drq {
                    // The host missed the request. A zero byte is written in its place.
                    self.status.lost_data = true;
                    log::trace!("data_request(): lost data at offset {}", self.data_offset);
                    self.buffer[self.data_offset] = 0;
                    self.data_offset += 1;
                    self.data_remaining -= 1;
                    if self.data_remaining == 0 {
                        self.set_drq(false);
                        self.write_transfer_done();
                        return;
                    }
                }
                else {
                    self.set_drq(true);
                }
            }
            _ => return,
        }
        if strict {
            self.arm(DelayEvent::DataRequest, self.byte_period());
        }
    }

    /// Read the data register. While a read transfer has a byte pending this consumes it.
    pub fn read_data(&mut self) -> u8 {
        let byte = self.data_register;
        if self.phase == ControllerPhase::TransferringRead && self.drq && self.data_remaining > 0 {
            self.set_drq(false);
            self.last_data_read = byte;
            self.data_offset += 1;
            self.data_remaining -= 1;
            if self.data_remaining == 0 {
                self.read_transfer_done();
            }
            else if !self.config.strict_data_timing {
                self.arm(DelayEvent::DataRequest, self.byte_period());
            }
        }
        byte
    }

    /// Write the data register. While a write transfer is requesting a byte this supplies it.
    pub fn write_data(&mut self, byte: u8) {
        self.data_register = byte;
        let writing = matches!(
            self.phase,
            ControllerPhase::TransferringWrite | ControllerPhase::Formatting
        );
        if writing && self.drq && self.data_remaining > 0 {
            self.set_drq(false);
            self.buffer[self.data_offset] = byte;
            self.last_data_written = byte;
            self.data_offset += 1;
            self.data_remaining -= 1;
            if self.data_remaining == 0 {
                self.write_transfer_done();
            }
            else if !self.config.strict_data_timing {
                self.arm(DelayEvent::DataRequest, self.byte_period());
            }
        }
    }

    fn read_transfer_done(&mut self) {
        match self.command {
            Some(Command::ReadSector(_)) => self.read_sector_done(),
            _ => self.complete_data_done(),
        }
    }

    fn write_transfer_done(&mut self) {
        match self.phase {
            ControllerPhase::Formatting => self.write_track_done(),
            _ => self.write_sector_done(),
        }
    }

    /// Drop DRQ and finish the command after `delay_us`. Busy stays set until then.
    pub(super) fn complete_after(&mut self, delay_us: f64) {
        self.search.active = false;
        self.set_drq(false);
        self.data_remaining = 0;
        self.phase = ControllerPhase::CompletingDelay;
        self.arm(DelayEvent::Complete, delay_us);
    }

    pub(super) fn complete_error(&mut self) {
        let delay = self.config.timing.error_delay_bytes as f64 * self.byte_period();
        self.complete_after(delay);
    }

    pub(super) fn complete_not_ready(&mut self) {
        self.log_str("Drive not ready");
        let delay = self.config.timing.not_ready_delay_bytes as f64 * self.byte_period();
        self.complete_after(delay);
    }

    pub(super) fn complete_data_done(&mut self) {
        let delay = self.config.timing.data_done_delay_bytes as f64 * self.byte_period();
        self.complete_after(delay);
    }

    fn finish_command(&mut self) {
        self.phase = ControllerPhase::Idle;
        self.set_drq(false);
        self.data_remaining = 0;
        let status = self.status_byte();
        self.log_cmd("finish_command", &format!("status: {:02X}", status));
        self.raise_irq();
    }

    pub(super) fn set_drq(&mut self, state: bool) {
        if self.drq != state {
            self.drq = state;
            self.signals.set_drq(state);
        }
    }

    pub(super) fn raise_irq(&mut self) {
        self.irq = true;
        self.signals.set_irq(true);
    }

    pub(super) fn clear_irq(&mut self) {
        if self.irq {
            self.irq = false;
            self.signals.set_irq(false);
        }
    }

    pub fn is_busy(&self) -> bool {
        self.phase != ControllerPhase::Idle
    }

    pub fn phase(&self) -> ControllerPhase {
        self.phase
    }

    pub fn irq(&self) -> bool {
        self.irq
    }

    pub fn drq(&self) -> bool {
        self.drq
    }

    /// The READY line of the selected drive.
    pub fn ready(&self) -> bool {
        self.drive_ready()
    }

    pub fn track_register(&self) -> u8 {
        self.track_register
    }

    pub fn sector_register(&self) -> u8 {
        self.sector_register
    }

    pub fn data_register(&self) -> u8 {
        self.data_register
    }

    pub fn command_type(&self) -> CommandType {
        self.command_type
    }

    pub fn density(&self) -> Density {
        self.density
    }

    pub fn chip(&self) -> ChipType {
        self.chip
    }

    pub fn config(&self) -> &FdcConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn signals(&self) -> &H {
        &self.signals
    }

    pub fn signals_mut(&mut self) -> &mut H {
        &mut self.signals
    }

    pub fn log_cmd(&mut self, func: &str, s: &str) {
        let name = self.command.map_or("None", |c| c.name());
        self.cmd_log.push(format!("{}: {}", name, s));
        log::trace!("{}(): {}", func, s);
    }

    pub fn log_str(&mut self, s: &str) {
        self.cmd_log.push(s.to_string());
        log::trace!("{}", s);
    }

    pub fn get_debug_state(&self) -> FdcDebugState {
        FdcDebugState {
            chip: self.chip,
            phase: self.phase,
            last_cmd: self
                .command
                .map_or(String::from("None"), |c| format!("{} ({:02X})", c, self.command_byte)),
            command_type: self.command_type,
            status_register: self.status_byte(),
            track_register: self.track_register,
            sector_register: self.sector_register,
            data_register: self.data_register,
            drive_select: self.drive_select,
            head_select: self.head_select,
            density: self.density,
            direction: self.direction,
            irq: self.irq,
            drq: self.drq,
            data_remaining: self.data_remaining,
            last_data_read: self.last_data_read,
            last_data_written: self.last_data_written,
            cmd_log: self.cmd_log.as_vec(),
        }
    }
}
