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

    devices::fdc::seek.rs

    Type I commands: Restore, Seek, Step, Step In and Step Out.
*/

use super::{
    command::{Command, StepFlags},
    controller::{ControllerPhase, FloppyController, SearchPurpose, SeekState, HEAD_LOAD_EDGES},
};
use crate::{
    device_traits::signals::HostSignals,
    device_types::fdc::StepDirection,
    scheduler::{DelayEvent, Scheduler},
};

impl<S: Scheduler, H: HostSignals> FloppyController<S, H> {
    pub(super) fn begin_type1(&mut self, command: Command, flags: StepFlags) {
        self.set_drq(false);
        self.data_remaining = 0;

        // Bit 3 clear requests a head load.
        if !flags.no_head_load() {
            self.status.head_loaded = true;
            self.hld_count = HEAD_LOAD_EDGES;
        }

        self.seek = SeekState {
            restoring: false,
            target: self.track_register,
            steps: 0,
            rate: flags.rate(),
            verify: flags.verify(),
        };
        self.phase = ControllerPhase::Seeking;

        match command {
            Command::Restore(_) => {
                self.seek.restoring = true;
                self.log_cmd("begin_type1", &format!("restore from track {}", self.track_register));
                self.seek_step();
            }
            Command::Seek(_) => {
                self.seek.target = self.data_register;
                self.log_cmd(
                    "begin_type1",
                    &format!("seek from track {} to {}", self.track_register, self.data_register),
                );
                self.seek_step();
            }
            Command::Step(_) => self.single_step(self.direction, flags.update()),
            Command::StepIn(_) => self.single_step(StepDirection::In, flags.update()),
            Command::StepOut(_) => self.single_step(StepDirection::Out, flags.update()),
            _ => {
                log::error!("begin_type1(): {} is not a Type I command", command);
                self.phase = ControllerPhase::Idle;
            }
        }
    }

    fn step_drive(&mut self, direction: StepDirection) {
        self.direction = direction;
        if let Some(drive) = self.drive_mut() {
            drive.step(direction);
        }
    }

    fn single_step(&mut self, direction: StepDirection, update: bool) {
        self.step_drive(direction);
        if update {
            self.track_register = match direction {
                StepDirection::In => self.track_register.wrapping_add(1),
                StepDirection::Out => self.track_register.wrapping_sub(1),
            };
        }
        self.log_cmd(
            "single_step",
            &format!("direction: {} track register: {}", direction, self.track_register),
        );
        self.end_head_movement();
    }

    /// Issue the next step of a Restore or Seek, or finish if the head has arrived.
    pub(super) fn seek_step(&mut self) {
        let step_delay = self.config.timing.step_rate_us(self.seek.rate);

        if self.seek.restoring {
            let at_track0 = self.drive().is_some_and(|d| d.at_track0());
            if at_track0 {
                self.track_register = 0;
                self.log_cmd("seek_step", &format!("track 0 reached after {} steps", self.seek.steps));
                return self.end_head_movement();
            }
            if self.seek.steps >= self.config.timing.restore_step_limit {
                self.track_register = 0;
                self.status.seek_error = true;
                self.log_cmd(
                    "seek_step",
                    &format!("track 0 not found after {} steps", self.seek.steps),
                );
                return self.end_head_movement();
            }
            self.step_drive(StepDirection::Out);
            self.seek.steps += 1;
            self.arm(DelayEvent::StepPulse, step_delay);
            return;
        }

        if self.track_register == self.seek.target {
            return self.end_head_movement();
        }

        if self.seek.target > self.track_register {
            self.step_drive(StepDirection::In);
            self.track_register += 1;
        }
        else {
            self.step_drive(StepDirection::Out);
            self.track_register -= 1;
        }
        self.seek.steps += 1;
        self.arm(DelayEvent::StepPulse, step_delay);
    }

    /// Movement is done. Verify the track if requested, otherwise complete.
    fn end_head_movement(&mut self) {
        if self.seek.verify {
            self.status.head_loaded = true;
            self.hld_count = HEAD_LOAD_EDGES;
            self.start_search(SearchPurpose::Verify);
        }
        else {
            self.complete_after(self.config.timing.type1_complete_us);
        }
    }

    /// Look for an ID field whose cylinder matches the track register.
    pub(super) fn verify_step(&mut self) {
        if let Some(id) = self.fetch_id() {
            if id.cylinder == self.track_register {
                self.log_cmd("verify_step", &format!("verified track {} with {}", self.track_register, id));
                return self.complete_after(self.config.timing.type1_complete_us);
            }
        }
        self.continue_search();
    }
}
