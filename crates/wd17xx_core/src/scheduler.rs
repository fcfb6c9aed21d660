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

    scheduler.rs

    Defines the Scheduler trait used by the controller to arm one-shot delays,
    and DelayQueue, a deterministic implementation driven by the controller's
    run() method.
*/

use strum_macros::Display;

/// What a delay re-enters the controller to do when it expires.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Display)]
pub enum DelayEvent {
    /// Command start latency has elapsed. Type II and Type III commands begin here.
    CommandStart,
    /// Step rate delay has elapsed. The seek engine issues its next step.
    StepPulse,
    /// Next ID field fetch of a sector search or seek verify.
    SearchStep,
    /// One byte period has elapsed during a data transfer.
    DataRequest,
    /// Completion delay has elapsed. Busy clears and IRQ is raised.
    Complete,
}

/// A delay tagged with the controller generation that armed it. Tokens from an older
/// generation are stale and are ignored on delivery.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DelayToken {
    pub generation: u64,
    pub event: DelayEvent,
}

pub trait Scheduler {
    /// Current scheduler time in microseconds.
    fn now_us(&self) -> f64;

    /// Arm a one-shot delay that delivers `token` `delay_us` microseconds from now.
    fn arm_delay(&mut self, delay_us: f64, token: DelayToken);

    /// Drop every pending delay.
    fn cancel_all(&mut self);

    /// Time at which the earliest pending delay expires.
    fn next_due_us(&self) -> Option<f64>;

    /// Remove and return the earliest delay due at or before `until_us`, advancing the
    /// scheduler clock to its expiry time.
    fn pop_due(&mut self, until_us: f64) -> Option<DelayToken>;

    /// Advance the scheduler clock without delivering anything.
    fn advance_to(&mut self, until_us: f64);
}

#[derive(Copy, Clone, Debug)]
struct PendingDelay {
    due_us: f64,
    seq: u64,
    token: DelayToken,
}

/// A simple ordered delay queue with its own clock. Delays due at the same time are delivered
/// in the order they were armed.
#[derive(Clone, Debug, Default)]
pub struct DelayQueue {
    now_us:  f64,
    seq:     u64,
    pending: Vec<PendingDelay>,
}

impl DelayQueue {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    fn earliest(&self) -> Option<usize> {
        self.pending
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.due_us.total_cmp(&b.due_us).then(a.seq.cmp(&b.seq)))
            .map(|(i, _)| i)
    }
}

impl Scheduler for DelayQueue {
    fn now_us(&self) -> f64 {
        self.now_us
    }

    fn arm_delay(&mut self, delay_us: f64, token: DelayToken) {
        let due_us = self.now_us + delay_us.max(0.0);
        self.pending.push(PendingDelay {
            due_us,
            seq: self.seq,
            token,
        });
        self.seq += 1;
    }

    fn cancel_all(&mut self) {
        self.pending.clear();
    }

    fn next_due_us(&self) -> Option<f64> {
        self.earliest().map(|i| self.pending[i].due_us)
    }

    fn pop_due(&mut self, until_us: f64) -> Option<DelayToken> {
        let idx = self.earliest()?;
        if self.pending[idx].due_us > until_us {
            return None;
        }
        let delay = self.pending.swap_remove(idx);
        if delay.due_us > self.now_us {
            self.now_us = delay.due_us;
        }
        Some(delay.token)
    }

    fn advance_to(&mut self, until_us: f64) {
        if until_us > self.now_us {
            self.now_us = until_us;
        }
    }
}
