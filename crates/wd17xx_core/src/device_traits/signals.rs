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

    device_traits::signals.rs

    Defines the HostSignals trait carrying the controller's IRQ and DRQ lines
    to the host machine, plus two simple implementations.
*/

/// Output lines from the controller to the host. Implementations typically forward these to
/// an interrupt controller and a DMA channel.
pub trait HostSignals {
    fn set_irq(&mut self, state: bool);
    fn set_drq(&mut self, state: bool);
}

/// Discards all signals. Useful for hosts that poll the status register.
#[derive(Default)]
pub struct NullSignals;

impl HostSignals for NullSignals {
    fn set_irq(&mut self, _state: bool) {}
    fn set_drq(&mut self, _state: bool) {}
}

/// Latches the current line states and counts rising edges.
#[derive(Clone, Debug, Default)]
pub struct SignalLatch {
    pub irq: bool,
    pub drq: bool,
    pub irq_count: usize,
    pub drq_count: usize,
}

impl SignalLatch {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn clear_counts(&mut self) {
        self.irq_count = 0;
        self.drq_count = 0;
    }
}

impl HostSignals for SignalLatch {
    fn set_irq(&mut self, state: bool) {
        if state && !self.irq {
            self.irq_count += 1;
        }
        self.irq = state;
    }

    fn set_drq(&mut self, state: bool) {
        if state && !self.drq {
            self.drq_count += 1;
        }
        self.drq = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latch_counts_rising_edges() {
        let mut latch = SignalLatch::new();
        latch.set_irq(true);
        latch.set_irq(true);
        latch.set_irq(false);
        latch.set_irq(true);
        assert_eq!(latch.irq_count, 2);

        latch.set_drq(true);
        latch.set_drq(false);
        assert_eq!(latch.drq_count, 1);
        assert!(!latch.drq);

        latch.clear_counts();
        assert_eq!(latch.irq_count, 0);
        assert!(latch.irq);
    }
}
