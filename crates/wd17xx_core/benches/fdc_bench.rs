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

    benches::fdc_bench.rs

    Benchmarks for the floppy disk controller.

*/

use wd17xx_core::{
    bus::IoDevice,
    devices::fdc::crc::crc16,
    FloppyController,
    FloppyMedia,
    MemoryFloppyDrive,
    Scheduler,
};

use criterion::{black_box, criterion_group, criterion_main, Criterion};

const STATUS: usize = 0;
const SECTOR: usize = 2;
const DATA: usize = 3;

fn new_fdc() -> FloppyController {
    let media = FloppyMedia::formatted(80, 2, 9, 1, 2, 0xE5, true).into_arc();
    let mut fdc = FloppyController::default();
    if let Err(e) = fdc.attach_drive(0, Box::new(MemoryFloppyDrive::with_media(0, media, false))) {
        panic!("attach_drive failed: {}", e);
    }
    fdc
}

/// Issue a command and service every DRQ until the controller is idle.
fn run_read(fdc: &mut FloppyController, command: u8) -> usize {
    let mut bytes = 0;
    fdc.write_register(STATUS, command);
    while fdc.is_busy() {
        if fdc.drq() {
            black_box(fdc.read_register(DATA));
            bytes += 1;
        }
        else {
            let now = fdc.scheduler().now_us();
            let next = fdc.scheduler().next_due_us().unwrap_or(now + 1000.0);
            fdc.run(next - now);
        }
    }
    bytes
}

pub fn fdc_bench(c: &mut Criterion) {
    c.bench_function("fdc_bench_read_sector", |b| {
        let mut fdc = new_fdc();

        b.iter(|| {
            fdc.write_register(SECTOR, 5);
            black_box(run_read(&mut fdc, 0x80));
        });
    });

    c.bench_function("fdc_bench_read_track", |b| {
        let mut fdc = new_fdc();

        b.iter(|| {
            black_box(run_read(&mut fdc, 0xE0));
        });
    });

    c.bench_function("fdc_bench_seek_restore", |b| {
        let mut fdc = new_fdc();

        b.iter(|| {
            fdc.write_register(DATA, 79);
            run_read(&mut fdc, 0x10);
            run_read(&mut fdc, 0x00);
        });
    });

    c.bench_function("fdc_bench_status_port", |b| {
        let mut fdc = new_fdc();
        let base = fdc.config().io_base;

        b.iter(|| {
            black_box(fdc.read_u8(base, wd17xx_core::bus::NULL_DELTA_US));
        });
    });

    c.bench_function("fdc_bench_crc16_sector", |b| {
        let data = vec![0xE5u8; 512];

        b.iter(|| {
            black_box(crc16(black_box(&data)));
        });
    });
}

criterion_group!(benches, fdc_bench);
criterion_main!(benches);
