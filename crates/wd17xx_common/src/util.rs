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

   ---------------------------------------------------------------------------

   common::util.rs

   Define utility methods.
*/

/// Format a span of emulated time, given in microseconds, using the most appropriate unit for
/// its magnitude. Used when logging armed controller delays.
pub fn format_us(us: f64) -> String {
    if us < 1.0 {
        format!("{:.0}ns", us * 1_000.0)
    }
    else if us < 1_000.0 {
        format!("{:.3}µs", us)
    }
    else if us < 1_000_000.0 {
        format!("{:.3}ms", us / 1_000.0)
    }
    else {
        format!("{:.3}s", us / 1_000_000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_us_picks_unit() {
        assert_eq!(format_us(0.5), "500ns");
        assert_eq!(format_us(32.0), "32.000µs");
        assert_eq!(format_us(6_000.0), "6.000ms");
        assert_eq!(format_us(2_500_000.0), "2.500s");
    }
}
