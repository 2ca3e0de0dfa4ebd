/*
 * Copyright 2018 Ian Johnson
 *
 * This is free software, distributed under the MIT license.  A copy of the
 * license can be found in the LICENSE file in the project root, or at
 * https://opensource.org/licenses/MIT.
 */

//! A basic timer, used to drive the delay and sound timers in real time.
//!
//! The interpreter never decrements its timers on its own; instead, the
//! front-end keeps one of these around and hands the elapsed ticks to
//! `Interpreter::tick_timers`, so the timers run at a fixed rate no matter
//! how many instructions are executed per second.

use time;

/// The rate at which the delay and sound timers count down, in Hz.
pub const TIMER_FREQ: u32 = 60;

/// A basic timer.
#[derive(Debug)]
pub struct Timer {
    /// Whether the timer is enabled.
    enabled: bool,
    /// The frequency at which to run the timer.
    frequency: u32,
    /// The tick count at the last lap.
    ticks: u64,
}

impl Timer {
    /// Returns a new timer running at the given frequency.
    pub fn new(frequency: u32) -> Self {
        let mut timer = Timer::new_disabled(frequency);
        timer.enabled = true;
        timer.ticks = timer.now();
        timer
    }

    /// Returns a new timer at the given frequency which is disabled.
    pub fn new_disabled(frequency: u32) -> Self {
        Timer {
            enabled: false,
            frequency,
            ticks: 0,
        }
    }

    /// Returns the number of ticks which have elapsed since the last call to
    /// this method (or the creation of the timer).
    ///
    /// If the timer is disabled, this always returns 0.
    pub fn lap(&mut self) -> u32 {
        if self.enabled {
            let now = self.now();
            let ticks = now.saturating_sub(self.ticks);
            self.ticks = now;
            ticks as u32
        } else {
            0
        }
    }

    /// Returns the current absolute tick count.
    fn now(&self) -> u64 {
        (time::precise_time_ns() as f64 * self.frequency as f64 / 1e9) as u64
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn disabled_never_ticks() {
        let mut timer = Timer::new_disabled(TIMER_FREQ);
        thread::sleep(Duration::from_millis(40));
        assert_eq!(timer.lap(), 0);
    }

    #[test]
    fn lap_counts_elapsed_ticks() {
        let mut timer = Timer::new(1000);
        thread::sleep(Duration::from_millis(50));
        let ticks = timer.lap();
        assert!(ticks >= 40, "only {} ticks elapsed", ticks);
        // The lap resets the count.
        assert!(timer.lap() < ticks);
    }
}
