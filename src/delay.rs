//! Busy-wait delays
//!
//! [`Delay`] blocks the caller by spinning on a [`Ticker`] until the requested
//! number of ticks has elapsed. With a [`SpinCounter`](crate::tick::SpinCounter)
//! this is a calibrated counting loop; with a
//! [`DwtTicker`](crate::tick::DwtTicker) it follows the core cycle counter.
//!
//! Delays never fail and have no upper bound: requests longer than the
//! ticker can represent are served as several consecutive waits.
use crate::hal::blocking::delay::{DelayMs, DelayUs};
use crate::hal::timer;
use crate::tick::Ticker;
use crate::time::{self, Hertz, MicroSecond};
use void::Void;

/// Longest single wait, in ticks. Half the counter range so that a late
/// poll still observes the deadline before the counter laps.
const MAX_CHUNK: u32 = u32::MAX / 2;

/// Blocking delay driven by a tick source
pub struct Delay<T> {
    ticker: T,
}

impl<T: Ticker> Delay<T> {
    pub fn new(ticker: T) -> Self {
        Delay { ticker }
    }

    /// Tick rate of the underlying source
    pub fn rate(&self) -> Hertz {
        self.ticker.rate()
    }

    /// Spins for `ticks` ticks of the underlying source
    ///
    /// `delay_ticks(0)` returns without touching the ticker.
    pub fn delay_ticks(&mut self, ticks: u32) {
        self.wait(u64::from(ticks));
    }

    /// Blocks for at least `us` microseconds
    pub fn delay_us(&mut self, us: u32) {
        let ticks = time::ticks_for(self.rate(), us, 1_000_000);
        self.wait(ticks);
    }

    /// Blocks for at least `ms` milliseconds
    pub fn delay_ms(&mut self, ms: u32) {
        let ticks = time::ticks_for(self.rate(), ms, 1_000);
        self.wait(ticks);
    }

    fn wait(&mut self, mut ticks: u64) {
        while ticks > 0 {
            let chunk = ticks.min(u64::from(MAX_CHUNK)) as u32;
            self.spin(chunk);
            ticks -= u64::from(chunk);
        }
    }

    // `ticks` must not exceed `MAX_CHUNK`
    fn spin(&mut self, ticks: u32) {
        let start = self.ticker.now();
        while self.ticker.elapsed(start) < ticks {}
    }

    /// Releases the tick source
    pub fn release(self) -> T {
        self.ticker
    }
}

impl<T: Ticker> DelayUs<u32> for Delay<T> {
    fn delay_us(&mut self, us: u32) {
        Delay::delay_us(self, us)
    }
}

impl<T: Ticker> DelayUs<u16> for Delay<T> {
    fn delay_us(&mut self, us: u16) {
        Delay::delay_us(self, u32::from(us))
    }
}

impl<T: Ticker> DelayUs<u8> for Delay<T> {
    fn delay_us(&mut self, us: u8) {
        Delay::delay_us(self, u32::from(us))
    }
}

impl<T: Ticker> DelayMs<u32> for Delay<T> {
    fn delay_ms(&mut self, ms: u32) {
        Delay::delay_ms(self, ms)
    }
}

impl<T: Ticker> DelayMs<u16> for Delay<T> {
    fn delay_ms(&mut self, ms: u16) {
        Delay::delay_ms(self, u32::from(ms))
    }
}

impl<T: Ticker> DelayMs<u8> for Delay<T> {
    fn delay_ms(&mut self, ms: u8) {
        Delay::delay_ms(self, u32::from(ms))
    }
}

/// Non-blocking count down over a tick source
///
/// Every call to `wait` reads the ticker once and reports
/// `WouldBlock` until the started duration has passed. An expired count
/// down keeps returning `Ok` until it is started again.
pub struct CountDown<T> {
    ticker: T,
    start: u32,
    remaining: u64,
}

impl<T: Ticker> CountDown<T> {
    pub fn new(ticker: T) -> Self {
        CountDown {
            ticker,
            start: 0,
            remaining: 0,
        }
    }

    /// Releases the tick source
    pub fn release(self) -> T {
        self.ticker
    }
}

impl<T: Ticker> timer::CountDown for CountDown<T> {
    type Time = MicroSecond;

    fn start<D>(&mut self, count: D)
    where
        D: Into<MicroSecond>,
    {
        let us = count.into().ticks();
        self.remaining = time::ticks_for(self.ticker.rate(), us, 1_000_000);
        self.start = self.ticker.now();
    }

    fn wait(&mut self) -> nb::Result<(), Void> {
        if self.remaining == 0 {
            return Ok(());
        }
        let chunk = self.remaining.min(u64::from(MAX_CHUNK)) as u32;
        if self.ticker.elapsed(self.start) < chunk {
            return Err(nb::Error::WouldBlock);
        }
        self.remaining -= u64::from(chunk);
        self.start = self.start.wrapping_add(chunk);
        if self.remaining == 0 {
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::timer::CountDown as _;
    use crate::time::{ExtU32, RateExtU32};

    /// Advances by `step` ticks on every read and counts the reads
    struct Stepper {
        rate: Hertz,
        now: u32,
        step: u32,
        reads: u64,
        advanced: u64,
    }

    impl Stepper {
        fn new(rate: Hertz) -> Self {
            Stepper {
                rate,
                now: 0,
                step: 1,
                reads: 0,
                advanced: 0,
            }
        }
    }

    impl Ticker for Stepper {
        fn rate(&self) -> Hertz {
            self.rate
        }

        fn now(&mut self) -> u32 {
            self.now = self.now.wrapping_add(self.step);
            self.reads += 1;
            self.advanced += u64::from(self.step);
            assert!(
                self.advanced < 8u64 << 32,
                "still spinning after 8 counter laps"
            );
            self.now
        }
    }

    fn reads_at(rate: Hertz, f: impl FnOnce(&mut Delay<Stepper>)) -> u64 {
        let mut delay = Delay::new(Stepper::new(rate));
        f(&mut delay);
        delay.release().reads
    }

    fn reads_for(f: impl FnOnce(&mut Delay<Stepper>)) -> u64 {
        reads_at(1.MHz(), f)
    }

    #[test]
    fn zero_delay_does_not_spin() {
        assert_eq!(reads_for(|d| d.delay_ticks(0)), 0);
        assert_eq!(reads_for(|d| d.delay_us(0)), 0);
        assert_eq!(reads_for(|d| d.delay_ms(0)), 0);
    }

    #[test]
    fn ticks_are_counted_exactly() {
        // one read for the start mark, then one per elapsed tick
        assert_eq!(reads_for(|d| d.delay_ticks(1)), 2);
        assert_eq!(reads_for(|d| d.delay_ticks(3_000)), 3_001);
    }

    #[test]
    fn delay_is_monotonic() {
        let mut last = 0;
        for ticks in [0, 1, 2, 10, 999, 1_000, 65_536] {
            let reads = reads_for(|d| d.delay_ticks(ticks));
            assert!(reads >= last, "{} ticks took {} reads", ticks, reads);
            last = reads;
        }

        let mut last = 0;
        for us in [0, 1, 7, 100, 2_500] {
            let reads = reads_for(|d| d.delay_us(us));
            assert!(reads >= last);
            last = reads;
        }
    }

    #[test]
    fn units_follow_the_tick_rate() {
        // 1 MHz: a microsecond is one tick
        assert_eq!(reads_for(|d| d.delay_us(250)), 251);
        assert_eq!(reads_for(|d| d.delay_ms(2)), 2_001);
    }

    #[test]
    fn millis_are_a_thousand_micros() {
        for n in [5, 20, 100] {
            let ms = reads_at(8.MHz(), |d| d.delay_ms(n)) as f64;
            let us = reads_at(8.MHz(), |d| d.delay_us(n)) as f64;
            let ratio = ms / us;
            assert!((900.0..=1_100.0).contains(&ratio), "n = {}: {}", n, ratio);
        }
    }

    #[test]
    fn deadline_survives_counter_wrap() {
        let mut delay = Delay::new(Stepper {
            now: u32::MAX - 10,
            ..Stepper::new(1.MHz())
        });
        delay.delay_ticks(100);
        assert_eq!(delay.release().reads, 101);
    }

    #[test]
    fn long_waits_are_split() {
        let mut delay = Delay::new(Stepper {
            step: 1 << 24,
            ..Stepper::new(1.MHz())
        });
        delay.wait(u64::from(MAX_CHUNK) * 3);
        let ticker = delay.release();
        assert!(ticker.advanced >= u64::from(MAX_CHUNK) * 3);
        // a single chunk would have given up after one lap of the counter
        assert!(ticker.advanced > u64::from(u32::MAX));
    }

    #[test]
    fn coarse_ticks_near_the_counter_range_finish() {
        let mut delay = Delay::new(Stepper {
            step: 1 << 24,
            ..Stepper::new(72.MHz())
        });
        delay.delay_ticks(u32::MAX - 1);
        let advanced = delay.release().advanced;
        assert!(advanced >= u64::from(u32::MAX - 1));
        assert!(advanced < 2 * u64::from(u32::MAX));
    }

    #[test]
    fn embedded_hal_delays_match_inherent_ones() {
        let via_trait = reads_for(|d| DelayMs::<u16>::delay_ms(d, 3));
        let inherent = reads_for(|d| d.delay_ms(3));
        assert_eq!(via_trait, inherent);

        let via_trait = reads_for(|d| DelayUs::<u8>::delay_us(d, 40));
        assert_eq!(via_trait, 41);
    }

    #[test]
    fn count_down_blocks_until_expired() {
        let mut timer = CountDown::new(Stepper::new(1.MHz()));
        timer.start(5.micros());

        let mut polls = 0;
        while let Err(nb::Error::WouldBlock) = timer.wait() {
            polls += 1;
        }
        assert_eq!(polls, 4);
        assert!(timer.wait().is_ok());
    }

    #[test]
    fn count_down_rearms_for_long_periods() {
        let mut timer = CountDown::new(Stepper {
            step: 1 << 24,
            ..Stepper::new(1.MHz())
        });
        // u32::MAX ticks at 1 MHz: two full chunks and one tick
        timer.start(u32::MAX.micros());

        let mut polls = 0;
        while let Err(nb::Error::WouldBlock) = timer.wait() {
            polls += 1;
        }
        // 128 reads cover a chunk at this step
        assert_eq!(polls, 256);
        assert!(timer.wait().is_ok());

        let ticker = timer.release();
        assert!(ticker.advanced >= u64::from(u32::MAX));
    }

    #[test]
    fn count_down_restarts() {
        let mut timer = CountDown::new(Stepper::new(1.MHz()));
        timer.start(0.micros());
        assert!(timer.wait().is_ok());

        timer.start(2.micros());
        assert!(timer.wait().is_err());
        assert!(timer.wait().is_ok());
    }
}
