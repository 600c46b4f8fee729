//! LED blink loop
//!
//! A [`Blinker`] drives one output pin LOW, waits, drives it HIGH, waits, and
//! repeats. Every transition is a single pin write and the level strictly
//! alternates. Firmware runs it with [`Blinker::run_forever`]; anything that
//! needs to stop the loop passes a [`Cancel`] signal to [`Blinker::run`],
//! which is polled between cycles.
use core::sync::atomic::{AtomicBool, Ordering};

use crate::delay::Delay;
use crate::hal::digital::v2::OutputPin;
use crate::tick::Ticker;

/// Logic level driven onto the pin
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    Low,
    High,
}

impl Level {
    /// The other level
    pub fn toggled(self) -> Self {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// Time spent at one level
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Span {
    /// Raw ticks of the delay's tick source
    Ticks(u32),
    Micros(u32),
    Millis(u32),
}

impl<T: Ticker> Delay<T> {
    /// Blocks for `span`
    pub fn pause(&mut self, span: Span) {
        match span {
            Span::Ticks(ticks) => self.delay_ticks(ticks),
            Span::Micros(us) => self.delay_us(us),
            Span::Millis(ms) => self.delay_ms(ms),
        }
    }
}

/// Request to stop the blink loop
pub trait Cancel {
    /// Polled once before every cycle
    fn is_cancelled(&mut self) -> bool;
}

/// Signal that never fires
#[derive(Clone, Copy, Debug, Default)]
pub struct Never;

impl Cancel for Never {
    #[inline(always)]
    fn is_cancelled(&mut self) -> bool {
        false
    }
}

/// Fires after the given number of cycles have been started
#[derive(Clone, Copy, Debug)]
pub struct Cycles(pub u32);

impl Cancel for Cycles {
    fn is_cancelled(&mut self) -> bool {
        match self.0.checked_sub(1) {
            Some(left) => {
                self.0 = left;
                false
            }
            None => true,
        }
    }
}

impl Cancel for AtomicBool {
    fn is_cancelled(&mut self) -> bool {
        *self.get_mut()
    }
}

impl Cancel for &AtomicBool {
    fn is_cancelled(&mut self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

impl<C: Cancel + ?Sized> Cancel for &mut C {
    fn is_cancelled(&mut self) -> bool {
        (**self).is_cancelled()
    }
}

/// Square wave generator on one output pin
pub struct Blinker<PIN, T> {
    pin: PIN,
    delay: Delay<T>,
    low: Span,
    high: Span,
    level: Option<Level>,
}

impl<PIN, T> Blinker<PIN, T>
where
    PIN: OutputPin,
    T: Ticker,
{
    /// Each cycle holds the pin LOW for `low`, then HIGH for `high`
    pub fn new(pin: PIN, delay: Delay<T>, low: Span, high: Span) -> Self {
        Blinker {
            pin,
            delay,
            low,
            high,
            level: None,
        }
    }

    /// Drives `level` before the first cycle starts
    pub fn with_initial(mut self, level: Level) -> Result<Self, PIN::Error> {
        self.write(level)?;
        Ok(self)
    }

    /// Last level written, `None` before the first write
    pub fn level(&self) -> Option<Level> {
        self.level
    }

    /// Runs whole cycles until `cancel` fires and returns how many completed
    pub fn run<C: Cancel>(&mut self, mut cancel: C) -> Result<u32, PIN::Error> {
        let mut cycles: u32 = 0;
        while !cancel.is_cancelled() {
            self.cycle()?;
            cycles = cycles.wrapping_add(1);
        }
        #[cfg(feature = "defmt")]
        defmt::debug!("blink cancelled after {} cycles", cycles);
        Ok(cycles)
    }

    /// Blinks until reset
    ///
    /// Pin errors are discarded, so this is meant for pins whose error type is
    /// `Infallible`.
    pub fn run_forever(mut self) -> ! {
        loop {
            self.cycle().ok();
        }
    }

    /// One LOW/HIGH cycle
    pub fn cycle(&mut self) -> Result<(), PIN::Error> {
        self.write(Level::Low)?;
        self.delay.pause(self.low);
        self.write(Level::High)?;
        self.delay.pause(self.high);
        Ok(())
    }

    fn write(&mut self, level: Level) -> Result<(), PIN::Error> {
        match level {
            Level::Low => self.pin.set_low()?,
            Level::High => self.pin.set_high()?,
        }
        #[cfg(feature = "defmt")]
        defmt::trace!("pin -> {}", level);
        self.level = Some(level);
        Ok(())
    }

    /// Releases the pin and the delay
    pub fn release(self) -> (PIN, Delay<T>) {
        (self.pin, self.delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::{Hertz, RateExtU32};
    use core::convert::Infallible;

    struct Counter {
        now: u32,
    }

    impl Ticker for Counter {
        fn rate(&self) -> Hertz {
            1.kHz()
        }

        fn now(&mut self) -> u32 {
            self.now += 1;
            self.now
        }
    }

    #[derive(Default)]
    struct Recorder {
        writes: Vec<Level>,
    }

    impl OutputPin for Recorder {
        type Error = Infallible;

        fn set_low(&mut self) -> Result<(), Infallible> {
            self.writes.push(Level::Low);
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.writes.push(Level::High);
            Ok(())
        }
    }

    fn blinker(low: Span, high: Span) -> Blinker<Recorder, Counter> {
        Blinker::new(Recorder::default(), Delay::new(Counter { now: 0 }), low, high)
    }

    #[test]
    fn level_toggles() {
        assert_eq!(Level::Low.toggled(), Level::High);
        assert_eq!(Level::High.toggled(), Level::Low);
        assert_eq!(Level::from(true), Level::High);
    }

    #[test]
    fn cycles_signal_counts_down() {
        let mut c = Cycles(2);
        assert!(!c.is_cancelled());
        assert!(!c.is_cancelled());
        assert!(c.is_cancelled());
        assert!(c.is_cancelled());
    }

    #[test]
    fn cancelled_before_start_writes_nothing() {
        let mut b = blinker(Span::Ticks(1), Span::Ticks(1));
        assert_eq!(b.run(Cycles(0)), Ok(0));
        assert_eq!(b.level(), None);
        assert!(b.release().0.writes.is_empty());
    }

    #[test]
    fn initial_level_is_written_first() {
        let mut b = blinker(Span::Ticks(3), Span::Ticks(3))
            .with_initial(Level::High)
            .unwrap();
        assert_eq!(b.level(), Some(Level::High));
        b.run(Cycles(1)).unwrap();
        let (pin, _) = b.release();
        assert_eq!(pin.writes, [Level::High, Level::Low, Level::High]);
    }

    #[test]
    fn flag_stops_the_loop() {
        let stop = AtomicBool::new(true);
        let mut b = blinker(Span::Millis(1), Span::Millis(1));
        assert_eq!(b.run(&stop), Ok(0));

        stop.store(false, Ordering::Relaxed);
        let mut polls = Cycles(3);
        let mut both = Both(&stop, &mut polls);
        assert_eq!(b.run(&mut both), Ok(3));
    }

    struct Both<'a>(&'a AtomicBool, &'a mut Cycles);

    impl Cancel for Both<'_> {
        fn is_cancelled(&mut self) -> bool {
            let mut flag = self.0;
            flag.is_cancelled() || self.1.is_cancelled()
        }
    }

    #[test]
    fn owned_flag_cancels() {
        let mut stop = AtomicBool::new(false);
        assert!(!stop.is_cancelled());
        stop.store(true, Ordering::Relaxed);
        assert!(stop.is_cancelled());

        let mut b = blinker(Span::Ticks(1), Span::Ticks(1));
        assert_eq!(b.run(stop), Ok(0));
        assert_eq!(b.run(AtomicBool::new(true)), Ok(0));
    }

    #[test]
    fn tick_spans_longer_than_half_the_counter_finish() {
        struct Coarse {
            now: u32,
            advanced: u64,
        }

        impl Ticker for Coarse {
            fn rate(&self) -> Hertz {
                72.MHz()
            }

            fn now(&mut self) -> u32 {
                self.now = self.now.wrapping_add(1 << 24);
                self.advanced += 1 << 24;
                assert!(self.advanced < 4u64 << 32, "still spinning after 4 counter laps");
                self.now
            }
        }

        let mut delay = Delay::new(Coarse { now: 0, advanced: 0 });
        delay.pause(Span::Ticks(u32::MAX - 1));
        let advanced = delay.release().advanced;
        assert!(advanced >= u64::from(u32::MAX - 1));
        assert!(advanced < 2 * u64::from(u32::MAX));
    }

    #[test]
    fn spans_use_their_units() {
        let mut delay = Delay::new(Counter { now: 0 });
        delay.pause(Span::Millis(2));
        delay.pause(Span::Micros(1_000));
        delay.pause(Span::Ticks(5));
        // start mark plus elapsed ticks for each pause at 1 kHz
        assert_eq!(delay.release().now, (1 + 2) + (1 + 1) + (1 + 5));
    }
}
