//! Tick sources for busy-wait delays
//!
//! A [`Ticker`] reports a free-running, wrapping tick count together with
//! the rate at which it advances. [`Delay`](crate::delay::Delay) spins on a
//! ticker until enough ticks have gone by, so the delay itself never needs to
//! know how a tick is produced.
use crate::time::{Hertz, RateExtU32};

#[cfg(feature = "device-selected")]
use crate::rcc::Clocks;

/// Core cycles spent in one iteration of the spin loop
///
/// One `nop`, the counter increment, the compare and the branch. This is an
/// empirical figure for thumbv7m code built in release mode; measure it for
/// your board and pass a [`Calibration`] of your own if it is off.
pub const DEFAULT_CYCLES_PER_SPIN: u32 = 4;

/// Free-running tick counter
pub trait Ticker {
    /// Rate at which [`now`](Ticker::now) advances
    fn rate(&self) -> Hertz;

    /// Current tick count. Wraps around at `u32::MAX`.
    fn now(&mut self) -> u32;

    /// Ticks elapsed since `since`, tolerant of a single wrap-around
    #[inline(always)]
    fn elapsed(&mut self, since: u32) -> u32 {
        self.now().wrapping_sub(since)
    }
}

impl<T: Ticker + ?Sized> Ticker for &mut T {
    #[inline(always)]
    fn rate(&self) -> Hertz {
        (**self).rate()
    }

    #[inline(always)]
    fn now(&mut self) -> u32 {
        (**self).now()
    }
}

/// Mapping between the core clock and spin iterations
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
    core_clk: Hertz,
    cycles_per_spin: u32,
}

impl Calibration {
    /// `cycles_per_spin` of zero is treated as one
    pub const fn new(core_clk: Hertz, cycles_per_spin: u32) -> Self {
        let cycles_per_spin = if cycles_per_spin == 0 {
            1
        } else {
            cycles_per_spin
        };
        Calibration {
            core_clk,
            cycles_per_spin,
        }
    }

    /// Calibration for the frozen system clock with [`DEFAULT_CYCLES_PER_SPIN`]
    #[cfg(feature = "device-selected")]
    pub fn from_clocks(clocks: &Clocks) -> Self {
        Calibration::new(clocks.sys_clk, DEFAULT_CYCLES_PER_SPIN)
    }

    pub fn core_clk(&self) -> Hertz {
        self.core_clk
    }

    pub fn cycles_per_spin(&self) -> u32 {
        self.cycles_per_spin
    }

    /// Spin iterations per second
    pub fn spin_rate(&self) -> Hertz {
        (self.core_clk.raw() / self.cycles_per_spin).max(1).Hz()
    }
}

/// Ticker that advances by executing the spin loop
///
/// Every call to [`now`](Ticker::now) burns one loop iteration and counts it,
/// so spinning until `n` ticks have elapsed is exactly a counting loop from
/// zero to `n`.
pub struct SpinCounter {
    calibration: Calibration,
    count: u32,
}

impl SpinCounter {
    pub fn new(calibration: Calibration) -> Self {
        SpinCounter {
            calibration,
            count: 0,
        }
    }

    pub fn calibration(&self) -> Calibration {
        self.calibration
    }
}

impl Ticker for SpinCounter {
    fn rate(&self) -> Hertz {
        self.calibration.spin_rate()
    }

    #[inline(always)]
    fn now(&mut self) -> u32 {
        spin_once();
        self.count = self.count.wrapping_add(1);
        self.count
    }
}

#[cfg(all(target_arch = "arm", target_os = "none"))]
#[inline(always)]
fn spin_once() {
    cortex_m::asm::nop();
}

#[cfg(not(all(target_arch = "arm", target_os = "none")))]
#[inline(always)]
fn spin_once() {
    core::hint::black_box(());
}

#[cfg(feature = "device-selected")]
pub use dwt::DwtTicker;

#[cfg(feature = "device-selected")]
mod dwt {
    use super::Ticker;
    use crate::rcc::Clocks;
    use crate::time::Hertz;
    use cortex_m::peripheral::{DCB, DWT};

    /// Ticker backed by the DWT cycle counter
    pub struct DwtTicker {
        dwt: DWT,
        core_clk: Hertz,
    }

    impl DwtTicker {
        /// Enables tracing and starts the cycle counter
        pub fn new(mut dwt: DWT, dcb: &mut DCB, clocks: &Clocks) -> Self {
            dcb.enable_trace();
            dwt.enable_cycle_counter();
            DwtTicker {
                dwt,
                core_clk: clocks.sys_clk,
            }
        }

        /// Releases the DWT peripheral. The cycle counter keeps running.
        pub fn release(self) -> DWT {
            self.dwt
        }
    }

    impl Ticker for DwtTicker {
        fn rate(&self) -> Hertz {
            self.core_clk
        }

        #[inline(always)]
        fn now(&mut self) -> u32 {
            DWT::cycle_count()
        }
    }
}
