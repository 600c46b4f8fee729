//! Time units
pub use fugit::{
    ExtU32, HertzU32 as Hertz, MicrosDurationU32 as MicroSecond,
    MillisDurationU32 as MilliSecond, RateExtU32,
};

/// Number of ticks of a clock running at `rate` that fit into `amount`
/// units of `1 / per_sec` seconds, rounded up.
pub(crate) fn ticks_for(rate: Hertz, amount: u32, per_sec: u32) -> u64 {
    let num = u64::from(rate.raw()) * u64::from(amount);
    let den = u64::from(per_sec.max(1));
    num / den + u64::from(num % den != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_round_up() {
        // 8 MHz: one microsecond is exactly 8 ticks
        assert_eq!(ticks_for(8.MHz(), 1, 1_000_000), 8);
        // 3 Hz clock: one millisecond is a fraction of a tick
        assert_eq!(ticks_for(3.Hz(), 1, 1_000), 1);
        assert_eq!(ticks_for(3.Hz(), 0, 1_000), 0);
    }

    #[test]
    fn ticks_do_not_overflow_u32() {
        let ticks = ticks_for(72.MHz(), u32::MAX, 1_000);
        assert!(ticks > u64::from(u32::MAX));
    }
}
