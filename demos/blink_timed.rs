#![no_std]
#![no_main]
#![deny(warnings)]
#![deny(unsafe_code)]

extern crate panic_halt;
extern crate stm32f1_blink as hal;

use cortex_m_rt::entry;
use hal::blink::{Blinker, Span};
use hal::delay::Delay;
use hal::gpio::Speed;
use hal::prelude::*;
use hal::rcc::Config;
use hal::stm32;
use hal::tick::{Calibration, SpinCounter, DEFAULT_CYCLES_PER_SPIN};

#[entry]
fn main() -> ! {
    let dp = stm32::Peripherals::take().expect("cannot take peripherals");
    let mut rcc = dp.RCC.freeze(Config::hse(8.MHz()));

    let port_b = dp.GPIOB.split(&mut rcc);
    let led = port_b.pb5.into_push_pull_output(Speed::Mhz2);

    let calibration = Calibration::new(rcc.clocks.sys_clk, DEFAULT_CYCLES_PER_SPIN);
    let delay = Delay::new(SpinCounter::new(calibration));

    // LED wired active-low: lit for 900 ms, dark for 100 ms
    Blinker::new(led, delay, Span::Millis(900), Span::Micros(100_000)).run_forever()
}
