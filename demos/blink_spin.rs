#![no_std]
#![no_main]
#![deny(warnings)]
#![deny(unsafe_code)]

extern crate panic_halt;
extern crate stm32f1_blink as hal;

use cortex_m_rt::entry;
use hal::blink::{Blinker, Level, Span};
use hal::delay::Delay;
use hal::gpio::Speed;
use hal::prelude::*;
use hal::rcc::{Config, PLLSrc, Prescaler};
use hal::stm32;
use hal::tick::{Calibration, SpinCounter};

/// Spin iterations per half period
const TIME: u32 = 3_000_000;

#[entry]
fn main() -> ! {
    let dp = stm32::Peripherals::take().expect("cannot take peripherals");
    let mut rcc = dp.RCC.freeze(
        Config::pll(PLLSrc::HSE(8.MHz()), 9).apb1_psc(Prescaler::Div2),
    );

    let port_b = dp.GPIOB.split(&mut rcc);
    let _port_e = dp.GPIOE.split(&mut rcc);
    let led = port_b.pb5.into_push_pull_output(Speed::Mhz50);

    let delay = Delay::new(SpinCounter::new(Calibration::from_clocks(&rcc.clocks)));
    let blinker = Blinker::new(led, delay, Span::Ticks(TIME), Span::Ticks(TIME))
        .with_initial(Level::High)
        .unwrap();

    blinker.run_forever()
}
