#![no_std]
#![no_main]
#![deny(warnings)]
#![deny(unsafe_code)]

extern crate panic_halt;
extern crate stm32f1_blink as hal;

use cortex_m_rt::entry;
use hal::block;
use hal::delay::CountDown;
use hal::gpio::Speed;
use hal::prelude::*;
use hal::rcc::{Config, PLLSrc, Prescaler};
use hal::stm32;
use hal::tick::DwtTicker;

#[entry]
fn main() -> ! {
    let dp = stm32::Peripherals::take().expect("cannot take peripherals");
    let mut cp = cortex_m::Peripherals::take().expect("cannot take core peripherals");
    let mut rcc = dp.RCC.freeze(
        Config::pll(PLLSrc::HSI_DIV2, 16).apb1_psc(Prescaler::Div2),
    );

    let port_b = dp.GPIOB.split(&mut rcc);
    let mut led = port_b.pb5.into_push_pull_output(Speed::Mhz2);

    let ticker = DwtTicker::new(cp.DWT, &mut cp.DCB, &rcc.clocks);
    let mut timer = CountDown::new(ticker);

    loop {
        timer.start(250_000.micros());
        led.toggle().unwrap();
        block!(timer.wait()).unwrap();
    }
}
