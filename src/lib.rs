#![cfg_attr(not(test), no_std)]
#![allow(non_camel_case_types)]

extern crate void;

pub extern crate cortex_m;
pub extern crate embedded_hal as hal;
pub extern crate fugit;
pub extern crate nb;
pub extern crate stm32f1;

pub use nb::block;

#[cfg(feature = "device-selected")]
pub use stm32 as pac;

#[cfg(feature = "stm32f100")]
pub use stm32f1::stm32f100 as stm32;

#[cfg(feature = "stm32f101")]
pub use stm32f1::stm32f101 as stm32;

#[cfg(feature = "stm32f103")]
pub use stm32f1::stm32f103 as stm32;

#[cfg(all(feature = "rt", feature = "device-selected"))]
pub use crate::stm32::interrupt;

pub mod blink;
pub mod delay;
#[cfg(feature = "device-selected")]
pub mod gpio;
pub mod prelude;
#[cfg(feature = "device-selected")]
pub mod rcc;
pub mod tick;
pub mod time;

#[cfg(feature = "device-selected")]
mod sealed {
    pub trait Sealed {}
}

#[cfg(feature = "device-selected")]
pub(crate) use sealed::Sealed;
