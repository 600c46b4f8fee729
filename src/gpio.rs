//! General Purpose Input / Output
use core::convert::Infallible;
use core::marker::PhantomData;

use crate::hal::digital::v2::{OutputPin, StatefulOutputPin, ToggleableOutputPin};
use crate::rcc::Rcc;
use crate::stm32::gpioa::RegisterBlock;

/// Extension trait to split a GPIO peripheral in independent pins and registers
pub trait GpioExt {
    /// The parts to split the GPIO into
    type Parts;

    /// Enables the port clock and splits the GPIO block into independent pins
    fn split(self, rcc: &mut Rcc) -> Self::Parts;
}

/// Floating input (reset state)
pub struct Input;

/// Output mode (type state)
pub struct Output<MODE> {
    _mode: PhantomData<MODE>,
}

/// Push pull output (type state)
pub struct PushPull;

/// Output drive strength, encoded as the `MODE` bits of `CRL`/`CRH`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Speed {
    Mhz10 = 0b01,
    Mhz2 = 0b10,
    Mhz50 = 0b11,
}

const FLOATING_INPUT: u32 = 0b0100;

/// Register and bit offset of the 4-bit configuration field of pin `n`
#[inline(always)]
const fn cr_field(n: u8) -> (bool, u32) {
    (n >= 8, (n as u32 % 8) * 4)
}

/// `CNF`/`MODE` nibble for a push pull output
#[inline(always)]
const fn push_pull_bits(speed: Speed) -> u32 {
    speed as u32
}

/// Generic pin
pub struct Pin<const P: char, const N: u8, MODE = Input> {
    _mode: PhantomData<MODE>,
}

impl<const P: char, const N: u8, MODE> Pin<P, N, MODE> {
    const fn new() -> Self {
        Pin { _mode: PhantomData }
    }

    /// Configures the pin to operate as a push pull output pin
    pub fn into_push_pull_output(self, speed: Speed) -> Pin<P, N, Output<PushPull>> {
        self.configure(push_pull_bits(speed));
        Pin::new()
    }

    /// Configures the pin to operate as a floating input pin
    pub fn into_floating_input(self) -> Pin<P, N, Input> {
        self.configure(FLOATING_INPUT);
        Pin::new()
    }

    fn configure(&self, bits: u32) {
        let (high, offset) = cr_field(N);
        let gpio = unsafe { &(*gpiox::<P>()) };
        let mask = !(0b1111 << offset);
        if high {
            gpio.crh
                .modify(|r, w| unsafe { w.bits((r.bits() & mask) | (bits << offset)) });
        } else {
            gpio.crl
                .modify(|r, w| unsafe { w.bits((r.bits() & mask) | (bits << offset)) });
        }
    }

    /// Port letter and pin number
    pub const fn id(&self) -> (char, u8) {
        (P, N)
    }
}

impl<const P: char, const N: u8> Pin<P, N, Output<PushPull>> {
    #[inline(always)]
    fn set_state(&mut self, high: bool) {
        let gpio = unsafe { &(*gpiox::<P>()) };
        // BSRR writes are atomic: set bits are 0..16, reset bits 16..32
        let bit = if high { N } else { N + 16 };
        gpio.bsrr.write(|w| unsafe { w.bits(1 << bit) });
    }

    #[inline(always)]
    fn is_output_high(&self) -> bool {
        let gpio = unsafe { &(*gpiox::<P>()) };
        gpio.odr.read().bits() & (1 << N) != 0
    }
}

impl<const P: char, const N: u8> OutputPin for Pin<P, N, Output<PushPull>> {
    type Error = Infallible;

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set_state(true);
        Ok(())
    }

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set_state(false);
        Ok(())
    }
}

impl<const P: char, const N: u8> StatefulOutputPin for Pin<P, N, Output<PushPull>> {
    fn is_set_high(&self) -> Result<bool, Self::Error> {
        Ok(self.is_output_high())
    }

    fn is_set_low(&self) -> Result<bool, Self::Error> {
        Ok(!self.is_output_high())
    }
}

impl<const P: char, const N: u8> ToggleableOutputPin for Pin<P, N, Output<PushPull>> {
    type Error = Infallible;

    fn toggle(&mut self) -> Result<(), Self::Error> {
        let high = self.is_output_high();
        self.set_state(!high);
        Ok(())
    }
}

#[inline(always)]
const fn gpiox<const P: char>() -> *const RegisterBlock {
    match P {
        'A' => crate::stm32::GPIOA::ptr(),
        'B' => crate::stm32::GPIOB::ptr() as _,
        'C' => crate::stm32::GPIOC::ptr() as _,
        'D' => crate::stm32::GPIOD::ptr() as _,
        #[cfg(feature = "stm32f103")]
        'E' => crate::stm32::GPIOE::ptr() as _,
        _ => panic!("Unknown GPIO port"),
    }
}

macro_rules! gpio {
    ($GPIOX:ident, $gpiox:ident, $port_id:literal, [
        $($PXi:ident: ($pxi:ident, $i:literal),)+
    ]) => {
        /// GPIO
        pub mod $gpiox {
            use super::{GpioExt, Input, Pin};
            use crate::rcc::{Enable, Rcc, Reset};
            use crate::stm32::$GPIOX;

            /// GPIO parts
            pub struct Parts {
                $(
                    pub $pxi: $PXi,
                )+
            }

            impl GpioExt for $GPIOX {
                type Parts = Parts;

                fn split(self, rcc: &mut Rcc) -> Parts {
                    $GPIOX::enable(rcc);
                    $GPIOX::reset(rcc);

                    Parts {
                        $(
                            $pxi: Pin::new(),
                        )+
                    }
                }
            }

            $(
                pub type $PXi<MODE = Input> = Pin<$port_id, $i, MODE>;
            )+
        }

        pub use $gpiox::{$($PXi,)+};
    }
}

gpio!(GPIOA, gpioa, 'A', [
    PA0: (pa0, 0),
    PA1: (pa1, 1),
    PA2: (pa2, 2),
    PA3: (pa3, 3),
    PA4: (pa4, 4),
    PA5: (pa5, 5),
    PA6: (pa6, 6),
    PA7: (pa7, 7),
    PA8: (pa8, 8),
    PA9: (pa9, 9),
    PA10: (pa10, 10),
    PA11: (pa11, 11),
    PA12: (pa12, 12),
    PA13: (pa13, 13),
    PA14: (pa14, 14),
    PA15: (pa15, 15),
]);

gpio!(GPIOB, gpiob, 'B', [
    PB0: (pb0, 0),
    PB1: (pb1, 1),
    PB2: (pb2, 2),
    PB3: (pb3, 3),
    PB4: (pb4, 4),
    PB5: (pb5, 5),
    PB6: (pb6, 6),
    PB7: (pb7, 7),
    PB8: (pb8, 8),
    PB9: (pb9, 9),
    PB10: (pb10, 10),
    PB11: (pb11, 11),
    PB12: (pb12, 12),
    PB13: (pb13, 13),
    PB14: (pb14, 14),
    PB15: (pb15, 15),
]);

gpio!(GPIOC, gpioc, 'C', [
    PC0: (pc0, 0),
    PC1: (pc1, 1),
    PC2: (pc2, 2),
    PC3: (pc3, 3),
    PC4: (pc4, 4),
    PC5: (pc5, 5),
    PC6: (pc6, 6),
    PC7: (pc7, 7),
    PC8: (pc8, 8),
    PC9: (pc9, 9),
    PC10: (pc10, 10),
    PC11: (pc11, 11),
    PC12: (pc12, 12),
    PC13: (pc13, 13),
    PC14: (pc14, 14),
    PC15: (pc15, 15),
]);

gpio!(GPIOD, gpiod, 'D', [
    PD0: (pd0, 0),
    PD1: (pd1, 1),
    PD2: (pd2, 2),
    PD3: (pd3, 3),
    PD4: (pd4, 4),
    PD5: (pd5, 5),
    PD6: (pd6, 6),
    PD7: (pd7, 7),
    PD8: (pd8, 8),
    PD9: (pd9, 9),
    PD10: (pd10, 10),
    PD11: (pd11, 11),
    PD12: (pd12, 12),
    PD13: (pd13, 13),
    PD14: (pd14, 14),
    PD15: (pd15, 15),
]);

#[cfg(feature = "stm32f103")]
gpio!(GPIOE, gpioe, 'E', [
    PE0: (pe0, 0),
    PE1: (pe1, 1),
    PE2: (pe2, 2),
    PE3: (pe3, 3),
    PE4: (pe4, 4),
    PE5: (pe5, 5),
    PE6: (pe6, 6),
    PE7: (pe7, 7),
    PE8: (pe8, 8),
    PE9: (pe9, 9),
    PE10: (pe10, 10),
    PE11: (pe11, 11),
    PE12: (pe12, 12),
    PE13: (pe13, 13),
    PE14: (pe14, 14),
    PE15: (pe15, 15),
]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pins_map_to_their_config_register() {
        assert_eq!(cr_field(0), (false, 0));
        assert_eq!(cr_field(5), (false, 20));
        assert_eq!(cr_field(8), (true, 0));
        assert_eq!(cr_field(13), (true, 20));
    }

    #[test]
    fn push_pull_bits_select_speed() {
        assert_eq!(push_pull_bits(Speed::Mhz50), 0b0011);
        assert_eq!(push_pull_bits(Speed::Mhz2), 0b0010);
    }
}
