use crate::stm32::{rcc, RCC};
use crate::time::Hertz;
use fugit::RateExtU32;

mod config;
mod enable;

pub use config::*;

/// HSI frequency
pub const HSI_FREQ: u32 = 8_000_000;

/// Clock frequencies
#[derive(Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Clocks {
    /// System frequency
    pub sys_clk: Hertz,
    /// AHB frequency
    pub ahb_clk: Hertz,
    /// APB1 frequency
    pub apb1_clk: Hertz,
    /// APB1 timers frequency
    pub apb1_tim_clk: Hertz,
    /// APB2 frequency
    pub apb2_clk: Hertz,
    /// APB2 timers frequency
    pub apb2_tim_clk: Hertz,
}

impl Default for Clocks {
    fn default() -> Clocks {
        Clocks {
            sys_clk: 8.MHz(),
            ahb_clk: 8.MHz(),
            apb1_clk: 8.MHz(),
            apb1_tim_clk: 8.MHz(),
            apb2_clk: 8.MHz(),
            apb2_tim_clk: 8.MHz(),
        }
    }
}

/// Constrained RCC peripheral
pub struct Rcc {
    /// Clock configuration
    pub clocks: Clocks,
    pub(crate) rb: RCC,
}

impl core::ops::Deref for Rcc {
    type Target = RCC;

    #[inline(always)]
    fn deref(&self) -> &Self::Target {
        &self.rb
    }
}

impl Rcc {
    /// Apply clock configuration
    pub fn freeze(self, cfg: Config) -> Self {
        let (sys_clk, sw_bits) = match cfg.sys_mux {
            SysClockSrc::HSI => {
                self.enable_hsi();
                (HSI_FREQ.Hz(), 0b00)
            }
            SysClockSrc::HSE(freq) => {
                self.enable_hse(false);
                (freq, 0b01)
            }
            SysClockSrc::HSE_BYPASS(freq) => {
                self.enable_hse(true);
                (freq, 0b01)
            }
            SysClockSrc::PLL(src, mul) => (self.enable_pll(src, mul), 0b10),
        };

        let sys_freq = sys_clk.raw();
        set_flash_latency(sys_freq);

        let (ahb_freq, ahb_psc_bits) = match cfg.ahb_psc {
            Prescaler::Div2 => (sys_freq / 2, 0b1000),
            Prescaler::Div4 => (sys_freq / 4, 0b1001),
            Prescaler::Div8 => (sys_freq / 8, 0b1010),
            Prescaler::Div16 => (sys_freq / 16, 0b1011),
            Prescaler::Div64 => (sys_freq / 64, 0b1100),
            Prescaler::Div128 => (sys_freq / 128, 0b1101),
            Prescaler::Div256 => (sys_freq / 256, 0b1110),
            Prescaler::Div512 => (sys_freq / 512, 0b1111),
            _ => (sys_freq, 0b0000),
        };
        let (apb1_freq, apb1_tim_freq, apb1_psc_bits) = apb_clocks(ahb_freq, cfg.apb1_psc);
        let (apb2_freq, apb2_tim_freq, apb2_psc_bits) = apb_clocks(ahb_freq, cfg.apb2_psc);

        self.cfgr.modify(|_, w| unsafe {
            w.hpre()
                .bits(ahb_psc_bits)
                .ppre1()
                .bits(apb1_psc_bits)
                .ppre2()
                .bits(apb2_psc_bits)
                .sw()
                .bits(sw_bits)
        });

        while self.cfgr.read().sws().bits() != sw_bits {}

        let clocks = Clocks {
            sys_clk,
            ahb_clk: ahb_freq.Hz(),
            apb1_clk: apb1_freq.Hz(),
            apb1_tim_clk: apb1_tim_freq.Hz(),
            apb2_clk: apb2_freq.Hz(),
            apb2_tim_clk: apb2_tim_freq.Hz(),
        };
        #[cfg(feature = "defmt")]
        defmt::debug!("clocks frozen: {}", clocks);

        Rcc {
            rb: self.rb,
            clocks,
        }
    }

    pub(crate) fn enable_hsi(&self) {
        self.cr.modify(|_, w| w.hsion().set_bit());
        while self.cr.read().hsirdy().bit_is_clear() {}
    }

    pub(crate) fn enable_hse(&self, bypass: bool) {
        self.cr
            .modify(|_, w| w.hseon().set_bit().hsebyp().bit(bypass));
        while self.cr.read().hserdy().bit_is_clear() {}
    }

    fn enable_pll(&self, src: PLLSrc, mul: u8) -> Hertz {
        let (input, from_hse) = match src {
            PLLSrc::HSI_DIV2 => {
                self.enable_hsi();
                (HSI_FREQ / 2, false)
            }
            PLLSrc::HSE(freq) => {
                self.enable_hse(false);
                (freq.raw(), true)
            }
            PLLSrc::HSE_BYPASS(freq) => {
                self.enable_hse(true);
                (freq.raw(), true)
            }
        };
        let mul = mul.clamp(2, 16);

        // PLLON cannot be cleared while the PLL drives SYSCLK
        if pll_drives_sysclk(self.cfgr.read().sws().bits()) {
            self.enable_hsi();
            self.cfgr.modify(|_, w| unsafe { w.sw().bits(0b00) });
            while self.cfgr.read().sws().bits() != 0b00 {}
        }

        // PLL configuration is locked while it runs
        self.cr.modify(|_, w| w.pllon().clear_bit());
        while self.cr.read().pllrdy().bit_is_set() {}

        self.cfgr.modify(|_, w| unsafe {
            w.pllsrc()
                .bit(from_hse)
                .pllxtpre()
                .clear_bit()
                .pllmul()
                .bits(mul - 2)
        });
        self.cr.modify(|_, w| w.pllon().set_bit());
        while self.cr.read().pllrdy().bit_is_clear() {}

        (input * u32::from(mul)).Hz()
    }
}

fn pll_drives_sysclk(sws: u8) -> bool {
    sws == 0b10
}

fn apb_clocks(ahb_freq: u32, psc: Prescaler) -> (u32, u32, u8) {
    match psc {
        Prescaler::Div2 => (ahb_freq / 2, ahb_freq, 0b100),
        Prescaler::Div4 => (ahb_freq / 4, ahb_freq / 2, 0b101),
        Prescaler::Div8 => (ahb_freq / 8, ahb_freq / 4, 0b110),
        Prescaler::Div16 => (ahb_freq / 16, ahb_freq / 8, 0b111),
        _ => (ahb_freq, ahb_freq, 0b000),
    }
}

/// Flash wait states for the given SYSCLK
#[cfg_attr(feature = "stm32f100", allow(dead_code))]
pub(crate) fn flash_latency(sys_freq: u32) -> u8 {
    match sys_freq {
        0..=24_000_000 => 0,
        24_000_001..=48_000_000 => 1,
        _ => 2,
    }
}

#[cfg(not(feature = "stm32f100"))]
fn set_flash_latency(sys_freq: u32) {
    let flash = unsafe { &(*crate::stm32::FLASH::ptr()) };
    let ws = flash_latency(sys_freq);
    flash.acr.modify(|_, w| unsafe { w.latency().bits(ws) });
}

// Value line parts run from flash without wait states
#[cfg(feature = "stm32f100")]
fn set_flash_latency(_sys_freq: u32) {}

/// Extension trait that constrains the `RCC` peripheral
pub trait RccExt {
    /// Constrains the `RCC` peripheral so it plays nicely with the other abstractions
    fn constrain(self) -> Rcc;
    /// Constrains the `RCC` peripheral and apply clock configuration
    fn freeze(self, rcc_cfg: Config) -> Rcc;
}

impl RccExt for RCC {
    fn constrain(self) -> Rcc {
        Rcc {
            rb: self,
            clocks: Clocks::default(),
        }
    }

    fn freeze(self, rcc_cfg: Config) -> Rcc {
        self.constrain().freeze(rcc_cfg)
    }
}

/// Bus associated to peripheral
pub trait RccBus: crate::Sealed {
    /// Bus type;
    type Bus;
}

/// Enable peripheral clock
pub trait Enable: RccBus {
    /// Enables peripheral
    fn enable(rcc: &mut Rcc);
}

/// Reset peripheral
pub trait Reset: RccBus {
    /// Resets peripheral
    fn reset(rcc: &mut Rcc);
}

use crate::stm32::rcc::RegisterBlock as RccRB;

macro_rules! bus_struct {
    ($($busX:ident => ($EN:ident, $en:ident, $RST:ident, $rst:ident, $doc:literal),)+) => {
        $(
            #[doc = $doc]
            pub struct $busX {
                _0: (),
            }

            impl $busX {
                #[inline(always)]
                fn enr(rcc: &RccRB) -> &rcc::$EN {
                    &rcc.$en
                }

                #[inline(always)]
                fn rstr(rcc: &RccRB) -> &rcc::$RST {
                    &rcc.$rst
                }
            }
        )+
    };
}

bus_struct! {
    APB2 => (APB2ENR, apb2enr, APB2RSTR, apb2rstr, "Advanced Peripheral Bus 2 (APB2) registers"),
}
