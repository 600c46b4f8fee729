use crate::time::Hertz;

/// Prescaler
#[derive(Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Prescaler {
    NotDivided,
    Div2,
    Div4,
    Div8,
    Div16,
    Div64,
    Div128,
    Div256,
    Div512,
}

/// PLL input
#[derive(Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PLLSrc {
    HSI_DIV2,
    HSE(Hertz),
    HSE_BYPASS(Hertz),
}

/// System clock mux source
#[derive(Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SysClockSrc {
    HSI,
    HSE(Hertz),
    HSE_BYPASS(Hertz),
    /// PLL with a multiplier in `2..=16`
    PLL(PLLSrc, u8),
}

/// Clocks configutation
pub struct Config {
    pub(crate) sys_mux: SysClockSrc,
    pub(crate) ahb_psc: Prescaler,
    pub(crate) apb1_psc: Prescaler,
    pub(crate) apb2_psc: Prescaler,
}

impl Config {
    pub fn new(mux: SysClockSrc) -> Self {
        Config::default().clock_src(mux)
    }

    pub fn hsi() -> Self {
        Config::default().clock_src(SysClockSrc::HSI)
    }

    pub fn hse(freq: Hertz) -> Self {
        Config::default().clock_src(SysClockSrc::HSE(freq))
    }

    pub fn pll(src: PLLSrc, mul: u8) -> Self {
        Config::default().clock_src(SysClockSrc::PLL(src, mul))
    }

    pub fn clock_src(mut self, mux: SysClockSrc) -> Self {
        self.sys_mux = mux;
        self
    }

    pub fn ahb_psc(mut self, psc: Prescaler) -> Self {
        self.ahb_psc = psc;
        self
    }

    /// APB1 must not exceed 36 MHz
    pub fn apb1_psc(mut self, psc: Prescaler) -> Self {
        self.apb1_psc = psc;
        self
    }

    pub fn apb2_psc(mut self, psc: Prescaler) -> Self {
        self.apb2_psc = psc;
        self
    }
}

impl Default for Config {
    fn default() -> Config {
        Config {
            sys_mux: SysClockSrc::HSI,
            ahb_psc: Prescaler::NotDivided,
            apb1_psc: Prescaler::NotDivided,
            apb2_psc: Prescaler::NotDivided,
        }
    }
}
