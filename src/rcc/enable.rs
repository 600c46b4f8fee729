use super::*;

macro_rules! bus_enable {
    ($PER:ident => $en:ident) => {
        impl Enable for crate::stm32::$PER {
            #[inline(always)]
            fn enable(rcc: &mut Rcc) {
                Self::Bus::enr(rcc).modify(|_, w| w.$en().set_bit());
            }
        }
    };
}

macro_rules! bus_reset {
    ($PER:ident => $rst:ident) => {
        impl Reset for crate::stm32::$PER {
            #[inline(always)]
            fn reset(rcc: &mut Rcc) {
                Self::Bus::rstr(rcc).modify(|_, w| w.$rst().set_bit());
                Self::Bus::rstr(rcc).modify(|_, w| w.$rst().clear_bit());
            }
        }
    };
}

macro_rules! bus {
    ($($PER:ident => ($busX:ty, $en:ident, $rst:ident),)+) => {
        $(
            impl crate::Sealed for crate::stm32::$PER {}
            impl RccBus for crate::stm32::$PER {
                type Bus = $busX;
            }
            bus_enable!($PER => $en);
            bus_reset!($PER => $rst);
        )+
    }
}

bus! {
    GPIOA => (APB2, iopaen, ioparst), // 2
    GPIOB => (APB2, iopben, iopbrst), // 3
    GPIOC => (APB2, iopcen, iopcrst), // 4
    GPIOD => (APB2, iopden, iopdrst), // 5
}

#[cfg(feature = "stm32f103")]
bus! {
    GPIOE => (APB2, iopeen, ioperst), // 6
}
