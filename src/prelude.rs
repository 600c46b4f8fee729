pub use crate::hal::blocking::delay::{DelayMs as _, DelayUs as _};
pub use crate::hal::digital::v2::{
    OutputPin as _, StatefulOutputPin as _, ToggleableOutputPin as _,
};
pub use crate::hal::timer::CountDown as _;

pub use crate::blink::Cancel as _;
pub use crate::tick::Ticker as _;
pub use crate::time::{ExtU32 as _, RateExtU32 as _};

#[cfg(feature = "device-selected")]
pub use crate::gpio::GpioExt as _;
#[cfg(feature = "device-selected")]
pub use crate::rcc::RccExt as _;
