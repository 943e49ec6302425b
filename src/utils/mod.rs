pub mod clock;
pub mod interval;
pub mod logging;
pub mod percentage;
pub mod runtime;
