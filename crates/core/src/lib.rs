#![forbid(unsafe_code)]

pub mod animate;
pub mod kana;
pub mod model;
pub mod progress;
pub mod time;

pub use time::Clock;
