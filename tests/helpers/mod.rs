#![allow(dead_code)]

pub mod logs;
pub mod tokens;

pub use logs::{CapturedEvent, LogCapture};
pub use tokens::{token, CountingValidator, TokenBuilder, SECRET};
