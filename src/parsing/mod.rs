pub mod duration;
pub mod exposition;

pub use duration::{DurationError, parse_duration};
pub use exposition::{ParseError, parse_exposition};
