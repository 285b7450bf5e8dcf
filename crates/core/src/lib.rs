//! Quiz domain: answer normalization, grading, questions, attempts and time.
#![forbid(unsafe_code)]

pub mod countdown;
pub mod grader;
pub mod model;
pub mod normalize;
pub mod time;

pub use countdown::{Countdown, CountdownTick};
pub use grader::{OptionMark, grade, mark_options};
pub use normalize::normalize;
pub use time::Clock;
