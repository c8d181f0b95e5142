pub mod forecast;
pub mod sample;
pub mod staffing;

pub use forecast::*;
pub use sample::*;
pub use staffing::*;
