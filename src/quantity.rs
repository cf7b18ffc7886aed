#[macro_use]
pub mod macros;

pub mod charge;
pub mod energy;
pub mod temperature;
mod zero;

pub use self::zero::Zero;
