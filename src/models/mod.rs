pub mod convert;
pub mod error;
pub mod health;

pub use convert::*;
pub use error::*;
pub use health::*;
