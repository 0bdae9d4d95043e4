pub mod convert;
pub mod health;
pub mod heartbeat;
pub mod static_files;

pub use convert::*;
pub use health::*;
pub use heartbeat::*;
pub use static_files::*;
