pub mod category;
pub mod channel;

pub use category::*;
pub use channel::*;
