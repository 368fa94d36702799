pub mod chat;
pub mod contact;
pub mod health;

pub use chat::*;
pub use contact::*;
pub use health::*;
