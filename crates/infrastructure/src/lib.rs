pub mod database;
pub mod mail;
pub mod providers;

pub use database::*;
pub use mail::*;
pub use providers::*;
