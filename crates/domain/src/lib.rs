pub mod entities;
pub mod ports;
pub mod repositories;
pub mod validation;
pub mod value_objects;

pub use entities::*;
pub use ports::*;
pub use relay_errors::{RelayError, RelayResult};
pub use repositories::*;
pub use validation::*;
pub use value_objects::*;
