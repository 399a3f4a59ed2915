pub mod connection;
pub mod settings;
pub mod validation;

pub use connection::*;
pub use settings::*;
pub use validation::*;
