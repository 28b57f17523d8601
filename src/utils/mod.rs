pub mod csv_export;
pub mod validation;

pub use csv_export::*;
pub use validation::*;
