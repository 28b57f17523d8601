pub mod common;
pub mod dashboard;
pub mod enrollment;
pub mod member;
pub mod plan;
pub mod session;
pub mod trainer;

pub use common::*;
pub use dashboard::*;
pub use enrollment::*;
pub use member::*;
pub use plan::*;
pub use session::*;
pub use trainer::*;
