pub mod dashboard_service;
pub mod enrollment_service;
pub mod member_service;
pub mod plan_service;
pub mod seed_service;
pub mod session_service;
pub mod trainer_service;

pub use dashboard_service::*;
pub use enrollment_service::*;
pub use member_service::*;
pub use plan_service::*;
pub use seed_service::*;
pub use session_service::*;
pub use trainer_service::*;
