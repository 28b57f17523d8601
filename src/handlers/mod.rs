pub mod common;
pub mod dashboard;
pub mod enrollment;
pub mod member;
pub mod plan;
pub mod session;
pub mod trainer;

pub use common::payload_config;
pub use dashboard::dashboard_config;
pub use enrollment::enrollment_config;
pub use member::member_config;
pub use plan::plan_config;
pub use session::session_config;
pub use trainer::trainer_config;
