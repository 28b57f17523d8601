pub mod members;
pub mod plans;
pub mod session_enrollments;
pub mod sessions;
pub mod trainers;

pub use members as member_entity;
pub use plans as plan_entity;
pub use session_enrollments as session_enrollment_entity;
pub use sessions as session_entity;
pub use trainers as trainer_entity;

pub use members::MemberStatus;
pub use session_enrollments::EnrollmentStatus;
pub use sessions::SessionStatus;
pub use trainers::TrainerStatus;
