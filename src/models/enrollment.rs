use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{
    EnrollmentStatus, member_entity, session_enrollment_entity, session_entity,
};
use crate::error::{AppError, AppResult};
use crate::utils::{FieldValue, parse_optional_int, required_text};

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct EnrollRequest {
    #[schema(value_type = Option<String>, example = "1")]
    pub member_id: Option<FieldValue>,
}

impl EnrollRequest {
    pub fn member_id(&self) -> AppResult<i32> {
        parse_optional_int(self.member_id.as_ref(), "Member")?
            .ok_or_else(|| AppError::ValidationError("Member is required".to_string()))
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct EnrollmentStatusRequest {
    #[schema(example = "completed")]
    pub status: Option<String>,
}

impl EnrollmentStatusRequest {
    pub fn status(&self) -> AppResult<EnrollmentStatus> {
        required_text(self.status.as_deref(), "Status")?
            .parse()
            .map_err(AppError::ValidationError)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EnrollmentResponse {
    pub id: i32,
    pub session_id: i32,
    pub session_title: Option<String>,
    pub member_id: i32,
    pub member_name: Option<String>,
    pub enrollment_date: NaiveDate,
    pub status: EnrollmentStatus,
}

impl EnrollmentResponse {
    pub fn new(
        e: session_enrollment_entity::Model,
        session: Option<&session_entity::Model>,
        member: Option<&member_entity::Model>,
    ) -> Self {
        Self {
            id: e.id,
            session_id: e.session_id,
            session_title: session.map(|s| s.title.clone()),
            member_id: e.member_id,
            member_name: member.map(|m| m.name.clone()),
            enrollment_date: e.enrollment_date,
            status: e.status,
        }
    }
}
