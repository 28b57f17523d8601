use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{TrainerStatus, trainer_entity};
use crate::error::{AppError, AppResult};
use crate::utils::{
    FieldValue, optional_text, parse_optional_int, parse_status, required_text, validate_email,
};

use super::SessionResponse;

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct TrainerQuery {
    /// 姓名子串
    pub search: Option<String>,
    /// 专长子串
    pub specialization: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct TrainerRequest {
    #[schema(example = "Sarah Johnson")]
    pub name: Option<String>,
    #[schema(example = "sarah.johnson@fitnessclub.com")]
    pub email: Option<String>,
    pub phone: Option<String>,
    #[schema(example = "Yoga & Pilates")]
    pub specialization: Option<String>,
    #[schema(value_type = Option<String>, example = "8")]
    pub experience_years: Option<FieldValue>,
    pub bio: Option<String>,
    #[schema(example = "active")]
    pub status: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TrainerInput {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub specialization: Option<String>,
    pub experience_years: Option<i32>,
    pub bio: Option<String>,
    pub status: TrainerStatus,
}

impl TrainerRequest {
    pub fn validate(self) -> AppResult<TrainerInput> {
        let name = required_text(self.name.as_deref(), "Name")?;
        let email = required_text(self.email.as_deref(), "Email")?;
        validate_email(&email)?;
        let experience_years =
            parse_optional_int(self.experience_years.as_ref(), "Experience years")?;
        if experience_years.is_some_and(|y| y < 0) {
            return Err(AppError::ValidationError(
                "Experience years must not be negative".to_string(),
            ));
        }
        let status = parse_status(self.status.as_deref(), TrainerStatus::Active)?;

        Ok(TrainerInput {
            name,
            email,
            phone: optional_text(self.phone),
            specialization: optional_text(self.specialization),
            experience_years,
            bio: optional_text(self.bio),
            status,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TrainerResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub specialization: Option<String>,
    pub experience_years: Option<i32>,
    pub bio: Option<String>,
    pub status: TrainerStatus,
    /// 名下课程数（含已取消）
    pub sessions_count: i64,
}

impl TrainerResponse {
    pub fn new(t: trainer_entity::Model, sessions_count: i64) -> Self {
        Self {
            id: t.id,
            name: t.name,
            email: t.email,
            phone: t.phone,
            specialization: t.specialization,
            experience_years: t.experience_years,
            bio: t.bio,
            status: t.status,
            sessions_count,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TrainerDetailResponse {
    #[serde(flatten)]
    pub trainer: TrainerResponse,
    pub upcoming_sessions: Vec<SessionResponse>,
}
