use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{SessionStatus, session_entity, trainer_entity};
use crate::error::{AppError, AppResult};
use crate::utils::{
    FieldValue, non_empty, optional_text, parse_date, parse_optional_int, parse_status,
    parse_time, required_text,
};

use super::EnrollmentResponse;

pub const DEFAULT_DURATION_MINUTES: i32 = 60;
pub const DEFAULT_CAPACITY: i32 = 10;

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct SessionQuery {
    pub trainer_id: Option<String>,
    pub status: Option<String>,
    /// YYYY-MM-DD
    pub date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct SessionRequest {
    #[schema(example = "Morning Yoga")]
    pub title: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>, example = "2")]
    pub trainer_id: Option<FieldValue>,
    #[schema(example = "2025-01-20")]
    pub date: Option<String>,
    #[schema(example = "08:00")]
    pub time: Option<String>,
    #[schema(value_type = Option<String>, example = "60")]
    pub duration_minutes: Option<FieldValue>,
    #[schema(value_type = Option<String>, example = "10")]
    pub capacity: Option<FieldValue>,
    #[schema(example = "active")]
    pub status: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SessionInput {
    pub title: String,
    pub description: Option<String>,
    pub trainer_id: i32,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub duration_minutes: i32,
    pub capacity: i32,
    pub status: SessionStatus,
}

impl SessionRequest {
    /// 按顺序校验：标题 -> 教练 -> 日期时间 -> 不能早于 now -> 时长 / 容量
    pub fn validate(self, now: NaiveDateTime) -> AppResult<SessionInput> {
        let title = required_text(self.title.as_deref(), "Title")?;
        let trainer_id = parse_optional_int(self.trainer_id.as_ref(), "Trainer")?
            .ok_or_else(|| AppError::ValidationError("Trainer is required".to_string()))?;

        let (Some(date), Some(time)) = (non_empty(self.date.as_deref()), non_empty(self.time.as_deref()))
        else {
            return Err(AppError::ValidationError(
                "Date and time are required".to_string(),
            ));
        };
        let date = parse_date(date, "Date")?;
        let time = parse_time(time, "Time")?;
        if date.and_time(time) < now {
            return Err(AppError::ValidationError(
                "Session cannot be scheduled in the past".to_string(),
            ));
        }

        let duration_minutes = parse_optional_int(self.duration_minutes.as_ref(), "Duration")?
            .unwrap_or(DEFAULT_DURATION_MINUTES);
        if duration_minutes <= 0 {
            return Err(AppError::ValidationError(
                "Duration must be a positive number of minutes".to_string(),
            ));
        }
        let capacity =
            parse_optional_int(self.capacity.as_ref(), "Capacity")?.unwrap_or(DEFAULT_CAPACITY);
        if capacity <= 0 {
            return Err(AppError::ValidationError(
                "Capacity must be a positive number".to_string(),
            ));
        }
        let status = parse_status(self.status.as_deref(), SessionStatus::Active)?;

        Ok(SessionInput {
            title,
            description: optional_text(self.description),
            trainer_id,
            date,
            time,
            duration_minutes,
            capacity,
            status,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub trainer_id: i32,
    /// 教练姓名（教练不存在时为 None）
    pub trainer_name: Option<String>,
    pub date: NaiveDate,
    /// HH:MM
    pub time: String,
    pub duration_minutes: i32,
    pub capacity: i32,
    pub enrolled: i32,
    pub status: SessionStatus,
}

impl SessionResponse {
    pub fn new(s: session_entity::Model, trainer: Option<&trainer_entity::Model>) -> Self {
        Self {
            id: s.id,
            title: s.title,
            description: s.description,
            trainer_id: s.trainer_id,
            trainer_name: trainer.map(|t| t.name.clone()),
            date: s.date,
            time: s.time.format("%H:%M").to_string(),
            duration_minutes: s.duration_minutes,
            capacity: s.capacity,
            enrolled: s.enrolled,
            status: s.status,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionDetailResponse {
    #[serde(flatten)]
    pub session: SessionResponse,
    pub enrollments: Vec<EnrollmentResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn request() -> SessionRequest {
        SessionRequest {
            title: Some("Morning Yoga".into()),
            trainer_id: Some("2".into()),
            date: Some("2025-01-20".into()),
            time: Some("08:00".into()),
            ..Default::default()
        }
    }

    fn message(result: AppResult<SessionInput>) -> String {
        match result {
            Err(AppError::ValidationError(msg)) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_applies_defaults() {
        let input = request().validate(now()).unwrap();
        assert_eq!(input.duration_minutes, DEFAULT_DURATION_MINUTES);
        assert_eq!(input.capacity, DEFAULT_CAPACITY);
        assert_eq!(input.status, SessionStatus::Active);
        assert_eq!(input.trainer_id, 2);
    }

    #[test]
    fn test_validation_order() {
        // 标题与教练都缺失时先报标题
        let req = SessionRequest {
            date: Some("2025-01-20".into()),
            time: Some("08:00".into()),
            ..Default::default()
        };
        assert_eq!(message(req.validate(now())), "Title is required");

        let mut req = request();
        req.trainer_id = None;
        req.date = None;
        assert_eq!(message(req.validate(now())), "Trainer is required");

        let mut req = request();
        req.time = Some("".into());
        assert_eq!(message(req.validate(now())), "Date and time are required");

        let mut req = request();
        req.date = Some("2024-12-31".into());
        req.capacity = Some("0".into());
        assert_eq!(
            message(req.validate(now())),
            "Session cannot be scheduled in the past"
        );
    }

    #[test]
    fn test_validate_rejects_non_positive_capacity() {
        let mut req = request();
        req.capacity = Some(FieldValue::Int(0));
        assert!(req.validate(now()).is_err());

        let mut req = request();
        req.duration_minutes = Some("-15".into());
        assert!(req.validate(now()).is_err());
    }

    #[test]
    fn test_response_formats_time() {
        let model = session_entity::Model {
            id: 1,
            title: "Evening Pilates".into(),
            description: None,
            trainer_id: 9,
            date: NaiveDate::from_ymd_opt(2025, 1, 22).unwrap(),
            time: NaiveTime::from_hms_opt(17, 30, 0).unwrap(),
            duration_minutes: 60,
            capacity: 10,
            enrolled: 3,
            status: SessionStatus::Active,
        };
        let resp = SessionResponse::new(model, None);
        assert_eq!(resp.time, "17:30");
        assert_eq!(resp.trainer_name, None);
    }
}
