use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{MemberStatus, member_entity, plan_entity};
use crate::error::AppResult;
use crate::utils::{
    FieldValue, non_empty, optional_text, parse_date, parse_optional_int, parse_status,
    required_text, validate_email,
};

use super::EnrollmentResponse;

/// 会员列表查询参数，均为可选
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct MemberQuery {
    /// 按姓名 / 邮箱 / 电话子串匹配（区分大小写，空白按原样参与匹配）
    pub search: Option<String>,
    pub status: Option<String>,
    pub plan_id: Option<String>,
}

/// 会员创建 / 更新请求（整条记录提交）
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct MemberRequest {
    #[schema(example = "Alice Brown")]
    pub name: Option<String>,
    #[schema(example = "alice.brown@email.com")]
    pub email: Option<String>,
    #[schema(example = "555-1001")]
    pub phone: Option<String>,
    #[schema(value_type = Option<String>, example = "2")]
    pub plan_id: Option<FieldValue>,
    #[schema(example = "active")]
    pub status: Option<String>,
    /// YYYY-MM-DD，缺省为当天
    #[schema(example = "2025-01-15")]
    pub join_date: Option<String>,
}

/// 校验后的会员字段
#[derive(Debug, Clone)]
pub struct MemberInput {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub plan_id: Option<i32>,
    pub status: MemberStatus,
    pub join_date: Option<NaiveDate>,
}

impl MemberRequest {
    pub fn validate(self) -> AppResult<MemberInput> {
        let name = required_text(self.name.as_deref(), "Name")?;
        let email = required_text(self.email.as_deref(), "Email")?;
        validate_email(&email)?;
        let plan_id = parse_optional_int(self.plan_id.as_ref(), "plan_id")?;
        let status = parse_status(self.status.as_deref(), MemberStatus::Active)?;
        let join_date = non_empty(self.join_date.as_deref())
            .map(|d| parse_date(d, "join_date"))
            .transpose()?;

        Ok(MemberInput {
            name,
            email,
            phone: optional_text(self.phone),
            plan_id,
            status,
            join_date,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MemberResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub join_date: NaiveDate,
    pub plan_id: Option<i32>,
    /// 所属套餐名称（无套餐为 None）
    pub plan_name: Option<String>,
    pub status: MemberStatus,
}

impl MemberResponse {
    pub fn new(m: member_entity::Model, plan: Option<&plan_entity::Model>) -> Self {
        Self {
            id: m.id,
            name: m.name,
            email: m.email,
            phone: m.phone,
            join_date: m.join_date,
            plan_id: m.plan_id,
            plan_name: plan.map(|p| p.name.clone()),
            status: m.status,
        }
    }
}

/// 会员详情：基本信息 + 报名记录
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MemberDetailResponse {
    #[serde(flatten)]
    pub member: MemberResponse,
    pub enrollments: Vec<EnrollmentResponse>,
}
