use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::plan_entity;
use crate::error::{AppError, AppResult};
use crate::utils::{
    FieldValue, optional_text, parse_price_cents, parse_required_int, required_text,
};

use super::MemberResponse;

/// 权益输入：逗号分隔字符串（表单）或字符串数组（JSON）
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum FeaturesInput {
    List(Vec<String>),
    Text(String),
}

impl FeaturesInput {
    /// 存储按逗号拼接，数组项内不能再含逗号
    fn into_list(self) -> AppResult<Vec<String>> {
        match self {
            FeaturesInput::List(items) => {
                let mut features = Vec::with_capacity(items.len());
                for item in items {
                    let item = item.trim();
                    if item.contains(',') {
                        return Err(AppError::ValidationError(format!(
                            "Feature must not contain a comma: {item}"
                        )));
                    }
                    if !item.is_empty() {
                        features.push(item.to_string());
                    }
                }
                Ok(features)
            }
            FeaturesInput::Text(raw) => Ok(plan_entity::split_features(&raw)),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct PlanRequest {
    #[schema(example = "Premium Plan")]
    pub name: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>, example = "59.99")]
    pub price: Option<FieldValue>,
    #[schema(value_type = Option<String>, example = "1")]
    pub duration_months: Option<FieldValue>,
    #[schema(value_type = Option<String>, example = "Gym Access,Group Classes")]
    pub features: Option<FeaturesInput>,
}

#[derive(Debug, Clone)]
pub struct PlanInput {
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub duration_months: i32,
    pub features: Vec<String>,
}

impl PlanInput {
    /// 存储格式：逗号拼接
    pub fn features_column(&self) -> Option<String> {
        if self.features.is_empty() {
            None
        } else {
            Some(self.features.join(","))
        }
    }
}

impl PlanRequest {
    pub fn validate(self) -> AppResult<PlanInput> {
        let name = required_text(self.name.as_deref(), "Name")?;
        let price_cents = parse_price_cents(self.price.as_ref())?;
        let duration_months = parse_required_int(self.duration_months.as_ref(), "Duration")?;
        if duration_months <= 0 {
            return Err(AppError::ValidationError(
                "Duration must be a positive number of months".to_string(),
            ));
        }

        Ok(PlanInput {
            name,
            description: optional_text(self.description),
            price_cents,
            duration_months,
            features: self
                .features
                .map(FeaturesInput::into_list)
                .transpose()?
                .unwrap_or_default(),
        })
    }
}

/// 套餐读模型，member_count / monthly_revenue 为读取时计算的派生字段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PlanResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = f64)]
    pub price: Decimal,
    pub duration_months: i32,
    pub features: Vec<String>,
    /// 使用该套餐的 active 会员数
    pub member_count: i64,
    #[schema(value_type = f64)]
    pub monthly_revenue: Decimal,
}

impl PlanResponse {
    pub fn new(p: plan_entity::Model, member_count: i64) -> Self {
        let price = p.price();
        let features = p.feature_list();
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            price,
            duration_months: p.duration_months,
            features,
            member_count,
            monthly_revenue: price * Decimal::from(member_count),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlanDetailResponse {
    #[serde(flatten)]
    pub plan: PlanResponse,
    pub active_members: Vec<MemberResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_plan_request() {
        let req = PlanRequest {
            name: Some("Basic Plan".into()),
            price: Some("29.99".into()),
            duration_months: Some("1".into()),
            features: Some(FeaturesInput::Text(
                "Gym Access,Locker Room,Basic Equipment".into(),
            )),
            ..Default::default()
        };
        let input = req.validate().unwrap();
        assert_eq!(input.price_cents, 2999);
        assert_eq!(input.features.len(), 3);
        assert_eq!(
            input.features_column().as_deref(),
            Some("Gym Access,Locker Room,Basic Equipment")
        );
    }

    #[test]
    fn test_validate_rejects_malformed_numbers() {
        let base = PlanRequest {
            name: Some("Basic Plan".into()),
            price: Some("29.99".into()),
            duration_months: Some("1".into()),
            ..Default::default()
        };

        let mut req = base.clone();
        req.price = Some("cheap".into());
        assert!(matches!(req.validate(), Err(AppError::ValidationError(_))));

        let mut req = base.clone();
        req.duration_months = Some("twelve".into());
        assert!(matches!(req.validate(), Err(AppError::ValidationError(_))));

        let mut req = base;
        req.duration_months = Some("0".into());
        assert!(matches!(req.validate(), Err(AppError::ValidationError(_))));
    }

    #[test]
    fn test_features_from_json_array() {
        let req: PlanRequest = serde_json::from_value(serde_json::json!({
            "name": "Annual Plan",
            "price": 599.99,
            "duration_months": 12,
            "features": ["Gym Access", " Member Events "]
        }))
        .unwrap();
        let input = req.validate().unwrap();
        assert_eq!(input.price_cents, 59999);
        assert_eq!(input.features, vec!["Gym Access", "Member Events"]);
    }

    #[test]
    fn test_features_list_rejects_embedded_comma() {
        let req: PlanRequest = serde_json::from_value(serde_json::json!({
            "name": "Spa Plan",
            "price": "79.99",
            "duration_months": 1,
            "features": ["Sauna, Steam Room", "Gym"]
        }))
        .unwrap();
        match req.validate() {
            Err(AppError::ValidationError(msg)) => assert!(msg.contains("Sauna, Steam Room")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_plan_response_revenue() {
        let plan = plan_entity::Model {
            id: 1,
            name: "Basic Plan".into(),
            description: None,
            price_cents: 2999,
            duration_months: 1,
            features: None,
        };
        let resp = PlanResponse::new(plan, 3);
        assert_eq!(resp.monthly_revenue.to_string(), "89.97");
        assert!(resp.features.is_empty());
    }
}
