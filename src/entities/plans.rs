use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

/// 会员套餐实体
/// - price_cents: 价格 (美分)，对外以两位小数 Decimal 展示
/// - features: 逗号分隔的权益列表，按输入顺序保存
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "plans")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub duration_months: i32,
    pub features: Option<String>,
}

impl Model {
    /// 两位小数价格
    pub fn price(&self) -> Decimal {
        Decimal::new(self.price_cents, 2)
    }

    /// 权益列表（去除空白项）
    pub fn feature_list(&self) -> Vec<String> {
        split_features(self.features.as_deref().unwrap_or_default())
    }
}

pub fn split_features(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::members::Entity")]
    Members,
}

impl Related<super::members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
