use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{MemberResponse, SessionResponse};

/// 仪表盘统计，每次调用实时计算
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DashboardStats {
    pub total_active_members: u64,
    pub active_sessions_count: u64,
    pub total_plans: u64,
    pub active_trainers_count: u64,
    /// active 会员所属套餐价格之和
    #[schema(value_type = f64)]
    pub monthly_revenue: Decimal,
    /// 本月 1 日及之后加入的会员数
    pub new_members_this_month: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardOverview {
    pub stats: DashboardStats,
    pub recent_members: Vec<MemberResponse>,
    pub upcoming_sessions: Vec<SessionResponse>,
}
