use crate::entities::{
    MemberStatus, SessionStatus, TrainerStatus, member_entity as members, plan_entity as plans,
    session_entity as sessions, trainer_entity as trainers,
};
use crate::error::AppResult;
use crate::models::*;
use crate::services::plan_service::active_member_counts;
use crate::services::session_service::not_started;
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

const OVERVIEW_LIMIT: u64 = 5;

#[derive(Clone)]
pub struct DashboardService {
    pool: DatabaseConnection,
}

impl DashboardService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn get_stats(&self) -> AppResult<DashboardStats> {
        self.stats_for(Local::now().date_naive()).await
    }

    /// 统计 + 最近加入的会员 + 即将开始的课程
    pub async fn get_overview(&self) -> AppResult<DashboardOverview> {
        self.overview_at(Local::now().naive_local()).await
    }

    async fn overview_at(&self, now: NaiveDateTime) -> AppResult<DashboardOverview> {
        let stats = self.stats_for(now.date()).await?;

        let recent_members = members::Entity::find()
            .order_by_desc(members::Column::JoinDate)
            .order_by_desc(members::Column::Id)
            .limit(OVERVIEW_LIMIT)
            .find_also_related(plans::Entity)
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|(m, p)| MemberResponse::new(m, p.as_ref()))
            .collect();

        let upcoming_sessions = sessions::Entity::find()
            .filter(sessions::Column::Status.eq(SessionStatus::Active))
            .filter(not_started(now))
            .order_by_asc(sessions::Column::Date)
            .order_by_asc(sessions::Column::Time)
            .order_by_asc(sessions::Column::Id)
            .limit(OVERVIEW_LIMIT)
            .find_also_related(trainers::Entity)
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|(s, t)| SessionResponse::new(s, t.as_ref()))
            .collect();

        Ok(DashboardOverview {
            stats,
            recent_members,
            upcoming_sessions,
        })
    }

    async fn stats_for(&self, today: NaiveDate) -> AppResult<DashboardStats> {
        let total_active_members = members::Entity::find()
            .filter(members::Column::Status.eq(MemberStatus::Active))
            .count(&self.pool)
            .await?;
        let active_sessions_count = sessions::Entity::find()
            .filter(sessions::Column::Status.eq(SessionStatus::Active))
            .count(&self.pool)
            .await?;
        let active_trainers_count = trainers::Entity::find()
            .filter(trainers::Column::Status.eq(TrainerStatus::Active))
            .count(&self.pool)
            .await?;

        let all_plans = plans::Entity::find().all(&self.pool).await?;
        let counts = active_member_counts(&self.pool).await?;
        let monthly_revenue: Decimal = all_plans
            .iter()
            .map(|p| p.price() * Decimal::from(counts.get(&p.id).copied().unwrap_or(0)))
            .sum();

        let month_start = today.with_day(1).unwrap_or(today);
        let new_members_this_month = members::Entity::find()
            .filter(members::Column::JoinDate.gte(month_start))
            .count(&self.pool)
            .await?;

        Ok(DashboardStats {
            total_active_members,
            active_sessions_count,
            total_plans: all_plans.len() as u64,
            active_trainers_count,
            monthly_revenue,
            new_members_this_month,
        })
    }
}
