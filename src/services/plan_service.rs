use std::collections::HashMap;

use crate::entities::{MemberStatus, member_entity as members, plan_entity as plans};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::write_csv;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    FromQueryResult, IntoActiveModel, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};

pub const PLAN_CSV_HEADERS: [&str; 7] = [
    "ID",
    "Name",
    "Description",
    "Price",
    "Duration (Months)",
    "Features",
    "Active Members",
];

#[derive(Debug, FromQueryResult)]
struct PlanMemberCount {
    plan_id: Option<i32>,
    count: i64,
}

#[derive(Clone)]
pub struct PlanService {
    pool: DatabaseConnection,
}

impl PlanService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 套餐列表，附带 active 会员数与月收入
    pub async fn list_plans(&self) -> AppResult<Vec<PlanResponse>> {
        let plans = plans::Entity::find()
            .order_by_asc(plans::Column::Id)
            .all(&self.pool)
            .await?;
        let counts = active_member_counts(&self.pool).await?;

        Ok(plans
            .into_iter()
            .map(|p| {
                let count = counts.get(&p.id).copied().unwrap_or(0);
                PlanResponse::new(p, count)
            })
            .collect())
    }

    pub async fn get_plan(&self, plan_id: i32) -> AppResult<PlanDetailResponse> {
        let plan = plans::Entity::find_by_id(plan_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| plan_not_found(plan_id))?;

        let active_members = members::Entity::find()
            .filter(members::Column::PlanId.eq(plan.id))
            .filter(members::Column::Status.eq(MemberStatus::Active))
            .order_by_asc(members::Column::Name)
            .order_by_asc(members::Column::Id)
            .all(&self.pool)
            .await?;
        let active_members: Vec<MemberResponse> = active_members
            .into_iter()
            .map(|m| MemberResponse::new(m, Some(&plan)))
            .collect();

        Ok(PlanDetailResponse {
            plan: PlanResponse::new(plan, active_members.len() as i64),
            active_members,
        })
    }

    pub async fn create_plan(&self, request: PlanRequest) -> AppResult<PlanResponse> {
        let input = request.validate()?;
        let features = input.features_column();

        let txn = self.pool.begin().await?;
        let plan = plans::ActiveModel {
            name: Set(input.name),
            description: Set(input.description),
            price_cents: Set(input.price_cents),
            duration_months: Set(input.duration_months),
            features: Set(features),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        log::info!("Created plan {} \"{}\"", plan.id, plan.name);
        Ok(PlanResponse::new(plan, 0))
    }

    pub async fn update_plan(&self, plan_id: i32, request: PlanRequest) -> AppResult<PlanResponse> {
        let input = request.validate()?;
        let features = input.features_column();

        let txn = self.pool.begin().await?;
        let existing = plans::Entity::find_by_id(plan_id)
            .one(&txn)
            .await?
            .ok_or_else(|| plan_not_found(plan_id))?;

        let mut model = existing.into_active_model();
        model.name = Set(input.name);
        model.description = Set(input.description);
        model.price_cents = Set(input.price_cents);
        model.duration_months = Set(input.duration_months);
        model.features = Set(features);
        let plan = model.update(&txn).await?;

        let member_count = members::Entity::find()
            .filter(members::Column::PlanId.eq(plan.id))
            .filter(members::Column::Status.eq(MemberStatus::Active))
            .count(&txn)
            .await?;
        txn.commit().await?;

        log::info!("Updated plan {}", plan.id);
        Ok(PlanResponse::new(plan, member_count as i64))
    }

    /// 仍有会员（不论状态）引用时拒绝删除
    pub async fn delete_plan(&self, plan_id: i32) -> AppResult<()> {
        let txn = self.pool.begin().await?;
        let plan = plans::Entity::find_by_id(plan_id)
            .one(&txn)
            .await?
            .ok_or_else(|| plan_not_found(plan_id))?;

        let in_use = members::Entity::find()
            .filter(members::Column::PlanId.eq(plan.id))
            .count(&txn)
            .await?;
        if in_use > 0 {
            return Err(AppError::Conflict(format!(
                "Cannot delete plan \"{}\": {} {} using it",
                plan.name,
                in_use,
                if in_use == 1 { "member is" } else { "members are" }
            )));
        }

        let name = plan.name.clone();
        plan.delete(&txn).await?;
        txn.commit().await?;

        log::info!("Deleted plan {plan_id} ({name})");
        Ok(())
    }

    /// 导出 CSV，Features 以逗号拼接
    pub async fn export_plans(&self) -> AppResult<Vec<u8>> {
        let plans = self.list_plans().await?;
        write_csv(
            &PLAN_CSV_HEADERS,
            plans.into_iter().map(|p| {
                vec![
                    p.id.to_string(),
                    p.name,
                    p.description.unwrap_or_default(),
                    format!("{:.2}", p.price),
                    p.duration_months.to_string(),
                    p.features.join(","),
                    p.member_count.to_string(),
                ]
            }),
        )
    }
}

fn plan_not_found(plan_id: i32) -> AppError {
    AppError::NotFound(format!("Plan {plan_id} not found"))
}

/// 各套餐的 active 会员数 (plan_id -> count)
pub(crate) async fn active_member_counts<C: ConnectionTrait>(
    db: &C,
) -> AppResult<HashMap<i32, i64>> {
    let rows = members::Entity::find()
        .select_only()
        .column(members::Column::PlanId)
        .column_as(Expr::col(members::Column::Id).count(), "count")
        .filter(members::Column::Status.eq(MemberStatus::Active))
        .filter(members::Column::PlanId.is_not_null())
        .group_by(members::Column::PlanId)
        .into_model::<PlanMemberCount>()
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|r| r.plan_id.map(|id| (id, r.count)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;
    use crate::services::MemberService;
    use crate::utils::FieldValue;

    fn plan_request(name: &str, price: &str) -> PlanRequest {
        PlanRequest {
            name: Some(name.into()),
            description: Some(format!("{name} description")),
            price: Some(price.into()),
            duration_months: Some("1".into()),
            features: Some(FeaturesInput::Text("Gym Access,Locker Room".into())),
        }
    }

    async fn add_member(pool: &DatabaseConnection, email: &str, plan_id: i32, status: &str) {
        MemberService::new(pool.clone())
            .create_member(MemberRequest {
                name: Some(email.split('@').next().unwrap_or_default().into()),
                email: Some(email.into()),
                plan_id: Some(FieldValue::Int(plan_id.into())),
                status: Some(status.into()),
                ..Default::default()
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_delete_plan_in_use_is_blocked() {
        let pool = test_pool().await;
        let service = PlanService::new(pool.clone());
        let plan = service
            .create_plan(plan_request("Basic Plan", "29.99"))
            .await
            .unwrap();
        // inactive 会员同样阻止删除
        add_member(&pool, "alice@email.com", plan.id, "inactive").await;

        let err = service.delete_plan(plan.id).await.unwrap_err();
        match err {
            AppError::Conflict(msg) => {
                assert_eq!(msg, "Cannot delete plan \"Basic Plan\": 1 member is using it")
            }
            other => panic!("expected conflict, got {other:?}"),
        }

        let detail = service.get_plan(plan.id).await.unwrap();
        assert_eq!(detail.plan.name, "Basic Plan");
        assert!(detail.active_members.is_empty());
        assert_eq!(members::Entity::find().count(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_unused_plan() {
        let pool = test_pool().await;
        let service = PlanService::new(pool.clone());
        let plan = service
            .create_plan(plan_request("Basic Plan", "29.99"))
            .await
            .unwrap();
        service.delete_plan(plan.id).await.unwrap();
        assert!(matches!(
            service.delete_plan(plan.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_counts_active_members() {
        let pool = test_pool().await;
        let service = PlanService::new(pool.clone());
        let basic = service
            .create_plan(plan_request("Basic Plan", "29.99"))
            .await
            .unwrap();
        let premium = service
            .create_plan(plan_request("Premium Plan", "59.99"))
            .await
            .unwrap();
        add_member(&pool, "alice@email.com", basic.id, "active").await;
        add_member(&pool, "bob@email.com", basic.id, "active").await;
        add_member(&pool, "carol@email.com", basic.id, "inactive").await;

        let plans = service.list_plans().await.unwrap();
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].member_count, 2);
        assert_eq!(plans[0].monthly_revenue.to_string(), "59.98");
        assert_eq!(plans[1].id, premium.id);
        assert_eq!(plans[1].member_count, 0);

        let detail = service.get_plan(basic.id).await.unwrap();
        assert_eq!(detail.active_members.len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_input_is_rejected() {
        let pool = test_pool().await;
        let service = PlanService::new(pool.clone());

        let err = service
            .create_plan(plan_request("Bad Plan", "abc"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let err = service
            .create_plan(plan_request("Bad Plan", "-5"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert_eq!(plans::Entity::find().count(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_feature_with_comma_is_rejected() {
        let pool = test_pool().await;
        let service = PlanService::new(pool.clone());
        let mut req = plan_request("Spa Plan", "79.99");
        req.features = Some(FeaturesInput::List(vec![
            "Sauna, Steam Room".into(),
            "Gym".into(),
        ]));
        let err = service.create_plan(req).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert_eq!(plans::Entity::find().count(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_and_export() {
        let pool = test_pool().await;
        let service = PlanService::new(pool.clone());
        let plan = service
            .create_plan(plan_request("Basic Plan", "29.99"))
            .await
            .unwrap();

        let mut req = plan_request("Basic Plan", "34.5");
        req.features = Some(FeaturesInput::List(vec![
            "Gym Access".into(),
            "Sauna".into(),
        ]));
        let updated = service.update_plan(plan.id, req).await.unwrap();
        assert_eq!(updated.price.to_string(), "34.50");
        assert_eq!(updated.features, vec!["Gym Access", "Sauna"]);

        let csv = String::from_utf8(service.export_plans().await.unwrap()).unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "ID,Name,Description,Price,Duration (Months),Features,Active Members"
        );
        assert_eq!(
            lines[1],
            format!(
                "{},Basic Plan,Basic Plan description,34.50,1,\"Gym Access,Sauna\",0",
                plan.id
            )
        );
    }
}
