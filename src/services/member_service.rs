use crate::entities::{
    MemberStatus, member_entity as members, plan_entity as plans,
    session_enrollment_entity as enrollments, session_entity as sessions,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::enrollment_service::refresh_enrolled_count;
use crate::utils::{non_empty, search_term, write_csv};
use chrono::Local;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, ModelTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

pub const MEMBER_CSV_HEADERS: [&str; 7] =
    ["ID", "Name", "Email", "Phone", "Join Date", "Plan", "Status"];

#[derive(Clone)]
pub struct MemberService {
    pool: DatabaseConnection,
}

impl MemberService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 会员列表，按加入日期倒序
    ///
    /// search 先用 LIKE 在数据库侧缩小范围，再在内存中做区分大小写的子串匹配，
    /// 保证 Postgres 与 SQLite 下结果一致。
    pub async fn list_members(&self, query: &MemberQuery) -> AppResult<Vec<MemberResponse>> {
        let mut select = members::Entity::find();

        let search = search_term(query.search.as_deref());
        if let Some(search) = search {
            select = select.filter(
                Condition::any()
                    .add(members::Column::Name.contains(search))
                    .add(members::Column::Email.contains(search))
                    .add(members::Column::Phone.contains(search)),
            );
        }
        if let Some(status) = non_empty(query.status.as_deref()) {
            let status: MemberStatus = status.parse().map_err(AppError::ValidationError)?;
            select = select.filter(members::Column::Status.eq(status));
        }
        if let Some(plan_id) = non_empty(query.plan_id.as_deref()) {
            let plan_id: i32 = plan_id
                .parse()
                .map_err(|_| AppError::ValidationError("plan_id must be a whole number".into()))?;
            select = select.filter(members::Column::PlanId.eq(plan_id));
        }

        let rows = select
            .order_by_desc(members::Column::JoinDate)
            .order_by_desc(members::Column::Id)
            .find_also_related(plans::Entity)
            .all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .filter(|(m, _)| search.is_none_or(|s| matches_search(m, s)))
            .map(|(m, p)| MemberResponse::new(m, p.as_ref()))
            .collect())
    }

    /// 会员详情（含报名记录）
    pub async fn get_member(&self, member_id: i32) -> AppResult<MemberDetailResponse> {
        let (member, plan) = members::Entity::find_by_id(member_id)
            .find_also_related(plans::Entity)
            .one(&self.pool)
            .await?
            .ok_or_else(|| member_not_found(member_id))?;

        let rows = enrollments::Entity::find()
            .filter(enrollments::Column::MemberId.eq(member.id))
            .find_also_related(sessions::Entity)
            .order_by_asc(enrollments::Column::Id)
            .all(&self.pool)
            .await?;
        let enrollments = rows
            .into_iter()
            .map(|(e, s)| EnrollmentResponse::new(e, s.as_ref(), Some(&member)))
            .collect();

        Ok(MemberDetailResponse {
            member: MemberResponse::new(member, plan.as_ref()),
            enrollments,
        })
    }

    pub async fn create_member(&self, request: MemberRequest) -> AppResult<MemberResponse> {
        let input = request.validate()?;

        let txn = self.pool.begin().await?;
        let plan = find_plan(&txn, input.plan_id).await?;
        ensure_email_available(&txn, &input.email, None).await?;

        let member = members::ActiveModel {
            name: Set(input.name),
            email: Set(input.email),
            phone: Set(input.phone),
            join_date: Set(input
                .join_date
                .unwrap_or_else(|| Local::now().date_naive())),
            plan_id: Set(input.plan_id),
            status: Set(input.status),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        log::info!("Created member {} <{}>", member.id, member.email);
        Ok(MemberResponse::new(member, plan.as_ref()))
    }

    /// 整条记录更新；未提供 join_date 时保留原值
    pub async fn update_member(
        &self,
        member_id: i32,
        request: MemberRequest,
    ) -> AppResult<MemberResponse> {
        let input = request.validate()?;

        let txn = self.pool.begin().await?;
        let existing = members::Entity::find_by_id(member_id)
            .one(&txn)
            .await?
            .ok_or_else(|| member_not_found(member_id))?;
        let plan = find_plan(&txn, input.plan_id).await?;
        ensure_email_available(&txn, &input.email, Some(member_id)).await?;

        let mut model = existing.into_active_model();
        model.name = Set(input.name);
        model.email = Set(input.email);
        model.phone = Set(input.phone);
        model.plan_id = Set(input.plan_id);
        model.status = Set(input.status);
        if let Some(join_date) = input.join_date {
            model.join_date = Set(join_date);
        }
        let member = model.update(&txn).await?;
        txn.commit().await?;

        log::info!("Updated member {}", member.id);
        Ok(MemberResponse::new(member, plan.as_ref()))
    }

    /// 删除会员，同一事务内删除其报名记录并回写课程报名数
    pub async fn delete_member(&self, member_id: i32) -> AppResult<()> {
        let txn = self.pool.begin().await?;
        let member = members::Entity::find_by_id(member_id)
            .one(&txn)
            .await?
            .ok_or_else(|| member_not_found(member_id))?;

        let affected_sessions: Vec<i32> = enrollments::Entity::find()
            .filter(enrollments::Column::MemberId.eq(member_id))
            .all(&txn)
            .await?
            .into_iter()
            .map(|e| e.session_id)
            .collect();

        enrollments::Entity::delete_many()
            .filter(enrollments::Column::MemberId.eq(member_id))
            .exec(&txn)
            .await?;
        let name = member.name.clone();
        member.delete(&txn).await?;

        for session_id in affected_sessions {
            refresh_enrolled_count(&txn, session_id).await?;
        }
        txn.commit().await?;

        log::info!("Deleted member {member_id} ({name})");
        Ok(())
    }

    /// 导出 CSV: ID, Name, Email, Phone, Join Date, Plan, Status
    pub async fn export_members(&self) -> AppResult<Vec<u8>> {
        let rows = members::Entity::find()
            .order_by_asc(members::Column::Id)
            .find_also_related(plans::Entity)
            .all(&self.pool)
            .await?;

        write_csv(
            &MEMBER_CSV_HEADERS,
            rows.into_iter().map(|(m, p)| {
                vec![
                    m.id.to_string(),
                    m.name,
                    m.email,
                    m.phone.unwrap_or_default(),
                    m.join_date.format("%Y-%m-%d").to_string(),
                    p.map(|p| p.name).unwrap_or_default(),
                    m.status.to_string(),
                ]
            }),
        )
    }
}

fn member_not_found(member_id: i32) -> AppError {
    AppError::NotFound(format!("Member {member_id} not found"))
}

fn matches_search(m: &members::Model, search: &str) -> bool {
    m.name.contains(search)
        || m.email.contains(search)
        || m.phone.as_deref().is_some_and(|p| p.contains(search))
}

async fn find_plan<C: ConnectionTrait>(
    db: &C,
    plan_id: Option<i32>,
) -> AppResult<Option<plans::Model>> {
    let Some(plan_id) = plan_id else {
        return Ok(None);
    };
    let plan = plans::Entity::find_by_id(plan_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::ValidationError(format!("Plan {plan_id} does not exist")))?;
    Ok(Some(plan))
}

/// 邮箱唯一（区分大小写的精确匹配），更新时排除自身
async fn ensure_email_available<C: ConnectionTrait>(
    db: &C,
    email: &str,
    exclude_id: Option<i32>,
) -> AppResult<()> {
    let mut select = members::Entity::find().filter(members::Column::Email.eq(email));
    if let Some(id) = exclude_id {
        select = select.filter(members::Column::Id.ne(id));
    }
    if select.one(db).await?.is_some() {
        return Err(AppError::Conflict(format!(
            "A member with email {email} already exists"
        )));
    }
    Ok(())
}
