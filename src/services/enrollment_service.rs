use crate::entities::{
    EnrollmentStatus, MemberStatus, SessionStatus, member_entity as members,
    session_enrollment_entity as enrollments, session_entity as sessions,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use chrono::Local;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

#[derive(Clone)]
pub struct EnrollmentService {
    pool: DatabaseConnection,
}

impl EnrollmentService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 报名课程
    /// 不校验 enrolled <= capacity（容量上限语义尚未确认）
    pub async fn enroll(&self, session_id: i32, member_id: i32) -> AppResult<EnrollmentResponse> {
        let txn = self.pool.begin().await?;
        let session = sessions::Entity::find_by_id(session_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Session {session_id} not found")))?;
        let member = members::Entity::find_by_id(member_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Member {member_id} not found")))?;

        if session.status != SessionStatus::Active {
            return Err(AppError::ValidationError(format!(
                "Session \"{}\" is cancelled",
                session.title
            )));
        }
        if member.status != MemberStatus::Active {
            return Err(AppError::ValidationError(format!(
                "Member {} is inactive",
                member.name
            )));
        }

        let existing = enrollments::Entity::find()
            .filter(enrollments::Column::SessionId.eq(session_id))
            .filter(enrollments::Column::MemberId.eq(member_id))
            .one(&txn)
            .await?;
        if existing.is_some() {
            return Err(AppError::Conflict(format!(
                "{} is already enrolled in \"{}\"",
                member.name, session.title
            )));
        }

        let enrollment = enrollments::ActiveModel {
            session_id: Set(session_id),
            member_id: Set(member_id),
            enrollment_date: Set(Local::now().date_naive()),
            status: Set(EnrollmentStatus::Enrolled),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        refresh_enrolled_count(&txn, session_id).await?;
        txn.commit().await?;

        log::info!("Member {member_id} enrolled in session {session_id}");
        Ok(EnrollmentResponse::new(
            enrollment,
            Some(&session),
            Some(&member),
        ))
    }

    pub async fn list_for_session(&self, session_id: i32) -> AppResult<Vec<EnrollmentResponse>> {
        let session = sessions::Entity::find_by_id(session_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Session {session_id} not found")))?;
        list_session_enrollments(&self.pool, &session).await
    }

    pub async fn set_status(
        &self,
        enrollment_id: i32,
        status: EnrollmentStatus,
    ) -> AppResult<EnrollmentResponse> {
        let txn = self.pool.begin().await?;
        let existing = enrollments::Entity::find_by_id(enrollment_id)
            .one(&txn)
            .await?
            .ok_or_else(|| enrollment_not_found(enrollment_id))?;
        let session_id = existing.session_id;
        let member_id = existing.member_id;

        let mut model = existing.into_active_model();
        model.status = Set(status);
        let enrollment = model.update(&txn).await?;
        refresh_enrolled_count(&txn, session_id).await?;

        let session = sessions::Entity::find_by_id(session_id).one(&txn).await?;
        let member = members::Entity::find_by_id(member_id).one(&txn).await?;
        txn.commit().await?;

        log::info!("Enrollment {enrollment_id} set to {status}");
        Ok(EnrollmentResponse::new(
            enrollment,
            session.as_ref(),
            member.as_ref(),
        ))
    }

    /// 取消报名并删除记录
    pub async fn withdraw(&self, enrollment_id: i32) -> AppResult<()> {
        let txn = self.pool.begin().await?;
        let enrollment = enrollments::Entity::find_by_id(enrollment_id)
            .one(&txn)
            .await?
            .ok_or_else(|| enrollment_not_found(enrollment_id))?;
        let session_id = enrollment.session_id;
        enrollment.delete(&txn).await?;
        refresh_enrolled_count(&txn, session_id).await?;
        txn.commit().await?;

        log::info!("Enrollment {enrollment_id} withdrawn from session {session_id}");
        Ok(())
    }
}

fn enrollment_not_found(enrollment_id: i32) -> AppError {
    AppError::NotFound(format!("Enrollment {enrollment_id} not found"))
}

/// 按非取消报名数回写 sessions.enrolled
pub async fn refresh_enrolled_count<C: ConnectionTrait>(db: &C, session_id: i32) -> Result<(), DbErr> {
    let count = enrollments::Entity::find()
        .filter(enrollments::Column::SessionId.eq(session_id))
        .filter(enrollments::Column::Status.ne(EnrollmentStatus::Cancelled))
        .count(db)
        .await?;

    sessions::Entity::update_many()
        .col_expr(sessions::Column::Enrolled, Expr::value(count as i32))
        .filter(sessions::Column::Id.eq(session_id))
        .exec(db)
        .await?;
    Ok(())
}

pub(crate) async fn list_session_enrollments<C: ConnectionTrait>(
    db: &C,
    session: &sessions::Model,
) -> AppResult<Vec<EnrollmentResponse>> {
    let rows = enrollments::Entity::find()
        .filter(enrollments::Column::SessionId.eq(session.id))
        .find_also_related(members::Entity)
        .order_by_asc(enrollments::Column::Id)
        .all(db)
        .await?;
    Ok(rows
        .into_iter()
        .map(|(e, m)| EnrollmentResponse::new(e, Some(session), m.as_ref()))
        .collect())
}
