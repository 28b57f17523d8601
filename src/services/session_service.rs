use crate::entities::{
    SessionStatus, session_enrollment_entity as enrollments, session_entity as sessions,
    trainer_entity as trainers,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::enrollment_service::list_session_enrollments;
use crate::utils::{non_empty, parse_date, write_csv};
use chrono::{Local, NaiveDateTime};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, ModelTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

pub const SESSION_CSV_HEADERS: [&str; 9] = [
    "ID",
    "Title",
    "Trainer",
    "Date",
    "Time",
    "Duration (Minutes)",
    "Capacity",
    "Enrolled",
    "Status",
];

#[derive(Clone)]
pub struct SessionService {
    pool: DatabaseConnection,
}

impl SessionService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 课程列表，按日期、时间升序
    pub async fn list_sessions(&self, query: &SessionQuery) -> AppResult<Vec<SessionResponse>> {
        let mut select = sessions::Entity::find();
        if let Some(trainer_id) = non_empty(query.trainer_id.as_deref()) {
            let trainer_id: i32 = trainer_id.parse().map_err(|_| {
                AppError::ValidationError("trainer_id must be a whole number".into())
            })?;
            select = select.filter(sessions::Column::TrainerId.eq(trainer_id));
        }
        if let Some(status) = non_empty(query.status.as_deref()) {
            let status: SessionStatus = status.parse().map_err(AppError::ValidationError)?;
            select = select.filter(sessions::Column::Status.eq(status));
        }
        if let Some(date) = non_empty(query.date.as_deref()) {
            select = select.filter(sessions::Column::Date.eq(parse_date(date, "date")?));
        }

        let rows = select
            .order_by_asc(sessions::Column::Date)
            .order_by_asc(sessions::Column::Time)
            .order_by_asc(sessions::Column::Id)
            .find_also_related(trainers::Entity)
            .all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(s, t)| SessionResponse::new(s, t.as_ref()))
            .collect())
    }

    pub async fn get_session(&self, session_id: i32) -> AppResult<SessionDetailResponse> {
        let (session, trainer) = sessions::Entity::find_by_id(session_id)
            .find_also_related(trainers::Entity)
            .one(&self.pool)
            .await?
            .ok_or_else(|| session_not_found(session_id))?;
        let enrollments = list_session_enrollments(&self.pool, &session).await?;

        Ok(SessionDetailResponse {
            session: SessionResponse::new(session, trainer.as_ref()),
            enrollments,
        })
    }

    pub async fn create_session(&self, request: SessionRequest) -> AppResult<SessionResponse> {
        self.create_session_at(request, Local::now().naive_local())
            .await
    }

    pub async fn update_session(
        &self,
        session_id: i32,
        request: SessionRequest,
    ) -> AppResult<SessionResponse> {
        self.update_session_at(session_id, request, Local::now().naive_local())
            .await
    }

    async fn create_session_at(
        &self,
        request: SessionRequest,
        now: NaiveDateTime,
    ) -> AppResult<SessionResponse> {
        let input = request.validate(now)?;

        let txn = self.pool.begin().await?;
        let trainer = find_trainer(&txn, input.trainer_id).await?;
        ensure_slot_available(&txn, &input, None).await?;

        let session = sessions::ActiveModel {
            title: Set(input.title),
            description: Set(input.description),
            trainer_id: Set(input.trainer_id),
            date: Set(input.date),
            time: Set(input.time),
            duration_minutes: Set(input.duration_minutes),
            capacity: Set(input.capacity),
            enrolled: Set(0),
            status: Set(input.status),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        log::info!(
            "Scheduled session {} \"{}\" for trainer {} at {}",
            session.id,
            session.title,
            session.trainer_id,
            session.starts_at()
        );
        Ok(SessionResponse::new(session, Some(&trainer)))
    }

    async fn update_session_at(
        &self,
        session_id: i32,
        request: SessionRequest,
        now: NaiveDateTime,
    ) -> AppResult<SessionResponse> {
        let input = request.validate(now)?;

        let txn = self.pool.begin().await?;
        let existing = sessions::Entity::find_by_id(session_id)
            .one(&txn)
            .await?
            .ok_or_else(|| session_not_found(session_id))?;
        let trainer = find_trainer(&txn, input.trainer_id).await?;
        ensure_slot_available(&txn, &input, Some(session_id)).await?;

        // enrolled 由报名记录维护，不接受客户端写入
        let mut model = existing.into_active_model();
        model.title = Set(input.title);
        model.description = Set(input.description);
        model.trainer_id = Set(input.trainer_id);
        model.date = Set(input.date);
        model.time = Set(input.time);
        model.duration_minutes = Set(input.duration_minutes);
        model.capacity = Set(input.capacity);
        model.status = Set(input.status);
        let session = model.update(&txn).await?;
        txn.commit().await?;

        log::info!("Updated session {}", session.id);
        Ok(SessionResponse::new(session, Some(&trainer)))
    }

    /// 仅切换状态为 cancelled，不重新校验日期
    pub async fn cancel_session(&self, session_id: i32) -> AppResult<SessionResponse> {
        let txn = self.pool.begin().await?;
        let (existing, trainer) = sessions::Entity::find_by_id(session_id)
            .find_also_related(trainers::Entity)
            .one(&txn)
            .await?
            .ok_or_else(|| session_not_found(session_id))?;

        let mut model = existing.into_active_model();
        model.status = Set(SessionStatus::Cancelled);
        let session = model.update(&txn).await?;
        txn.commit().await?;

        log::info!("Cancelled session {}", session.id);
        Ok(SessionResponse::new(session, trainer.as_ref()))
    }

    pub async fn delete_session(&self, session_id: i32) -> AppResult<()> {
        let txn = self.pool.begin().await?;
        let session = sessions::Entity::find_by_id(session_id)
            .one(&txn)
            .await?
            .ok_or_else(|| session_not_found(session_id))?;

        enrollments::Entity::delete_many()
            .filter(enrollments::Column::SessionId.eq(session_id))
            .exec(&txn)
            .await?;
        session.delete(&txn).await?;
        txn.commit().await?;

        log::info!("Deleted session {session_id}");
        Ok(())
    }

    /// 导出 CSV，教练缺失时显示 N/A
    pub async fn export_sessions(&self) -> AppResult<Vec<u8>> {
        let rows = sessions::Entity::find()
            .order_by_asc(sessions::Column::Date)
            .order_by_asc(sessions::Column::Time)
            .order_by_asc(sessions::Column::Id)
            .find_also_related(trainers::Entity)
            .all(&self.pool)
            .await?;

        write_csv(
            &SESSION_CSV_HEADERS,
            rows.into_iter().map(|(s, t)| {
                vec![
                    s.id.to_string(),
                    s.title,
                    t.map(|t| t.name).unwrap_or_else(|| "N/A".to_string()),
                    s.date.format("%Y-%m-%d").to_string(),
                    s.time.format("%H:%M").to_string(),
                    s.duration_minutes.to_string(),
                    s.capacity.to_string(),
                    s.enrolled.to_string(),
                    s.status.to_string(),
                ]
            }),
        )
    }
}

/// 开始时间不早于 now 的课程（当天已开始的不算）
pub(crate) fn not_started(now: NaiveDateTime) -> Condition {
    Condition::any()
        .add(sessions::Column::Date.gt(now.date()))
        .add(
            Condition::all()
                .add(sessions::Column::Date.eq(now.date()))
                .add(sessions::Column::Time.gte(now.time())),
        )
}

fn session_not_found(session_id: i32) -> AppError {
    AppError::NotFound(format!("Session {session_id} not found"))
}

async fn find_trainer<C: ConnectionTrait>(db: &C, trainer_id: i32) -> AppResult<trainers::Model> {
    trainers::Entity::find_by_id(trainer_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::ValidationError(format!("Trainer {trainer_id} does not exist")))
}

/// 同一教练在相同日期、时间只能有一个 active 课程；命中第一条即报冲突
async fn ensure_slot_available<C: ConnectionTrait>(
    db: &C,
    input: &SessionInput,
    exclude_id: Option<i32>,
) -> AppResult<()> {
    if input.status != SessionStatus::Active {
        return Ok(());
    }
    let mut select = sessions::Entity::find()
        .filter(sessions::Column::TrainerId.eq(input.trainer_id))
        .filter(sessions::Column::Date.eq(input.date))
        .filter(sessions::Column::Time.eq(input.time))
        .filter(sessions::Column::Status.eq(SessionStatus::Active));
    if let Some(id) = exclude_id {
        select = select.filter(sessions::Column::Id.ne(id));
    }

    if let Some(conflict) = select.order_by_asc(sessions::Column::Id).one(db).await? {
        return Err(AppError::Conflict(format!(
            "Trainer already has an active session \"{}\" on {} at {}",
            conflict.title,
            conflict.date.format("%Y-%m-%d"),
            conflict.time.format("%H:%M")
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;
    use crate::services::TrainerService;
    use crate::utils::FieldValue;
    use chrono::NaiveDate;

    async fn trainer(pool: &DatabaseConnection, email: &str) -> i32 {
        TrainerService::new(pool.clone())
            .create_trainer(TrainerRequest {
                name: Some("John Smith".into()),
                email: Some(email.into()),
                specialization: Some("Weight Training".into()),
                ..Default::default()
            })
            .await
            .unwrap()
            .id
    }

    fn request(title: &str, trainer_id: i32, date: &str, time: &str) -> SessionRequest {
        SessionRequest {
            title: Some(title.into()),
            trainer_id: Some(FieldValue::Int(trainer_id.into())),
            date: Some(date.into()),
            time: Some(time.into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_double_booking_is_rejected() {
        let pool = test_pool().await;
        let service = SessionService::new(pool.clone());
        let trainer_id = trainer(&pool, "john@fitnessclub.com").await;

        let first = service
            .create_session(request("Strength Training", trainer_id, "2099-01-21", "19:00"))
            .await
            .unwrap();
        assert_eq!(first.duration_minutes, 60);
        assert_eq!(first.capacity, 10);
        assert_eq!(first.enrolled, 0);
        assert_eq!(first.trainer_name.as_deref(), Some("John Smith"));

        let err = service
            .create_session(request("Second Class", trainer_id, "2099-01-21", "19:00"))
            .await
            .unwrap_err();
        match err {
            AppError::Conflict(msg) => assert!(msg.contains("Strength Training")),
            other => panic!("expected conflict, got {other:?}"),
        }

        // 不同时间 / 不同教练不冲突
        service
            .create_session(request("Later Class", trainer_id, "2099-01-21", "20:00"))
            .await
            .unwrap();
        let other_trainer = trainer(&pool, "mike@fitnessclub.com").await;
        service
            .create_session(request("Parallel Class", other_trainer, "2099-01-21", "19:00"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_slot_can_be_reused() {
        let pool = test_pool().await;
        let service = SessionService::new(pool.clone());
        let trainer_id = trainer(&pool, "john@fitnessclub.com").await;

        let first = service
            .create_session(request("Morning Yoga", trainer_id, "2099-01-20", "08:00"))
            .await
            .unwrap();

        let mut cancel = request("Morning Yoga", trainer_id, "2099-01-20", "08:00");
        cancel.status = Some("cancelled".into());
        let cancelled = service.update_session(first.id, cancel).await.unwrap();
        assert_eq!(cancelled.status, SessionStatus::Cancelled);

        let replacement = service
            .create_session(request("Replacement Yoga", trainer_id, "2099-01-20", "08:00"))
            .await
            .unwrap();
        assert_eq!(replacement.status, SessionStatus::Active);

        // 原课程不能再恢复为 active
        let err = service
            .update_session(
                first.id,
                request("Morning Yoga", trainer_id, "2099-01-20", "08:00"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_excludes_itself() {
        let pool = test_pool().await;
        let service = SessionService::new(pool.clone());
        let trainer_id = trainer(&pool, "john@fitnessclub.com").await;
        let session = service
            .create_session(request("HIIT Workout", trainer_id, "2099-01-20", "18:00"))
            .await
            .unwrap();

        let mut req = request("HIIT Workout+", trainer_id, "2099-01-20", "18:00");
        req.capacity = Some("12".into());
        req.duration_minutes = Some("45".into());
        let updated = service.update_session(session.id, req).await.unwrap();
        assert_eq!(updated.title, "HIIT Workout+");
        assert_eq!(updated.capacity, 12);
        assert_eq!(updated.duration_minutes, 45);

        let err = service
            .update_session(
                session.id + 99,
                request("Ghost", trainer_id, "2099-01-20", "18:00"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_create_validates_against_clock_and_trainer() {
        let pool = test_pool().await;
        let service = SessionService::new(pool.clone());
        let trainer_id = trainer(&pool, "john@fitnessclub.com").await;
        let now = NaiveDate::from_ymd_opt(2025, 1, 20)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();

        let err = service
            .create_session_at(request("Too Late", trainer_id, "2025-01-20", "08:00"), now)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        service
            .create_session_at(request("On Time", trainer_id, "2025-01-20", "09:30"), now)
            .await
            .unwrap();

        let err = service
            .create_session(request("No Trainer", trainer_id + 50, "2099-01-20", "08:00"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_list_and_export() {
        let pool = test_pool().await;
        let service = SessionService::new(pool.clone());
        let trainer_id = trainer(&pool, "john@fitnessclub.com").await;
        service
            .create_session(request("Evening Pilates", trainer_id, "2099-01-22", "17:30"))
            .await
            .unwrap();
        let early = service
            .create_session(request("Morning Yoga", trainer_id, "2099-01-20", "08:00"))
            .await
            .unwrap();
        service.cancel_session(early.id).await.unwrap();

        let all = service.list_sessions(&SessionQuery::default()).await.unwrap();
        let titles: Vec<_> = all.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Morning Yoga", "Evening Pilates"]);

        let active = service
            .list_sessions(&SessionQuery {
                status: Some("active".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(active.len(), 1);

        let on_date = service
            .list_sessions(&SessionQuery {
                date: Some("2099-01-20".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(on_date.len(), 1);
        assert_eq!(on_date[0].time, "08:00");

        let csv = String::from_utf8(service.export_sessions().await.unwrap()).unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "ID,Title,Trainer,Date,Time,Duration (Minutes),Capacity,Enrolled,Status"
        );
        assert_eq!(
            lines[1],
            format!("{},Morning Yoga,John Smith,2099-01-20,08:00,60,10,0,cancelled", early.id)
        );
    }

    #[tokio::test]
    async fn test_delete_session() {
        let pool = test_pool().await;
        let service = SessionService::new(pool.clone());
        let trainer_id = trainer(&pool, "john@fitnessclub.com").await;
        let session = service
            .create_session(request("Morning Yoga", trainer_id, "2099-01-20", "08:00"))
            .await
            .unwrap();
        service.delete_session(session.id).await.unwrap();
        assert!(matches!(
            service.get_session(session.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
