use std::collections::HashMap;

use crate::entities::{
    SessionStatus, TrainerStatus, session_entity as sessions, trainer_entity as trainers,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::session_service::not_started;
use crate::utils::{non_empty, search_term, write_csv};
use chrono::{Local, NaiveDateTime};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    FromQueryResult, IntoActiveModel, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};

pub const TRAINER_CSV_HEADERS: [&str; 8] = [
    "ID",
    "Name",
    "Email",
    "Phone",
    "Specialization",
    "Experience (Years)",
    "Status",
    "Sessions",
];

#[derive(Debug, FromQueryResult)]
struct TrainerSessionCount {
    trainer_id: i32,
    count: i64,
}

#[derive(Clone)]
pub struct TrainerService {
    pool: DatabaseConnection,
}

impl TrainerService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 教练列表，按姓名排序；search / specialization 区分大小写
    pub async fn list_trainers(&self, query: &TrainerQuery) -> AppResult<Vec<TrainerResponse>> {
        let mut select = trainers::Entity::find();

        let search = search_term(query.search.as_deref());
        if let Some(search) = search {
            select = select.filter(trainers::Column::Name.contains(search));
        }
        let specialization = search_term(query.specialization.as_deref());
        if let Some(specialization) = specialization {
            select = select.filter(trainers::Column::Specialization.contains(specialization));
        }
        if let Some(status) = non_empty(query.status.as_deref()) {
            let status: TrainerStatus = status.parse().map_err(AppError::ValidationError)?;
            select = select.filter(trainers::Column::Status.eq(status));
        }

        let rows = select
            .order_by_asc(trainers::Column::Name)
            .order_by_asc(trainers::Column::Id)
            .all(&self.pool)
            .await?;
        let counts = session_counts(&self.pool).await?;

        Ok(rows
            .into_iter()
            .filter(|t| search.is_none_or(|s| t.name.contains(s)))
            .filter(|t| {
                specialization.is_none_or(|s| {
                    t.specialization.as_deref().is_some_and(|v| v.contains(s))
                })
            })
            .map(|t| {
                let count = counts.get(&t.id).copied().unwrap_or(0);
                TrainerResponse::new(t, count)
            })
            .collect())
    }

    /// 教练详情，附带今天起的 active 课程
    pub async fn get_trainer(&self, trainer_id: i32) -> AppResult<TrainerDetailResponse> {
        self.get_trainer_at(trainer_id, Local::now().naive_local())
            .await
    }

    async fn get_trainer_at(
        &self,
        trainer_id: i32,
        now: NaiveDateTime,
    ) -> AppResult<TrainerDetailResponse> {
        let trainer = trainers::Entity::find_by_id(trainer_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| trainer_not_found(trainer_id))?;

        let sessions_count = sessions::Entity::find()
            .filter(sessions::Column::TrainerId.eq(trainer.id))
            .count(&self.pool)
            .await?;
        let upcoming = sessions::Entity::find()
            .filter(sessions::Column::TrainerId.eq(trainer.id))
            .filter(sessions::Column::Status.eq(SessionStatus::Active))
            .filter(not_started(now))
            .order_by_asc(sessions::Column::Date)
            .order_by_asc(sessions::Column::Time)
            .all(&self.pool)
            .await?;
        let upcoming_sessions = upcoming
            .into_iter()
            .map(|s| SessionResponse::new(s, Some(&trainer)))
            .collect();

        Ok(TrainerDetailResponse {
            trainer: TrainerResponse::new(trainer, sessions_count as i64),
            upcoming_sessions,
        })
    }

    pub async fn create_trainer(&self, request: TrainerRequest) -> AppResult<TrainerResponse> {
        let input = request.validate()?;

        let txn = self.pool.begin().await?;
        ensure_email_available(&txn, &input.email, None).await?;
        let trainer = trainers::ActiveModel {
            name: Set(input.name),
            email: Set(input.email),
            phone: Set(input.phone),
            specialization: Set(input.specialization),
            experience_years: Set(input.experience_years),
            bio: Set(input.bio),
            status: Set(input.status),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;

        log::info!("Created trainer {} <{}>", trainer.id, trainer.email);
        Ok(TrainerResponse::new(trainer, 0))
    }

    pub async fn update_trainer(
        &self,
        trainer_id: i32,
        request: TrainerRequest,
    ) -> AppResult<TrainerResponse> {
        let input = request.validate()?;

        let txn = self.pool.begin().await?;
        let existing = trainers::Entity::find_by_id(trainer_id)
            .one(&txn)
            .await?
            .ok_or_else(|| trainer_not_found(trainer_id))?;
        ensure_email_available(&txn, &input.email, Some(trainer_id)).await?;

        let mut model = existing.into_active_model();
        model.name = Set(input.name);
        model.email = Set(input.email);
        model.phone = Set(input.phone);
        model.specialization = Set(input.specialization);
        model.experience_years = Set(input.experience_years);
        model.bio = Set(input.bio);
        model.status = Set(input.status);
        let trainer = model.update(&txn).await?;

        let sessions_count = sessions::Entity::find()
            .filter(sessions::Column::TrainerId.eq(trainer.id))
            .count(&txn)
            .await?;
        txn.commit().await?;

        log::info!("Updated trainer {}", trainer.id);
        Ok(TrainerResponse::new(trainer, sessions_count as i64))
    }

    /// 仍有课程（含已取消）时拒绝删除
    pub async fn delete_trainer(&self, trainer_id: i32) -> AppResult<()> {
        let txn = self.pool.begin().await?;
        let trainer = trainers::Entity::find_by_id(trainer_id)
            .one(&txn)
            .await?
            .ok_or_else(|| trainer_not_found(trainer_id))?;

        let scheduled = sessions::Entity::find()
            .filter(sessions::Column::TrainerId.eq(trainer.id))
            .count(&txn)
            .await?;
        if scheduled > 0 {
            return Err(AppError::Conflict(format!(
                "Cannot delete trainer \"{}\": {} {} assigned",
                trainer.name,
                scheduled,
                if scheduled == 1 { "session is" } else { "sessions are" }
            )));
        }

        let name = trainer.name.clone();
        trainer.delete(&txn).await?;
        txn.commit().await?;

        log::info!("Deleted trainer {trainer_id} ({name})");
        Ok(())
    }

    pub async fn export_trainers(&self) -> AppResult<Vec<u8>> {
        let rows = trainers::Entity::find()
            .order_by_asc(trainers::Column::Id)
            .all(&self.pool)
            .await?;
        let counts = session_counts(&self.pool).await?;

        write_csv(
            &TRAINER_CSV_HEADERS,
            rows.into_iter().map(|t| {
                vec![
                    t.id.to_string(),
                    t.name,
                    t.email,
                    t.phone.unwrap_or_default(),
                    t.specialization.unwrap_or_default(),
                    t.experience_years.map(|y| y.to_string()).unwrap_or_default(),
                    t.status.to_string(),
                    counts.get(&t.id).copied().unwrap_or(0).to_string(),
                ]
            }),
        )
    }
}

fn trainer_not_found(trainer_id: i32) -> AppError {
    AppError::NotFound(format!("Trainer {trainer_id} not found"))
}

/// 各教练名下课程数 (trainer_id -> count)
async fn session_counts<C: ConnectionTrait>(db: &C) -> AppResult<HashMap<i32, i64>> {
    let rows = sessions::Entity::find()
        .select_only()
        .column(sessions::Column::TrainerId)
        .column_as(Expr::col(sessions::Column::Id).count(), "count")
        .group_by(sessions::Column::TrainerId)
        .into_model::<TrainerSessionCount>()
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|r| (r.trainer_id, r.count)).collect())
}

async fn ensure_email_available<C: ConnectionTrait>(
    db: &C,
    email: &str,
    exclude_id: Option<i32>,
) -> AppResult<()> {
    let mut select = trainers::Entity::find().filter(trainers::Column::Email.eq(email));
    if let Some(id) = exclude_id {
        select = select.filter(trainers::Column::Id.ne(id));
    }
    if select.one(db).await?.is_some() {
        return Err(AppError::Conflict(format!(
            "A trainer with email {email} already exists"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;
    use crate::services::SessionService;
    use crate::utils::FieldValue;

    fn trainer_request(name: &str, email: &str, specialization: &str) -> TrainerRequest {
        TrainerRequest {
            name: Some(name.into()),
            email: Some(email.into()),
            phone: Some("555-0101".into()),
            specialization: Some(specialization.into()),
            experience_years: Some(FieldValue::Int(5)),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_conflict() {
        let pool = test_pool().await;
        let service = TrainerService::new(pool.clone());
        let sarah = service
            .create_trainer(trainer_request(
                "Sarah Johnson",
                "sarah@fitnessclub.com",
                "Yoga & Pilates",
            ))
            .await
            .unwrap();
        let mike = service
            .create_trainer(trainer_request(
                "Mike Wilson",
                "mike@fitnessclub.com",
                "HIIT & Cardio",
            ))
            .await
            .unwrap();

        let err = service
            .create_trainer(trainer_request("Sarah Two", "sarah@fitnessclub.com", "Yoga"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let err = service
            .update_trainer(
                mike.id,
                trainer_request("Mike Wilson", "sarah@fitnessclub.com", "HIIT"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let mut req = trainer_request("Sarah J.", "sarah@fitnessclub.com", "Yoga");
        req.status = Some("inactive".into());
        let updated = service.update_trainer(sarah.id, req).await.unwrap();
        assert_eq!(updated.name, "Sarah J.");
        assert_eq!(updated.status, TrainerStatus::Inactive);
    }

    #[tokio::test]
    async fn test_list_filters() {
        let pool = test_pool().await;
        let service = TrainerService::new(pool.clone());
        service
            .create_trainer(trainer_request(
                "Sarah Johnson",
                "sarah@fitnessclub.com",
                "Yoga & Pilates",
            ))
            .await
            .unwrap();
        service
            .create_trainer(trainer_request(
                "Mike Wilson",
                "mike@fitnessclub.com",
                "HIIT & Cardio",
            ))
            .await
            .unwrap();

        let all = service.list_trainers(&TrainerQuery::default()).await.unwrap();
        let names: Vec<_> = all.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Mike Wilson", "Sarah Johnson"]);

        let yoga = service
            .list_trainers(&TrainerQuery {
                specialization: Some("Yoga".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(yoga.len(), 1);
        assert_eq!(yoga[0].name, "Sarah Johnson");

        // 区分大小写
        let lower = service
            .list_trainers(&TrainerQuery {
                search: Some("mike".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(lower.is_empty());
    }

    #[tokio::test]
    async fn test_upcoming_skips_sessions_already_started() {
        let pool = test_pool().await;
        let service = TrainerService::new(pool.clone());
        let trainer = service
            .create_trainer(trainer_request("Emma Davis", "emma@fitnessclub.com", "Yoga"))
            .await
            .unwrap();
        let sessions = SessionService::new(pool.clone());
        for (title, date, time) in [
            ("Morning Yoga", "2099-01-20", "08:00"),
            ("Evening Yoga", "2099-01-20", "18:00"),
            ("Noon Stretch", "2099-01-20", "12:00"),
            ("Next Day Yoga", "2099-01-21", "07:00"),
        ] {
            sessions
                .create_session(SessionRequest {
                    title: Some(title.into()),
                    trainer_id: Some(FieldValue::Int(trainer.id.into())),
                    date: Some(date.into()),
                    time: Some(time.into()),
                    ..Default::default()
                })
                .await
                .unwrap();
        }

        let now = NaiveDateTime::parse_from_str("2099-01-20 12:00", "%Y-%m-%d %H:%M").unwrap();
        let detail = service.get_trainer_at(trainer.id, now).await.unwrap();
        assert_eq!(detail.trainer.sessions_count, 4);
        let titles: Vec<_> = detail
            .upcoming_sessions
            .iter()
            .map(|s| s.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Noon Stretch", "Evening Yoga", "Next Day Yoga"]);
    }

    #[tokio::test]
    async fn test_delete_trainer_with_sessions_is_blocked() {
        let pool = test_pool().await;
        let service = TrainerService::new(pool.clone());
        let trainer = service
            .create_trainer(trainer_request(
                "John Smith",
                "john@fitnessclub.com",
                "Weight Training",
            ))
            .await
            .unwrap();
        SessionService::new(pool.clone())
            .create_session(SessionRequest {
                title: Some("Strength Training".into()),
                trainer_id: Some(FieldValue::Int(trainer.id.into())),
                date: Some("2099-01-21".into()),
                time: Some("19:00".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        let err = service.delete_trainer(trainer.id).await.unwrap_err();
        match err {
            AppError::Conflict(msg) => assert_eq!(
                msg,
                "Cannot delete trainer \"John Smith\": 1 session is assigned"
            ),
            other => panic!("expected conflict, got {other:?}"),
        }

        let detail = service.get_trainer(trainer.id).await.unwrap();
        assert_eq!(detail.trainer.sessions_count, 1);
        assert_eq!(detail.upcoming_sessions.len(), 1);

        let csv = String::from_utf8(service.export_trainers().await.unwrap()).unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "ID,Name,Email,Phone,Specialization,Experience (Years),Status,Sessions"
        );
        assert_eq!(
            lines[1],
            format!(
                "{},John Smith,john@fitnessclub.com,555-0101,Weight Training,5,active,1",
                trainer.id
            )
        );
    }

    #[tokio::test]
    async fn test_delete_unknown_trainer() {
        let pool = test_pool().await;
        let service = TrainerService::new(pool);
        assert!(matches!(
            service.delete_trainer(7).await,
            Err(AppError::NotFound(_))
        ));
    }
}
