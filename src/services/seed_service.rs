use crate::entities::{
    EnrollmentStatus, MemberStatus, SessionStatus, TrainerStatus, member_entity as members,
    plan_entity as plans, session_enrollment_entity as enrollments, session_entity as sessions,
    trainer_entity as trainers,
};
use crate::error::{AppError, AppResult};
use crate::services::enrollment_service::refresh_enrolled_count;
use chrono::{Days, Local, NaiveDate, NaiveTime};
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait, Set, TransactionTrait,
};

/// (name, description, price_cents, duration_months, features)
const DEMO_PLANS: [(&str, &str, i64, i32, &str); 3] = [
    (
        "Basic Plan",
        "Access to gym equipment and basic facilities",
        2999,
        1,
        "Gym Access,Locker Room,Basic Equipment",
    ),
    (
        "Premium Plan",
        "Full access including group classes and personal training",
        5999,
        1,
        "Gym Access,Group Classes,Personal Training,Nutrition Guidance",
    ),
    (
        "Annual Plan",
        "Full year membership with all benefits",
        59999,
        12,
        "Gym Access,Group Classes,Personal Training,Nutrition Guidance,Member Events",
    ),
];

/// (name, email, phone, specialization, experience_years, bio)
const DEMO_TRAINERS: [(&str, &str, &str, &str, i32, &str); 3] = [
    (
        "John Smith",
        "john.smith@fitnessclub.com",
        "555-0101",
        "Weight Training",
        5,
        "Certified personal trainer specializing in strength and conditioning.",
    ),
    (
        "Sarah Johnson",
        "sarah.johnson@fitnessclub.com",
        "555-0102",
        "Yoga & Pilates",
        8,
        "Yoga instructor with expertise in mindfulness and flexibility training.",
    ),
    (
        "Mike Wilson",
        "mike.wilson@fitnessclub.com",
        "555-0103",
        "HIIT & Cardio",
        3,
        "High-intensity training specialist focused on cardiovascular fitness.",
    ),
];

/// (name, email, phone, join_date, plan index)
const DEMO_MEMBERS: [(&str, &str, &str, (i32, u32, u32), usize); 4] = [
    ("Alice Brown", "alice.brown@email.com", "555-1001", (2024, 1, 15), 1),
    ("Bob Davis", "bob.davis@email.com", "555-1002", (2024, 2, 20), 0),
    ("Carol White", "carol.white@email.com", "555-1003", (2024, 3, 10), 2),
    ("David Green", "david.green@email.com", "555-1004", (2024, 12, 1), 1),
];

/// (title, description, trainer index, days from today, (hour, minute), duration, capacity, member indexes)
type DemoSession = (
    &'static str,
    &'static str,
    usize,
    u64,
    (u32, u32),
    i32,
    i32,
    &'static [usize],
);

const DEMO_SESSIONS: [DemoSession; 4] = [
    (
        "Morning Yoga",
        "Relaxing morning yoga session for all levels",
        1,
        1,
        (8, 0),
        60,
        15,
        &[0, 1, 2, 3],
    ),
    (
        "HIIT Workout",
        "High-intensity interval training for maximum results",
        2,
        1,
        (18, 0),
        45,
        12,
        &[0, 1, 2, 3],
    ),
    (
        "Strength Training",
        "Weight training fundamentals with proper form",
        0,
        2,
        (19, 0),
        60,
        8,
        &[0, 1, 2],
    ),
    (
        "Evening Pilates",
        "Core strengthening and flexibility workout",
        1,
        3,
        (17, 30),
        60,
        10,
        &[0, 1, 3],
    ),
];

#[derive(Clone)]
pub struct SeedService {
    pool: DatabaseConnection,
}

impl SeedService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 写入演示数据；套餐表非空时跳过并返回 false
    pub async fn seed_demo_data(&self) -> AppResult<bool> {
        let txn = self.pool.begin().await?;
        if plans::Entity::find().count(&txn).await? > 0 {
            log::info!("Demo data skipped: plans table is not empty");
            return Ok(false);
        }
        let today = Local::now().date_naive();

        let mut plan_ids = Vec::with_capacity(DEMO_PLANS.len());
        for (name, description, price_cents, duration_months, features) in DEMO_PLANS {
            let plan = plans::ActiveModel {
                name: Set(name.to_string()),
                description: Set(Some(description.to_string())),
                price_cents: Set(price_cents),
                duration_months: Set(duration_months),
                features: Set(Some(features.to_string())),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            plan_ids.push(plan.id);
        }

        let mut trainer_ids = Vec::with_capacity(DEMO_TRAINERS.len());
        for (name, email, phone, specialization, experience_years, bio) in DEMO_TRAINERS {
            let trainer = trainers::ActiveModel {
                name: Set(name.to_string()),
                email: Set(email.to_string()),
                phone: Set(Some(phone.to_string())),
                specialization: Set(Some(specialization.to_string())),
                experience_years: Set(Some(experience_years)),
                bio: Set(Some(bio.to_string())),
                status: Set(TrainerStatus::Active),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            trainer_ids.push(trainer.id);
        }

        let mut member_ids = Vec::with_capacity(DEMO_MEMBERS.len());
        for (name, email, phone, (y, m, d), plan_idx) in DEMO_MEMBERS {
            let join_date = NaiveDate::from_ymd_opt(y, m, d)
                .ok_or_else(|| AppError::InternalError(format!("Invalid seed date for {name}")))?;
            let member = members::ActiveModel {
                name: Set(name.to_string()),
                email: Set(email.to_string()),
                phone: Set(Some(phone.to_string())),
                join_date: Set(join_date),
                plan_id: Set(Some(plan_ids[plan_idx])),
                status: Set(MemberStatus::Active),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            member_ids.push(member.id);
        }

        let mut enrollment_total = 0;
        for (title, description, trainer_idx, days, (h, min), duration, capacity, attendees) in
            DEMO_SESSIONS
        {
            let date = today
                .checked_add_days(Days::new(days))
                .ok_or_else(|| AppError::InternalError("Seed date overflow".to_string()))?;
            let time = NaiveTime::from_hms_opt(h, min, 0)
                .ok_or_else(|| AppError::InternalError(format!("Invalid seed time for {title}")))?;
            let session = sessions::ActiveModel {
                title: Set(title.to_string()),
                description: Set(Some(description.to_string())),
                trainer_id: Set(trainer_ids[trainer_idx]),
                date: Set(date),
                time: Set(time),
                duration_minutes: Set(duration),
                capacity: Set(capacity),
                enrolled: Set(0),
                status: Set(SessionStatus::Active),
                ..Default::default()
            }
            .insert(&txn)
            .await?;

            for &member_idx in attendees {
                enrollments::ActiveModel {
                    session_id: Set(session.id),
                    member_id: Set(member_ids[member_idx]),
                    enrollment_date: Set(today),
                    status: Set(EnrollmentStatus::Enrolled),
                    ..Default::default()
                }
                .insert(&txn)
                .await?;
                enrollment_total += 1;
            }
            refresh_enrolled_count(&txn, session.id).await?;
        }

        txn.commit().await?;
        log::info!(
            "Seeded demo data: {} plans, {} trainers, {} members, {} sessions, {} enrollments",
            plan_ids.len(),
            trainer_ids.len(),
            member_ids.len(),
            DEMO_SESSIONS.len(),
            enrollment_total
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;
    use crate::models::SessionQuery;
    use crate::services::{DashboardService, SessionService};

    #[tokio::test]
    async fn test_seed_once() {
        let pool = test_pool().await;
        let service = SeedService::new(pool.clone());
        assert!(service.seed_demo_data().await.unwrap());
        assert!(!service.seed_demo_data().await.unwrap());

        assert_eq!(plans::Entity::find().count(&pool).await.unwrap(), 3);
        assert_eq!(enrollments::Entity::find().count(&pool).await.unwrap(), 14);

        let sessions = SessionService::new(pool.clone())
            .list_sessions(&SessionQuery::default())
            .await
            .unwrap();
        let enrolled: Vec<_> = sessions.iter().map(|s| s.enrolled).collect();
        assert_eq!(enrolled, vec![4, 4, 3, 3]);
        assert!(sessions.iter().all(|s| s.date > Local::now().date_naive()));

        let stats = DashboardService::new(pool).get_stats().await.unwrap();
        assert_eq!(stats.total_active_members, 4);
        assert_eq!(stats.active_trainers_count, 3);
        // 59.99 * 2 + 29.99 + 599.99
        assert_eq!(stats.monthly_revenue.to_string(), "749.96");
    }
}
