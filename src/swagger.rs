use actix_web::web;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{EnrollmentStatus, MemberStatus, SessionStatus, TrainerStatus};
use crate::handlers;
use crate::models::*;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::member::list_members,
        handlers::member::get_member,
        handlers::member::create_member,
        handlers::member::update_member,
        handlers::member::delete_member,
        handlers::member::export_members,
        handlers::plan::list_plans,
        handlers::plan::get_plan,
        handlers::plan::create_plan,
        handlers::plan::update_plan,
        handlers::plan::delete_plan,
        handlers::plan::export_plans,
        handlers::trainer::list_trainers,
        handlers::trainer::get_trainer,
        handlers::trainer::create_trainer,
        handlers::trainer::update_trainer,
        handlers::trainer::delete_trainer,
        handlers::trainer::export_trainers,
        handlers::session::list_sessions,
        handlers::session::get_session,
        handlers::session::create_session,
        handlers::session::update_session,
        handlers::session::cancel_session,
        handlers::session::delete_session,
        handlers::session::export_sessions,
        handlers::enrollment::list_session_enrollments,
        handlers::enrollment::enroll_member,
        handlers::enrollment::update_enrollment_status,
        handlers::enrollment::withdraw_enrollment,
        handlers::dashboard::get_stats,
        handlers::dashboard::get_overview,
        handlers::dashboard::health,
    ),
    components(
        schemas(
            MemberStatus,
            TrainerStatus,
            SessionStatus,
            EnrollmentStatus,
            MemberQuery,
            MemberRequest,
            MemberResponse,
            MemberDetailResponse,
            PlanRequest,
            PlanResponse,
            PlanDetailResponse,
            TrainerQuery,
            TrainerRequest,
            TrainerResponse,
            TrainerDetailResponse,
            SessionQuery,
            SessionRequest,
            SessionResponse,
            SessionDetailResponse,
            EnrollRequest,
            EnrollmentStatusRequest,
            EnrollmentResponse,
            DashboardStats,
            DashboardOverview,
        )
    ),
    tags(
        (name = "member", description = "Member management API"),
        (name = "plan", description = "Membership plan API"),
        (name = "trainer", description = "Trainer management API"),
        (name = "session", description = "Session scheduling API"),
        (name = "enrollment", description = "Session enrollment API"),
        (name = "dashboard", description = "Dashboard and health API"),
    ),
    info(
        title = "FitClub Backend API",
        version = "1.0.0",
        description = "Fitness club membership management REST API"
    ),
    servers(
        (url = "/api", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
