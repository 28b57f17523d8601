use actix_web::{HttpResponse, ResponseError, Result, web};

use super::common::{Payload, csv_response, payload};
use super::enrollment;
use crate::models::*;
use crate::services::SessionService;

#[utoipa::path(
    get,
    path = "/sessions",
    tag = "session",
    params(
        ("trainer_id" = Option<String>, Query, description = "教练 ID"),
        ("status" = Option<String>, Query, description = "active | cancelled"),
        ("date" = Option<String>, Query, description = "YYYY-MM-DD")
    ),
    responses(
        (status = 200, description = "课程列表", body = [SessionResponse]),
        (status = 400, description = "过滤参数错误")
    )
)]
pub async fn list_sessions(
    session_service: web::Data<SessionService>,
    query: web::Query<SessionQuery>,
) -> Result<HttpResponse> {
    match session_service.list_sessions(&query).await {
        Ok(sessions) => Ok(HttpResponse::Ok().json(ApiResponse::list(sessions, "sessions"))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/sessions/{id}",
    tag = "session",
    params(("id" = i32, Path, description = "课程 ID")),
    responses(
        (status = 200, description = "课程详情（含报名记录）", body = SessionDetailResponse),
        (status = 404, description = "课程不存在")
    )
)]
pub async fn get_session(
    session_service: web::Data<SessionService>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    match session_service.get_session(path.into_inner()).await {
        Ok(session) => Ok(HttpResponse::Ok().json(ApiResponse::success(session))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/sessions",
    tag = "session",
    request_body = SessionRequest,
    responses(
        (status = 201, description = "课程排期成功", body = SessionResponse),
        (status = 400, description = "请求参数错误"),
        (status = 409, description = "教练该时段已有课程")
    )
)]
pub async fn create_session(
    session_service: web::Data<SessionService>,
    body: Payload<SessionRequest>,
) -> Result<HttpResponse> {
    match session_service.create_session(payload(body)).await {
        Ok(session) => {
            let message = format!("Session {} scheduled successfully", session.title);
            Ok(HttpResponse::Created().json(ApiResponse::success_with_message(session, message)))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/sessions/{id}",
    tag = "session",
    params(("id" = i32, Path, description = "课程 ID")),
    request_body = SessionRequest,
    responses(
        (status = 200, description = "课程更新成功", body = SessionResponse),
        (status = 400, description = "请求参数错误"),
        (status = 404, description = "课程不存在"),
        (status = 409, description = "教练该时段已有课程")
    )
)]
pub async fn update_session(
    session_service: web::Data<SessionService>,
    path: web::Path<i32>,
    body: Payload<SessionRequest>,
) -> Result<HttpResponse> {
    match session_service
        .update_session(path.into_inner(), payload(body))
        .await
    {
        Ok(session) => {
            let message = format!("Session {} updated successfully", session.title);
            Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(session, message)))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/sessions/{id}/cancel",
    tag = "session",
    params(("id" = i32, Path, description = "课程 ID")),
    responses(
        (status = 200, description = "课程已取消", body = SessionResponse),
        (status = 404, description = "课程不存在")
    )
)]
pub async fn cancel_session(
    session_service: web::Data<SessionService>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    match session_service.cancel_session(path.into_inner()).await {
        Ok(session) => {
            let message = format!("Session {} cancelled", session.title);
            Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(session, message)))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/sessions/{id}",
    tag = "session",
    params(("id" = i32, Path, description = "课程 ID")),
    responses(
        (status = 200, description = "课程已删除"),
        (status = 404, description = "课程不存在")
    )
)]
pub async fn delete_session(
    session_service: web::Data<SessionService>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let session_id = path.into_inner();
    match session_service.delete_session(session_id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::message(format!(
            "Session {session_id} deleted successfully"
        )))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/sessions/export",
    tag = "session",
    responses(
        (status = 200, description = "课程 CSV", content_type = "text/csv", body = String)
    )
)]
pub async fn export_sessions(session_service: web::Data<SessionService>) -> Result<HttpResponse> {
    match session_service.export_sessions().await {
        Ok(csv) => Ok(csv_response("sessions", csv)),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn session_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/sessions")
            .route("", web::get().to(list_sessions))
            .route("", web::post().to(create_session))
            // 旧版接口路径
            .route("/schedule", web::post().to(create_session))
            .route("/export", web::get().to(export_sessions))
            .route("/{id}", web::get().to(get_session))
            .route("/{id}", web::put().to(update_session))
            .route("/{id}", web::delete().to(delete_session))
            .route("/{id}/cancel", web::post().to(cancel_session))
            .route(
                "/{id}/enrollments",
                web::get().to(enrollment::list_session_enrollments),
            )
            .route("/{id}/enrollments", web::post().to(enrollment::enroll_member)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;
    use crate::handlers::common::payload_config;
    use crate::services::{EnrollmentService, MemberService, TrainerService};
    use actix_web::{App, http::StatusCode, test};

    #[actix_web::test]
    async fn test_schedule_enroll_and_cancel() {
        let pool = test_pool().await;
        let trainer = TrainerService::new(pool.clone())
            .create_trainer(TrainerRequest {
                name: Some("Sarah Johnson".into()),
                email: Some("sarah.johnson@fitnessclub.com".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        let member = MemberService::new(pool.clone())
            .create_member(MemberRequest {
                name: Some("Alice Brown".into()),
                email: Some("alice.brown@email.com".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        let app = test::init_service(
            App::new()
                .configure(payload_config)
                .app_data(web::Data::new(SessionService::new(pool.clone())))
                .app_data(web::Data::new(EnrollmentService::new(pool)))
                .service(web::scope("/api").configure(session_config)),
        )
        .await;

        let trainer_id = trainer.id.to_string();
        let form = [
            ("title", "Morning Yoga"),
            ("trainer_id", trainer_id.as_str()),
            ("date", "2099-01-20"),
            ("time", "08:00"),
            ("capacity", "15"),
        ];
        let req = test::TestRequest::post()
            .uri("/api/sessions/schedule")
            .set_form(form)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: serde_json::Value = test::read_body_json(resp).await;
        let session_id = body["data"]["id"].as_i64().unwrap();
        assert_eq!(body["data"]["time"], "08:00");

        let req = test::TestRequest::post()
            .uri("/api/sessions")
            .set_form(form)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let req = test::TestRequest::post()
            .uri(&format!("/api/sessions/{session_id}/enrollments"))
            .set_json(serde_json::json!({ "member_id": member.id }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let req = test::TestRequest::get()
            .uri(&format!("/api/sessions/{session_id}"))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["enrolled"], 1);
        assert_eq!(body["data"]["enrollments"][0]["member_name"], "Alice Brown");

        let req = test::TestRequest::post()
            .uri(&format!("/api/sessions/{session_id}/cancel"))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["status"], "cancelled");

        let req = test::TestRequest::post()
            .uri("/api/sessions")
            .set_form(form)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }
}
