use actix_web::{HttpResponse, ResponseError, Result, web};

use super::common::{Payload, payload};
use crate::models::*;
use crate::services::EnrollmentService;

#[utoipa::path(
    get,
    path = "/sessions/{id}/enrollments",
    tag = "enrollment",
    params(("id" = i32, Path, description = "课程 ID")),
    responses(
        (status = 200, description = "课程报名列表", body = [EnrollmentResponse]),
        (status = 404, description = "课程不存在")
    )
)]
pub async fn list_session_enrollments(
    enrollment_service: web::Data<EnrollmentService>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    match enrollment_service.list_for_session(path.into_inner()).await {
        Ok(items) => Ok(HttpResponse::Ok().json(ApiResponse::list(items, "enrollments"))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/sessions/{id}/enrollments",
    tag = "enrollment",
    params(("id" = i32, Path, description = "课程 ID")),
    request_body = EnrollRequest,
    responses(
        (status = 201, description = "报名成功", body = EnrollmentResponse),
        (status = 400, description = "课程已取消或会员未激活"),
        (status = 404, description = "课程或会员不存在"),
        (status = 409, description = "重复报名")
    )
)]
pub async fn enroll_member(
    enrollment_service: web::Data<EnrollmentService>,
    path: web::Path<i32>,
    body: Payload<EnrollRequest>,
) -> Result<HttpResponse> {
    let member_id = match payload(body).member_id() {
        Ok(id) => id,
        Err(e) => return Ok(e.error_response()),
    };
    match enrollment_service.enroll(path.into_inner(), member_id).await {
        Ok(enrollment) => Ok(HttpResponse::Created().json(ApiResponse::success_with_message(
            enrollment,
            "Member enrolled successfully".to_string(),
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/enrollments/{id}",
    tag = "enrollment",
    params(("id" = i32, Path, description = "报名记录 ID")),
    request_body = EnrollmentStatusRequest,
    responses(
        (status = 200, description = "状态已更新", body = EnrollmentResponse),
        (status = 400, description = "状态无效"),
        (status = 404, description = "报名记录不存在")
    )
)]
pub async fn update_enrollment_status(
    enrollment_service: web::Data<EnrollmentService>,
    path: web::Path<i32>,
    body: Payload<EnrollmentStatusRequest>,
) -> Result<HttpResponse> {
    let status = match payload(body).status() {
        Ok(status) => status,
        Err(e) => return Ok(e.error_response()),
    };
    match enrollment_service
        .set_status(path.into_inner(), status)
        .await
    {
        Ok(enrollment) => Ok(HttpResponse::Ok().json(ApiResponse::success(enrollment))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/enrollments/{id}",
    tag = "enrollment",
    params(("id" = i32, Path, description = "报名记录 ID")),
    responses(
        (status = 200, description = "已退出课程"),
        (status = 404, description = "报名记录不存在")
    )
)]
pub async fn withdraw_enrollment(
    enrollment_service: web::Data<EnrollmentService>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let enrollment_id = path.into_inner();
    match enrollment_service.withdraw(enrollment_id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::message(format!(
            "Enrollment {enrollment_id} removed"
        )))),
        Err(e) => Ok(e.error_response()),
    }
}

/// /sessions/{id}/enrollments 挂在课程路由下，见 session_config
pub fn enrollment_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/enrollments")
            .route("/{id}", web::put().to(update_enrollment_status))
            .route("/{id}", web::delete().to(withdraw_enrollment)),
    );
}
