use actix_web::{HttpResponse, ResponseError, Result, web};

use super::common::{Payload, csv_response, payload};
use crate::models::*;
use crate::services::MemberService;

#[utoipa::path(
    get,
    path = "/members",
    tag = "member",
    params(
        ("search" = Option<String>, Query, description = "姓名 / 邮箱 / 电话子串"),
        ("status" = Option<String>, Query, description = "active | inactive"),
        ("plan_id" = Option<String>, Query, description = "套餐 ID")
    ),
    responses(
        (status = 200, description = "会员列表", body = [MemberResponse]),
        (status = 400, description = "过滤参数错误")
    )
)]
pub async fn list_members(
    member_service: web::Data<MemberService>,
    query: web::Query<MemberQuery>,
) -> Result<HttpResponse> {
    match member_service.list_members(&query).await {
        Ok(members) => Ok(HttpResponse::Ok().json(ApiResponse::list(members, "members"))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/members/{id}",
    tag = "member",
    params(("id" = i32, Path, description = "会员 ID")),
    responses(
        (status = 200, description = "会员详情", body = MemberDetailResponse),
        (status = 404, description = "会员不存在")
    )
)]
pub async fn get_member(
    member_service: web::Data<MemberService>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    match member_service.get_member(path.into_inner()).await {
        Ok(member) => Ok(HttpResponse::Ok().json(ApiResponse::success(member))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/members",
    tag = "member",
    request_body = MemberRequest,
    responses(
        (status = 201, description = "会员创建成功", body = MemberResponse),
        (status = 400, description = "请求参数错误"),
        (status = 409, description = "邮箱已存在")
    )
)]
pub async fn create_member(
    member_service: web::Data<MemberService>,
    body: Payload<MemberRequest>,
) -> Result<HttpResponse> {
    match member_service.create_member(payload(body)).await {
        Ok(member) => {
            let message = format!("Member {} added successfully", member.name);
            Ok(HttpResponse::Created().json(ApiResponse::success_with_message(member, message)))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/members/{id}",
    tag = "member",
    params(("id" = i32, Path, description = "会员 ID")),
    request_body = MemberRequest,
    responses(
        (status = 200, description = "会员更新成功", body = MemberResponse),
        (status = 400, description = "请求参数错误"),
        (status = 404, description = "会员不存在"),
        (status = 409, description = "邮箱已被其他会员使用")
    )
)]
pub async fn update_member(
    member_service: web::Data<MemberService>,
    path: web::Path<i32>,
    body: Payload<MemberRequest>,
) -> Result<HttpResponse> {
    match member_service
        .update_member(path.into_inner(), payload(body))
        .await
    {
        Ok(member) => {
            let message = format!("Member {} updated successfully", member.name);
            Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(member, message)))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/members/{id}",
    tag = "member",
    params(("id" = i32, Path, description = "会员 ID")),
    responses(
        (status = 200, description = "会员已删除"),
        (status = 404, description = "会员不存在")
    )
)]
pub async fn delete_member(
    member_service: web::Data<MemberService>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let member_id = path.into_inner();
    match member_service.delete_member(member_id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::message(format!(
            "Member {member_id} deleted successfully"
        )))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/members/export",
    tag = "member",
    responses(
        (status = 200, description = "会员 CSV", content_type = "text/csv", body = String)
    )
)]
pub async fn export_members(member_service: web::Data<MemberService>) -> Result<HttpResponse> {
    match member_service.export_members().await {
        Ok(csv) => Ok(csv_response("members", csv)),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn member_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/members")
            .route("", web::get().to(list_members))
            .route("", web::post().to(create_member))
            .route("/export", web::get().to(export_members))
            .route("/{id}", web::get().to(get_member))
            .route("/{id}", web::put().to(update_member))
            .route("/{id}", web::delete().to(delete_member)),
    );
}
