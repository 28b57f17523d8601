use actix_web::{HttpResponse, ResponseError, Result, web};

use super::common::{Payload, csv_response, payload};
use crate::models::*;
use crate::services::TrainerService;

#[utoipa::path(
    get,
    path = "/trainers",
    tag = "trainer",
    params(
        ("search" = Option<String>, Query, description = "姓名子串"),
        ("specialization" = Option<String>, Query, description = "专长子串"),
        ("status" = Option<String>, Query, description = "active | inactive")
    ),
    responses(
        (status = 200, description = "教练列表", body = [TrainerResponse]),
        (status = 400, description = "过滤参数错误")
    )
)]
pub async fn list_trainers(
    trainer_service: web::Data<TrainerService>,
    query: web::Query<TrainerQuery>,
) -> Result<HttpResponse> {
    match trainer_service.list_trainers(&query).await {
        Ok(trainers) => Ok(HttpResponse::Ok().json(ApiResponse::list(trainers, "trainers"))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/trainers/{id}",
    tag = "trainer",
    params(("id" = i32, Path, description = "教练 ID")),
    responses(
        (status = 200, description = "教练详情", body = TrainerDetailResponse),
        (status = 404, description = "教练不存在")
    )
)]
pub async fn get_trainer(
    trainer_service: web::Data<TrainerService>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    match trainer_service.get_trainer(path.into_inner()).await {
        Ok(trainer) => Ok(HttpResponse::Ok().json(ApiResponse::success(trainer))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/trainers",
    tag = "trainer",
    request_body = TrainerRequest,
    responses(
        (status = 201, description = "教练创建成功", body = TrainerResponse),
        (status = 400, description = "请求参数错误"),
        (status = 409, description = "邮箱已存在")
    )
)]
pub async fn create_trainer(
    trainer_service: web::Data<TrainerService>,
    body: Payload<TrainerRequest>,
) -> Result<HttpResponse> {
    match trainer_service.create_trainer(payload(body)).await {
        Ok(trainer) => {
            let message = format!("Trainer {} added successfully", trainer.name);
            Ok(HttpResponse::Created().json(ApiResponse::success_with_message(trainer, message)))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/trainers/{id}",
    tag = "trainer",
    params(("id" = i32, Path, description = "教练 ID")),
    request_body = TrainerRequest,
    responses(
        (status = 200, description = "教练更新成功", body = TrainerResponse),
        (status = 400, description = "请求参数错误"),
        (status = 404, description = "教练不存在"),
        (status = 409, description = "邮箱已被其他教练使用")
    )
)]
pub async fn update_trainer(
    trainer_service: web::Data<TrainerService>,
    path: web::Path<i32>,
    body: Payload<TrainerRequest>,
) -> Result<HttpResponse> {
    match trainer_service
        .update_trainer(path.into_inner(), payload(body))
        .await
    {
        Ok(trainer) => {
            let message = format!("Trainer {} updated successfully", trainer.name);
            Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(trainer, message)))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/trainers/{id}",
    tag = "trainer",
    params(("id" = i32, Path, description = "教练 ID")),
    responses(
        (status = 200, description = "教练已删除"),
        (status = 404, description = "教练不存在"),
        (status = 409, description = "教练仍有课程")
    )
)]
pub async fn delete_trainer(
    trainer_service: web::Data<TrainerService>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let trainer_id = path.into_inner();
    match trainer_service.delete_trainer(trainer_id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::message(format!(
            "Trainer {trainer_id} deleted successfully"
        )))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/trainers/export",
    tag = "trainer",
    responses(
        (status = 200, description = "教练 CSV", content_type = "text/csv", body = String)
    )
)]
pub async fn export_trainers(trainer_service: web::Data<TrainerService>) -> Result<HttpResponse> {
    match trainer_service.export_trainers().await {
        Ok(csv) => Ok(csv_response("trainers", csv)),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn trainer_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/trainers")
            .route("", web::get().to(list_trainers))
            .route("", web::post().to(create_trainer))
            .route("/export", web::get().to(export_trainers))
            .route("/{id}", web::get().to(get_trainer))
            .route("/{id}", web::put().to(update_trainer))
            .route("/{id}", web::delete().to(delete_trainer)),
    );
}
