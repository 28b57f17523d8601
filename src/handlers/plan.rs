use actix_web::{HttpResponse, ResponseError, Result, web};

use super::common::{Payload, csv_response, payload};
use crate::models::*;
use crate::services::PlanService;

#[utoipa::path(
    get,
    path = "/plans",
    tag = "plan",
    responses(
        (status = 200, description = "套餐列表（含 active 会员数与月收入）", body = [PlanResponse])
    )
)]
pub async fn list_plans(plan_service: web::Data<PlanService>) -> Result<HttpResponse> {
    match plan_service.list_plans().await {
        Ok(plans) => Ok(HttpResponse::Ok().json(ApiResponse::list(plans, "plans"))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/plans/{id}",
    tag = "plan",
    params(("id" = i32, Path, description = "套餐 ID")),
    responses(
        (status = 200, description = "套餐详情", body = PlanDetailResponse),
        (status = 404, description = "套餐不存在")
    )
)]
pub async fn get_plan(
    plan_service: web::Data<PlanService>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    match plan_service.get_plan(path.into_inner()).await {
        Ok(plan) => Ok(HttpResponse::Ok().json(ApiResponse::success(plan))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/plans",
    tag = "plan",
    request_body = PlanRequest,
    responses(
        (status = 201, description = "套餐创建成功", body = PlanResponse),
        (status = 400, description = "请求参数错误")
    )
)]
pub async fn create_plan(
    plan_service: web::Data<PlanService>,
    body: Payload<PlanRequest>,
) -> Result<HttpResponse> {
    match plan_service.create_plan(payload(body)).await {
        Ok(plan) => {
            let message = format!("Plan {} added successfully", plan.name);
            Ok(HttpResponse::Created().json(ApiResponse::success_with_message(plan, message)))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/plans/{id}",
    tag = "plan",
    params(("id" = i32, Path, description = "套餐 ID")),
    request_body = PlanRequest,
    responses(
        (status = 200, description = "套餐更新成功", body = PlanResponse),
        (status = 400, description = "请求参数错误"),
        (status = 404, description = "套餐不存在")
    )
)]
pub async fn update_plan(
    plan_service: web::Data<PlanService>,
    path: web::Path<i32>,
    body: Payload<PlanRequest>,
) -> Result<HttpResponse> {
    match plan_service.update_plan(path.into_inner(), payload(body)).await {
        Ok(plan) => {
            let message = format!("Plan {} updated successfully", plan.name);
            Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(plan, message)))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/plans/{id}",
    tag = "plan",
    params(("id" = i32, Path, description = "套餐 ID")),
    responses(
        (status = 200, description = "套餐已删除"),
        (status = 404, description = "套餐不存在"),
        (status = 409, description = "仍有会员使用该套餐")
    )
)]
pub async fn delete_plan(
    plan_service: web::Data<PlanService>,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let plan_id = path.into_inner();
    match plan_service.delete_plan(plan_id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::message(format!(
            "Plan {plan_id} deleted successfully"
        )))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/plans/export",
    tag = "plan",
    responses(
        (status = 200, description = "套餐 CSV", content_type = "text/csv", body = String)
    )
)]
pub async fn export_plans(plan_service: web::Data<PlanService>) -> Result<HttpResponse> {
    match plan_service.export_plans().await {
        Ok(csv) => Ok(csv_response("plans", csv)),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn plan_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/plans")
            .route("", web::get().to(list_plans))
            .route("", web::post().to(create_plan))
            .route("/export", web::get().to(export_plans))
            .route("/{id}", web::get().to(get_plan))
            .route("/{id}", web::put().to(update_plan))
            .route("/{id}", web::delete().to(delete_plan)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;
    use crate::handlers::common::payload_config;
    use actix_web::{App, http::StatusCode, test};

    #[actix_web::test]
    async fn test_create_plan_from_form_and_json() {
        let pool = test_pool().await;
        let app = test::init_service(
            App::new()
                .configure(payload_config)
                .app_data(web::Data::new(PlanService::new(pool)))
                .service(web::scope("/api").configure(plan_config)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/plans")
            .set_form([
                ("name", "Basic Plan"),
                ("price", "29.99"),
                ("duration_months", "1"),
                ("features", "Gym Access, Locker Room"),
            ])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["price"], 29.99);
        assert_eq!(
            body["data"]["features"],
            serde_json::json!(["Gym Access", "Locker Room"])
        );

        let req = test::TestRequest::post()
            .uri("/api/plans")
            .set_json(serde_json::json!({
                "name": "Annual Plan",
                "price": "twelve",
                "duration_months": 12
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }
}
