use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

use crate::database::DbPool;
use crate::error::AppError;
use crate::models::*;
use crate::services::DashboardService;

#[utoipa::path(
    get,
    path = "/stats",
    tag = "dashboard",
    responses(
        (status = 200, description = "仪表盘统计", body = DashboardStats)
    )
)]
pub async fn get_stats(dashboard_service: web::Data<DashboardService>) -> Result<HttpResponse> {
    match dashboard_service.get_stats().await {
        Ok(stats) => Ok(HttpResponse::Ok().json(ApiResponse::success(stats))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/dashboard",
    tag = "dashboard",
    responses(
        (status = 200, description = "统计 + 最近会员 + 即将开始的课程", body = DashboardOverview)
    )
)]
pub async fn get_overview(
    dashboard_service: web::Data<DashboardService>,
) -> Result<HttpResponse> {
    match dashboard_service.get_overview().await {
        Ok(overview) => Ok(HttpResponse::Ok().json(ApiResponse::success(overview))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "dashboard",
    responses(
        (status = 200, description = "服务与数据库正常"),
        (status = 500, description = "数据库不可用")
    )
)]
pub async fn health(pool: web::Data<DbPool>) -> Result<HttpResponse> {
    match pool.ping().await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "status": "success",
            "data": { "database": "ok" }
        }))),
        Err(e) => Ok(AppError::from(e).error_response()),
    }
}

pub fn dashboard_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/stats", web::get().to(get_stats))
        .route("/dashboard", web::get().to(get_overview))
        .route("/health", web::get().to(health));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;
    use crate::services::SeedService;
    use actix_web::{App, test};

    #[actix_web::test]
    async fn test_dashboard_on_seeded_data() {
        let pool = test_pool().await;
        SeedService::new(pool.clone()).seed_demo_data().await.unwrap();

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(pool.clone()))
                .app_data(web::Data::new(DashboardService::new(pool)))
                .service(web::scope("/api").configure(dashboard_config)),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/stats").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["total_plans"], 3);
        assert_eq!(body["data"]["active_sessions_count"], 4);

        let req = test::TestRequest::get().uri("/api/dashboard").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["recent_members"][0]["name"], "David Green");
        assert_eq!(
            body["data"]["upcoming_sessions"].as_array().map(Vec::len),
            Some(4)
        );

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["database"], "ok");
    }
}
