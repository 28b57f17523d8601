use actix_web::http::header;
use actix_web::{Either, HttpRequest, HttpResponse, ResponseError, error, web};
use chrono::Local;

use crate::error::AppError;
use crate::utils::export_filename;

/// 写接口同时接受 JSON 与表单提交
pub type Payload<T> = Either<web::Json<T>, web::Form<T>>;

pub fn payload<T>(body: Payload<T>) -> T {
    match body {
        Either::Left(json) => json.into_inner(),
        Either::Right(form) => form.into_inner(),
    }
}

/// CSV 下载响应: text/csv + attachment 文件名
pub fn csv_response(entity: &str, body: Vec<u8>) -> HttpResponse {
    let filename = export_filename(entity, Local::now().naive_local());
    HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename={filename}"),
        ))
        .body(body)
}

fn bad_payload<E>(err: E, _req: &HttpRequest) -> error::Error
where
    E: std::fmt::Display + std::fmt::Debug + 'static,
{
    let response = AppError::ValidationError(format!("Invalid request body: {err}")).error_response();
    error::InternalError::from_response(err, response).into()
}

/// 请求体解析失败时返回统一的 400 错误包
pub fn payload_config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(bad_payload))
        .app_data(web::FormConfig::default().error_handler(bad_payload));
}
