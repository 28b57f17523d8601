use actix_cors::Cors;

pub fn create_cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allow_any_header()
        // CSV 下载需要前端读取文件名
        .expose_headers(vec![actix_web::http::header::CONTENT_DISPOSITION])
        .max_age(3600)
}
