use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter

use fitclub_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    handlers,
    middlewares::create_cors,
    services::*,
    swagger::swagger_config,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // 加载配置
    let config = Config::from_toml().expect("Failed to load configuration file");

    // 创建数据库连接池
    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    // 运行数据库迁移
    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    if config.app.seed_demo_data {
        match SeedService::new(pool.clone()).seed_demo_data().await {
            Ok(true) => log::info!("Demo data loaded"),
            Ok(false) => {}
            Err(e) => log::error!("Failed to seed demo data: {e}"),
        }
    }

    // 创建服务
    let member_service = MemberService::new(pool.clone());
    let plan_service = PlanService::new(pool.clone());
    let trainer_service = TrainerService::new(pool.clone());
    let session_service = SessionService::new(pool.clone());
    let enrollment_service = EnrollmentService::new(pool.clone());
    let dashboard_service = DashboardService::new(pool.clone());

    // 启动HTTP服务器
    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors())
            .configure(handlers::payload_config)
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(member_service.clone()))
            .app_data(web::Data::new(plan_service.clone()))
            .app_data(web::Data::new(trainer_service.clone()))
            .app_data(web::Data::new(session_service.clone()))
            .app_data(web::Data::new(enrollment_service.clone()))
            .app_data(web::Data::new(dashboard_service.clone()))
            .configure(swagger_config)
            .service(
                web::scope("/api")
                    .configure(handlers::member_config)
                    .configure(handlers::plan_config)
                    .configure(handlers::trainer_config)
                    .configure(handlers::session_config)
                    .configure(handlers::enrollment_config)
                    .configure(handlers::dashboard_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
