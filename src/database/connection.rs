use crate::config::DatabaseConfig;
use crate::error::AppResult;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;

pub type DbPool = DatabaseConnection;

pub async fn create_pool(config: &DatabaseConfig) -> AppResult<DbPool> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    let pool = Database::connect(options).await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &DbPool) -> AppResult<()> {
    Migrator::up(pool, None).await?;
    Ok(())
}

/// 测试用内存 SQLite，已执行全部迁移
#[cfg(test)]
pub async fn test_pool() -> DbPool {
    let pool = create_pool(&DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        // 内存库每个连接独立，只能用单连接
        max_connections: 1,
    })
    .await
    .expect("connect sqlite memory");
    run_migrations(&pool).await.expect("run migrations");
    pool
}
