pub use sea_orm_migration::prelude::*;

mod m20251001_000001_initial;
mod m20251008_000002_add_session_enrollments;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251001_000001_initial::Migration),
            Box::new(m20251008_000002_add_session_enrollments::Migration),
        ]
    }
}
