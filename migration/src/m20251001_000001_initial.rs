use sea_orm_migration::prelude::*;

/// Plans (会员套餐)
#[derive(DeriveIden)]
enum Plans {
    Table,
    Id,
    Name,
    Description,
    PriceCents,
    DurationMonths,
    Features,
}

/// Members (会员)
#[derive(DeriveIden)]
enum Members {
    Table,
    Id,
    Name,
    Email,
    Phone,
    JoinDate,
    PlanId,
    Status,
}

/// Trainers (教练)
#[derive(DeriveIden)]
enum Trainers {
    Table,
    Id,
    Name,
    Email,
    Phone,
    Specialization,
    ExperienceYears,
    Bio,
    Status,
}

/// Sessions (课程排期)
#[derive(DeriveIden)]
enum Sessions {
    Table,
    Id,
    Title,
    Description,
    TrainerId,
    Date,
    Time,
    DurationMinutes,
    Capacity,
    Enrolled,
    Status,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// 价格以美分整数保存 (price_cents)，避免不同数据库对 DECIMAL 的差异。
/// status 字段统一使用短字符串，兼容 Postgres 与 SQLite。
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 套餐表
        manager
            .create_table(
                Table::create()
                    .table(Plans::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Plans::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Plans::Name).string_len(50).not_null())
                    .col(ColumnDef::new(Plans::Description).text().null())
                    .col(
                        ColumnDef::new(Plans::PriceCents)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Plans::DurationMonths).integer().not_null())
                    .col(ColumnDef::new(Plans::Features).text().null())
                    .to_owned(),
            )
            .await?;

        // 会员表，plan_id 外键禁止删除仍被引用的套餐
        manager
            .create_table(
                Table::create()
                    .table(Members::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Members::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Members::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Members::Email).string_len(120).not_null())
                    .col(ColumnDef::new(Members::Phone).string_len(20).null())
                    .col(ColumnDef::new(Members::JoinDate).date().not_null())
                    .col(ColumnDef::new(Members::PlanId).integer().null())
                    .col(
                        ColumnDef::new(Members::Status)
                            .string_len(16)
                            .not_null()
                            .default("active"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_members_plan")
                            .from(Members::Table, Members::PlanId)
                            .to(Plans::Table, Plans::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_members_email_unique")
                    .table(Members::Table)
                    .col(Members::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_members_plan")
                    .table(Members::Table)
                    .col(Members::PlanId)
                    .to_owned(),
            )
            .await?;

        // 教练表
        manager
            .create_table(
                Table::create()
                    .table(Trainers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Trainers::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Trainers::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Trainers::Email).string_len(120).not_null())
                    .col(ColumnDef::new(Trainers::Phone).string_len(20).null())
                    .col(ColumnDef::new(Trainers::Specialization).string_len(100).null())
                    .col(ColumnDef::new(Trainers::ExperienceYears).integer().null())
                    .col(ColumnDef::new(Trainers::Bio).text().null())
                    .col(
                        ColumnDef::new(Trainers::Status)
                            .string_len(16)
                            .not_null()
                            .default("active"),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_trainers_email_unique")
                    .table(Trainers::Table)
                    .col(Trainers::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 课程表
        manager
            .create_table(
                Table::create()
                    .table(Sessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Sessions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Sessions::Title).string_len(100).not_null())
                    .col(ColumnDef::new(Sessions::Description).text().null())
                    .col(ColumnDef::new(Sessions::TrainerId).integer().not_null())
                    .col(ColumnDef::new(Sessions::Date).date().not_null())
                    .col(ColumnDef::new(Sessions::Time).time().not_null())
                    .col(
                        ColumnDef::new(Sessions::DurationMinutes)
                            .integer()
                            .not_null()
                            .default(60),
                    )
                    .col(
                        ColumnDef::new(Sessions::Capacity)
                            .integer()
                            .not_null()
                            .default(10),
                    )
                    .col(
                        ColumnDef::new(Sessions::Enrolled)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Sessions::Status)
                            .string_len(16)
                            .not_null()
                            .default("active"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sessions_trainer")
                            .from(Sessions::Table, Sessions::TrainerId)
                            .to(Trainers::Table, Trainers::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_sessions_trainer")
                    .table(Sessions::Table)
                    .col(Sessions::TrainerId)
                    .to_owned(),
            )
            .await?;

        // 同一教练同一时间只允许一个 active 课程（部分唯一索引，Postgres / SQLite 语法一致）
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_sessions_active_slot \
                 ON sessions (trainer_id, date, time) WHERE status = 'active'",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 删除顺序：课程 -> 教练 -> 会员 -> 套餐
        manager
            .drop_table(Table::drop().if_exists().table(Sessions::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().if_exists().table(Trainers::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().if_exists().table(Members::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().if_exists().table(Plans::Table).to_owned())
            .await?;

        Ok(())
    }
}
