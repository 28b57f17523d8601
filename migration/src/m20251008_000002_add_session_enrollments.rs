use sea_orm_migration::prelude::*;

/// Session Enrollments (会员报名记录)
#[derive(DeriveIden)]
enum SessionEnrollments {
    Table,
    Id,
    SessionId,
    MemberId,
    EnrollmentDate,
    Status,
}

#[derive(DeriveIden)]
enum Sessions {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Members {
    Table,
    Id,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SessionEnrollments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SessionEnrollments::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SessionEnrollments::SessionId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SessionEnrollments::MemberId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SessionEnrollments::EnrollmentDate)
                            .date()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SessionEnrollments::Status)
                            .string_len(16)
                            .not_null()
                            .default("enrolled"),
                    )
                    // 删除课程或会员时一并删除报名记录
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_session_enrollments_session")
                            .from(SessionEnrollments::Table, SessionEnrollments::SessionId)
                            .to(Sessions::Table, Sessions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_session_enrollments_member")
                            .from(SessionEnrollments::Table, SessionEnrollments::MemberId)
                            .to(Members::Table, Members::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 同一会员不能重复报名同一课程
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_session_enrollments_pair_unique")
                    .table(SessionEnrollments::Table)
                    .col(SessionEnrollments::SessionId)
                    .col(SessionEnrollments::MemberId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_session_enrollments_member")
                    .table(SessionEnrollments::Table)
                    .col(SessionEnrollments::MemberId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(SessionEnrollments::Table)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}
