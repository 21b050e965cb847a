use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const INDEXED_COLUMNS: [(&str, Bounces); 5] = [
    ("idx_bounces_email", Bounces::Email),
    ("idx_bounces_subscriber_uuid", Bounces::SubscriberUuid),
    ("idx_bounces_campaign_id", Bounces::CampaignId),
    ("idx_bounces_source", Bounces::Source),
    ("idx_bounces_created_at", Bounces::CreatedAt),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Bounces::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Bounces::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Bounces::SubscriberUuid)
                            .string_len(36)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Bounces::Email)
                            .string_len(255)
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Bounces::CampaignId).integer().null())
                    .col(ColumnDef::new(Bounces::Source).string_len(50).not_null())
                    .col(
                        ColumnDef::new(Bounces::Meta)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'{}'::jsonb")),
                    )
                    .col(
                        ColumnDef::new(Bounces::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        for (name, column) in INDEXED_COLUMNS {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(Bounces::Table)
                        .col(column)
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, _) in INDEXED_COLUMNS {
            manager
                .drop_index(
                    Index::drop()
                        .name(name)
                        .table(Bounces::Table)
                        .if_exists()
                        .to_owned(),
                )
                .await?;
        }

        manager
            .drop_table(Table::drop().table(Bounces::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden, Clone, Copy)]
enum Bounces {
    Table,
    Id,
    SubscriberUuid,
    Email,
    CampaignId,
    Source,
    Meta,
    CreatedAt,
}
