use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Blob metadata, owned by the asset store
        manager
            .create_table(
                Table::create()
                    .table("assets")
                    .if_not_exists()
                    .col(uuid("id").primary_key())
                    .col(string_len("bucket", 32))
                    .col(string("filename"))
                    .col(string("content_type"))
                    .col(big_integer("size"))
                    .col(string("checksum"))
                    .col(timestamp("created_at"))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table("developers")
                    .if_not_exists()
                    .col(uuid("id").primary_key())
                    .col(big_integer("user_id"))
                    .col(string_null("company_name"))
                    .col(text("bio"))
                    .col(string_null("website"))
                    .col(uuid_null("avatar_asset_id"))
                    .col(boolean("is_verified"))
                    .col(double("rating"))
                    .col(big_integer("total_sales"))
                    .col(timestamp("created_at"))
                    .index(
                        Index::create()
                            .name("idx-developers-user-id-unique")
                            .col("user_id")
                            .unique(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table("products")
                    .if_not_exists()
                    .col(uuid("id").primary_key())
                    .col(string("title"))
                    .col(text("description"))
                    .col(uuid("developer_id"))
                    .col(string_null("license"))
                    .col(string_len("product_type", 32))
                    .col(string("version"))
                    .col(big_integer_null("price_cents"))
                    .col(boolean("is_free"))
                    .col(string_len("status", 32))
                    .col(big_integer("download_count"))
                    .col(double("rating"))
                    .col(integer("review_count"))
                    .col(text("tags"))
                    .col(uuid_null("thumbnail_asset_id"))
                    .col(integer("revision"))
                    .col(timestamp("created_at"))
                    .col(timestamp("updated_at"))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-products-developer_id")
                            .from("products", "developer_id")
                            .to("developers", "id"),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-products-status-created-at")
                    .table("products")
                    .col("status")
                    .col("created_at")
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table("product_categories")
                    .if_not_exists()
                    .col(pk_auto("id"))
                    .col(uuid("product_id"))
                    .col(integer("position"))
                    .col(string("name"))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-product_categories-product_id")
                            .from("product_categories", "product_id")
                            .to("products", "id")
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .index(
                        Index::create()
                            .name("idx-product-categories-product-position-unique")
                            .col("product_id")
                            .col("position")
                            .unique(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-product-categories-name")
                    .table("product_categories")
                    .col("name")
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table("categories")
                    .if_not_exists()
                    .col(pk_auto("id"))
                    .col(string("name"))
                    .col(uuid_null("product_id"))
                    .col(timestamp("created_at"))
                    .index(
                        Index::create()
                            .name("idx-categories-name-unique")
                            .col("name")
                            .unique(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table("product_files")
                    .if_not_exists()
                    .col(uuid("id").primary_key())
                    .col(uuid("product_id"))
                    .col(string_len("file_type", 32))
                    .col(string_len("bucket", 32))
                    .col(uuid("asset_id"))
                    .col(string("filename"))
                    .col(big_integer("size"))
                    .col(string("checksum"))
                    .col(string("content_type"))
                    .col(string_len("scan_status", 32))
                    .col(json("scan_results"))
                    .col(timestamp("uploaded_at"))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-product_files-product_id")
                            .from("product_files", "product_id")
                            .to("products", "id")
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table("licenses")
                    .if_not_exists()
                    .col(uuid("id").primary_key())
                    .col(uuid("product_id"))
                    .col(string_len("bucket", 32))
                    .col(uuid("asset_id"))
                    .col(string("filename"))
                    .col(big_integer("size"))
                    .col(string("checksum"))
                    .col(string("content_type"))
                    .col(string_len("scan_status", 32))
                    .col(json("scan_results"))
                    .col(timestamp("uploaded_at"))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-licenses-product_id")
                            .from("licenses", "product_id")
                            .to("products", "id")
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .index(
                        Index::create()
                            .name("idx-licenses-product-id-unique")
                            .col("product_id")
                            .unique(),
                    )
                    .to_owned(),
            )
            .await?;

        // One review per (user, product)
        manager
            .create_table(
                Table::create()
                    .table("reviews")
                    .if_not_exists()
                    .col(uuid("id").primary_key())
                    .col(big_integer("user_id"))
                    .col(uuid("product_id"))
                    .col(integer("rating"))
                    .col(text("comment"))
                    .col(timestamp("created_at"))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-reviews-product_id")
                            .from("reviews", "product_id")
                            .to("products", "id")
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .index(
                        Index::create()
                            .name("idx-reviews-user-product-unique")
                            .col("user_id")
                            .col("product_id")
                            .unique(),
                    )
                    .to_owned(),
            )
            .await?;

        // Download dedup ledger
        manager
            .create_table(
                Table::create()
                    .table("downloads")
                    .if_not_exists()
                    .col(uuid("id").primary_key())
                    .col(big_integer("user_id"))
                    .col(uuid("product_id"))
                    .col(timestamp("downloaded_at"))
                    .col(string_null("ip_address"))
                    .col(string_null("user_agent"))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-downloads-product_id")
                            .from("downloads", "product_id")
                            .to("products", "id")
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .index(
                        Index::create()
                            .name("idx-downloads-user-product-unique")
                            .col("user_id")
                            .col("product_id")
                            .unique(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table("moderation_logs")
                    .if_not_exists()
                    .col(uuid("id").primary_key())
                    .col(uuid("product_id"))
                    .col(big_integer("moderator_id"))
                    .col(string_len("action", 32))
                    .col(text("reason"))
                    .col(integer("revision"))
                    .col(timestamp("created_at"))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-moderation_logs-product_id")
                            .from("moderation_logs", "product_id")
                            .to("products", "id"),
                    )
                    .index(
                        Index::create()
                            .name("idx-moderation-logs-product-revision-unique")
                            .col("product_id")
                            .col("revision")
                            .unique(),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            "moderation_logs",
            "downloads",
            "reviews",
            "licenses",
            "product_files",
            "categories",
            "product_categories",
            "products",
            "developers",
            "assets",
        ] {
            manager
                .drop_table(Table::drop().table(table).if_exists().to_owned())
                .await?;
        }

        Ok(())
    }
}
