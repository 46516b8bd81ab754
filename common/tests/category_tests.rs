mod support;

use anyhow::Result;
use common::services::{ServiceError, ValidationKind};
use sea_orm::ConnectionTrait;
use support::{draft, setup, submit};

fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[tokio::test]
async fn ensure_trims_skips_blank_and_ignores_duplicates() -> Result<()> {
    let ctx = setup().await?;
    let categories = &ctx.services.category_service;

    let created = categories
        .ensure(&names(&[" Tools ", "", "Art", "Tools", "   "]), None)
        .await?;
    assert_eq!(created, names(&["Art", "Tools"]));

    let again = categories.ensure(&names(&["Tools", "tools"]), None).await?;
    assert_eq!(again, names(&["tools"]));

    assert_eq!(categories.list().await?, names(&["Art", "Tools", "tools"]));
    Ok(())
}

#[tokio::test]
async fn add_requires_a_usable_name() -> Result<()> {
    let ctx = setup().await?;
    let err = ctx
        .services
        .category_service
        .add(&names(&["", "  "]))
        .await
        .unwrap_err();
    assert_eq!(err.validation_kind(), Some(ValidationKind::BlankCategory));
    Ok(())
}

#[tokio::test]
async fn submission_registers_categories() -> Result<()> {
    let ctx = setup().await?;
    submit(&ctx, 1, draft("Kit", &["Audio", "Tools"])).await?;
    assert_eq!(
        ctx.services.category_service.list().await?,
        names(&["Audio", "Tools"])
    );
    Ok(())
}

#[tokio::test]
async fn rename_rewrites_lists_in_place() -> Result<()> {
    let ctx = setup().await?;
    let a = submit(&ctx, 1, draft("A", &["Art", "Tools", "Audio"])).await?;
    let b = submit(&ctx, 1, draft("B", &["Tools"])).await?;
    let c = submit(&ctx, 1, draft("C", &["Art"])).await?;

    let touched = ctx
        .services
        .category_service
        .rename("Tools", "Utilities")
        .await?;
    assert_eq!(touched, 2);

    let catalog = &ctx.services.catalog_service;
    let a2 = catalog.get(a.id, None).await?;
    assert_eq!(a2.categories, names(&["Art", "Utilities", "Audio"]));
    assert!(a2.updated_at >= a.updated_at);

    assert_eq!(catalog.get(b.id, None).await?.categories, names(&["Utilities"]));

    let c2 = catalog.get(c.id, None).await?;
    assert_eq!(c2.categories, names(&["Art"]));
    assert_eq!(c2.updated_at, c.updated_at);

    assert_eq!(
        ctx.services.category_service.list().await?,
        names(&["Art", "Audio", "Utilities"])
    );
    Ok(())
}

#[tokio::test]
async fn rename_error_cases() -> Result<()> {
    let ctx = setup().await?;
    let categories = &ctx.services.category_service;
    categories.add(&names(&["Art", "Tools"])).await?;

    let missing = categories.rename("Nope", "Other").await.unwrap_err();
    assert!(matches!(missing, ServiceError::NotFound(_)));

    let blank = categories.rename("Art", "  ").await.unwrap_err();
    assert_eq!(blank.validation_kind(), Some(ValidationKind::BlankCategory));

    let clash = categories.rename("Art", "Tools").await.unwrap_err();
    assert!(matches!(clash, ServiceError::Duplicate(_)));

    assert_eq!(categories.rename("Art", "Art").await?, 0);
    assert_eq!(categories.list().await?, names(&["Art", "Tools"]));
    Ok(())
}

#[tokio::test]
async fn delete_leaves_product_lists_alone() -> Result<()> {
    let ctx = setup().await?;
    let product = submit(&ctx, 1, draft("Kit", &["Audio"])).await?;

    ctx.services.category_service.delete("Audio").await?;
    assert!(ctx.services.category_service.list().await?.is_empty());

    let stored = ctx.services.catalog_service.get(product.id, None).await?;
    assert_eq!(stored.categories, names(&["Audio"]));

    let err = ctx
        .services
        .category_service
        .delete("Audio")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
    Ok(())
}

#[tokio::test]
async fn failed_product_rewrite_rolls_back_the_rename() -> Result<()> {
    let ctx = setup().await?;
    let product = submit(&ctx, 1, draft("Kit", &["Tools", "Art"])).await?;
    let before = ctx.repos.product_repo.get(product.id, None).await?.expect("row");

    ctx.db
        .execute_unprepared(
            "CREATE TRIGGER refuse_rewrite BEFORE UPDATE ON product_categories \
             BEGIN SELECT RAISE(ABORT, 'rewrite refused'); END",
        )
        .await?;

    let err = ctx
        .services
        .category_service
        .rename("Tools", "Utilities")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Internal(_)), "{err:?}");

    ctx.db.execute_unprepared("DROP TRIGGER refuse_rewrite").await?;

    let names = ctx.services.category_service.list().await?;
    assert_eq!(names, vec!["Art".to_string(), "Tools".to_string()]);

    let reloaded = ctx.services.catalog_service.get(product.id, None).await?;
    assert_eq!(reloaded.categories, vec!["Tools", "Art"]);
    let after = ctx.repos.product_repo.get(product.id, None).await?.expect("row");
    assert_eq!(after.revision, before.revision);
    Ok(())
}
