mod support;

use anyhow::Result;
use common::services::ServiceError;
use support::{draft, setup, submit};
use uuid::Uuid;

#[tokio::test]
async fn concurrent_downloads_record_once() -> Result<()> {
    let ctx = setup().await?;
    let product = submit(&ctx, 1, draft("Engine", &[])).await?;
    let ledger = ctx.services.download_service.clone();

    let (a, b) = tokio::join!(
        ledger.record_if_absent(7, product.id, Some("10.0.0.1".to_string()), None),
        ledger.record_if_absent(7, product.id, Some("10.0.0.2".to_string()), None),
    );
    let (a, b) = (a?, b?);

    assert_eq!(a.download.id, b.download.id);
    assert!(a.created ^ b.created);
    assert_eq!(ctx.repos.download_repo.count_for_product(product.id).await?, 1);

    let stored = ctx.services.catalog_service.get(product.id, None).await?;
    assert_eq!(stored.download_count, 1);
    Ok(())
}

#[tokio::test]
async fn repeat_download_is_not_an_error_and_keeps_first_row() -> Result<()> {
    let ctx = setup().await?;
    let product = submit(&ctx, 1, draft("Engine", &[])).await?;

    let first = ctx
        .services
        .download_service
        .record_if_absent(8, product.id, Some("1.1.1.1".to_string()), Some("curl".to_string()))
        .await?;
    let second = ctx
        .services
        .download_service
        .record_if_absent(8, product.id, Some("2.2.2.2".to_string()), None)
        .await?;

    assert!(first.created);
    assert!(!second.created);
    assert_eq!(second.download.ip_address.as_deref(), Some("1.1.1.1"));

    let other_user = ctx
        .services
        .download_service
        .record_if_absent(9, product.id, None, None)
        .await?;
    assert!(other_user.created);

    let stored = ctx.services.catalog_service.get(product.id, None).await?;
    assert_eq!(stored.download_count, 2);
    Ok(())
}

#[tokio::test]
async fn download_of_missing_product_is_not_found() -> Result<()> {
    let ctx = setup().await?;
    let err = ctx
        .services
        .download_service
        .record_if_absent(1, Uuid::new_v4(), None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
    Ok(())
}

#[tokio::test]
async fn main_file_points_at_products_bucket() -> Result<()> {
    let ctx = setup().await?;
    let product = submit(&ctx, 1, draft("Engine", &[])).await?;

    let file = ctx.services.download_service.main_file_for(product.id).await?;
    assert_eq!(file.filename, "game.zip");
    assert_eq!(file.bucket, common::entities::assets::Bucket::Products);

    let content = ctx
        .services
        .asset_service
        .retrieve(file.asset_id, file.bucket)
        .await?;
    assert_eq!(&content.bytes[..], b"PK\x03\x04 game");
    Ok(())
}

#[tokio::test]
async fn increment_on_missing_product_is_not_found() -> Result<()> {
    let ctx = setup().await?;
    let err = ctx
        .services
        .catalog_service
        .increment_download_count(Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
    Ok(())
}
