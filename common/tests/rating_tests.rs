mod support;

use anyhow::Result;
use common::services::{ServiceError, ValidationKind};
use support::{approve, draft, setup, submit};
use uuid::Uuid;

#[tokio::test]
async fn mean_of_five_three_four_is_four() -> Result<()> {
    let ctx = setup().await?;
    let product = submit(&ctx, 1, draft("Racer", &["Games"])).await?;
    approve(&ctx, product.id).await?;

    for (user_id, rating) in [(10, 5), (11, 3), (12, 4)] {
        ctx.services
            .rating_service
            .add_review(user_id, product.id, rating, "ok".to_string())
            .await?;
    }

    let stored = ctx.services.catalog_service.get(product.id, None).await?;
    assert_eq!(stored.rating, 4.0);
    assert_eq!(stored.review_count, 3);

    let reviews = ctx.services.rating_service.reviews_for(product.id).await?;
    assert_eq!(reviews.len(), 3);
    Ok(())
}

#[tokio::test]
async fn recompute_is_idempotent() -> Result<()> {
    let ctx = setup().await?;
    let product = submit(&ctx, 1, draft("Puzzle", &[])).await?;

    ctx.services
        .rating_service
        .add_review(20, product.id, 2, String::new())
        .await?;
    ctx.services
        .rating_service
        .add_review(21, product.id, 5, String::new())
        .await?;

    let first = ctx.services.rating_service.recompute(product.id).await?;
    let second = ctx.services.rating_service.recompute(product.id).await?;
    assert_eq!(first, second);
    assert_eq!(first.rating, 3.5);
    assert_eq!(first.review_count, 2);
    Ok(())
}

#[tokio::test]
async fn recompute_rounds_to_two_decimals_and_handles_no_reviews() -> Result<()> {
    let ctx = setup().await?;
    let product = submit(&ctx, 1, draft("Tiles", &[])).await?;

    let empty = ctx.services.rating_service.recompute(product.id).await?;
    assert_eq!(empty.rating, 0.0);
    assert_eq!(empty.review_count, 0);

    for (user_id, rating) in [(1, 5), (2, 5), (3, 4)] {
        ctx.services
            .rating_service
            .add_review(user_id, product.id, rating, String::new())
            .await?;
    }
    let snapshot = ctx.services.rating_service.recompute(product.id).await?;
    assert_eq!(snapshot.rating, 4.67);
    Ok(())
}

#[tokio::test]
async fn second_review_by_same_user_is_duplicate() -> Result<()> {
    let ctx = setup().await?;
    let product = submit(&ctx, 1, draft("Shooter", &[])).await?;

    ctx.services
        .rating_service
        .add_review(30, product.id, 4, "fun".to_string())
        .await?;
    let err = ctx
        .services
        .rating_service
        .add_review(30, product.id, 1, "changed my mind".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Duplicate(_)));

    let stored = ctx.services.catalog_service.get(product.id, None).await?;
    assert_eq!(stored.review_count, 1);
    assert_eq!(stored.rating, 4.0);

    let existing = ctx
        .services
        .rating_service
        .review_by(30, product.id)
        .await?
        .expect("review kept");
    assert_eq!(existing.rating, 4);
    Ok(())
}

#[tokio::test]
async fn rating_outside_range_is_rejected() -> Result<()> {
    let ctx = setup().await?;
    let product = submit(&ctx, 1, draft("Cards", &[])).await?;

    for rating in [0, 6, -1] {
        let err = ctx
            .services
            .rating_service
            .add_review(40, product.id, rating, String::new())
            .await
            .unwrap_err();
        assert_eq!(err.validation_kind(), Some(ValidationKind::RatingOutOfRange));
    }

    assert!(ctx
        .services
        .rating_service
        .review_by(40, product.id)
        .await?
        .is_none());
    Ok(())
}

#[tokio::test]
async fn review_for_missing_product_is_not_found() -> Result<()> {
    let ctx = setup().await?;
    let err = ctx
        .services
        .rating_service
        .add_review(1, Uuid::new_v4(), 5, String::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
    Ok(())
}

#[tokio::test]
async fn recompute_overwrites_a_raw_review_count_bump() -> Result<()> {
    let ctx = setup().await?;
    let product = submit(&ctx, 1, draft("Drift", &[])).await?;
    approve(&ctx, product.id).await?;
    ctx.services
        .rating_service
        .add_review(30, product.id, 4, String::new())
        .await?;

    ctx.services
        .catalog_service
        .increment_review_count(product.id)
        .await?;
    let bumped = ctx.services.catalog_service.get(product.id, None).await?;
    assert_eq!(bumped.review_count, 2);

    let snapshot = ctx.services.rating_service.recompute(product.id).await?;
    assert_eq!(snapshot.review_count, 1);
    let stored = ctx.services.catalog_service.get(product.id, None).await?;
    assert_eq!(stored.review_count, 1);
    assert_eq!(stored.rating, 4.0);
    Ok(())
}
