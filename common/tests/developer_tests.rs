mod support;

use anyhow::Result;
use common::entities::assets::Bucket;
use common::entities::products::ProductStatus;
use common::services::developers::ProfileInput;
use common::services::ServiceError;
use common::storage::BlobBackend;
use support::{approve, draft, setup, submit, upload};

#[tokio::test]
async fn get_or_create_returns_one_profile_per_user() -> Result<()> {
    let ctx = setup().await?;
    let developers = &ctx.services.developer_service;

    let (a, b) = tokio::join!(developers.get_or_create(42), developers.get_or_create(42));
    let (a, b) = (a?, b?);
    assert_eq!(a.id, b.id);
    assert_eq!(a.user_id, 42);
    assert_eq!(a.bio, "");
    Ok(())
}

#[tokio::test]
async fn profile_update_replaces_avatar() -> Result<()> {
    let ctx = setup().await?;
    let developers = &ctx.services.developer_service;

    let first = developers
        .update_profile(
            7,
            ProfileInput {
                company_name: Some("Pixel Forge".to_string()),
                bio: Some("  indie studio ".to_string()),
                website: Some("https://pixelforge.example".to_string()),
            },
            Some(upload("me.png", "image/png", b"\x89PNG one")),
        )
        .await?;
    assert_eq!(first.company_name.as_deref(), Some("Pixel Forge"));
    assert_eq!(first.bio, "indie studio");
    let first_avatar = first.avatar_asset_id.expect("avatar stored");

    let second = developers
        .update_profile(
            7,
            ProfileInput {
                website: Some(String::new()),
                ..Default::default()
            },
            Some(upload("me2.png", "image/png", b"\x89PNG two")),
        )
        .await?;
    assert_eq!(second.id, first.id);
    assert_eq!(second.company_name.as_deref(), Some("Pixel Forge"));
    assert_eq!(second.website, None);

    let second_avatar = second.avatar_asset_id.expect("avatar stored");
    assert_ne!(first_avatar, second_avatar);
    assert!(ctx
        .blobs
        .get(Bucket::Avatars, &first_avatar.to_string())
        .await?
        .is_none());
    ctx.services
        .asset_service
        .retrieve(second_avatar, Bucket::Avatars)
        .await?;
    Ok(())
}

#[tokio::test]
async fn dashboard_summarises_products() -> Result<()> {
    let ctx = setup().await?;
    let live = submit(&ctx, 3, draft("Live", &[])).await?;
    submit(&ctx, 3, draft("Waiting", &[])).await?;
    submit(&ctx, 4, draft("Someone else", &[])).await?;
    approve(&ctx, live.id).await?;

    ctx.services
        .download_service
        .record_if_absent(100, live.id, None, None)
        .await?;
    ctx.services
        .download_service
        .record_if_absent(101, live.id, None, None)
        .await?;

    let dashboard = ctx.services.developer_service.dashboard(3).await?;
    assert_eq!(dashboard.total_products, 2);
    assert_eq!(dashboard.total_downloads, 2);
    assert_eq!(dashboard.pending_products, 1);

    let products = ctx
        .services
        .developer_service
        .products_of(dashboard.developer.id, None)
        .await?;
    assert_eq!(products.len(), 2);
    Ok(())
}

#[tokio::test]
async fn public_profile_lists_only_approved_products() -> Result<()> {
    let ctx = setup().await?;
    let live = submit(&ctx, 3, draft("Live", &[])).await?;
    submit(&ctx, 3, draft("Waiting", &[])).await?;
    approve(&ctx, live.id).await?;

    let developers = &ctx.services.developer_service;
    let public = developers
        .profile(live.developer_id, Some(ProductStatus::Approved))
        .await?;
    assert_eq!(public.developer.user_id, 3);
    assert_eq!(public.products.len(), 1);
    assert_eq!(public.products[0].id, live.id);

    let staff = developers.profile(live.developer_id, None).await?;
    assert_eq!(staff.products.len(), 2);

    let missing = developers.profile(uuid::Uuid::new_v4(), None).await;
    assert!(matches!(missing, Err(ServiceError::NotFound(_))));

    submit(&ctx, 4, draft("Other", &[])).await?;
    let listed = developers.list().await?;
    assert_eq!(listed.len(), 2);
    Ok(())
}

#[tokio::test]
async fn deleting_a_developer_removes_their_products_and_blobs() -> Result<()> {
    let ctx = setup().await?;
    let developers = &ctx.services.developer_service;
    let developer = developers
        .update_profile(
            3,
            ProfileInput::default(),
            Some(upload("me.png", "image/png", b"\x89PNG me")),
        )
        .await?;

    let live = submit(&ctx, 3, draft("Live", &["Games"])).await?;
    approve(&ctx, live.id).await?;
    ctx.services
        .rating_service
        .add_review(50, live.id, 4, "fine".to_string())
        .await?;
    ctx.services
        .download_service
        .record_if_absent(51, live.id, None, None)
        .await?;
    let other = submit(&ctx, 4, draft("Other", &[])).await?;
    assert_eq!(ctx.blobs.len(), 3);

    developers.delete(developer.id).await?;

    assert_eq!(ctx.blobs.len(), 1);
    let gone = ctx.services.catalog_service.get(live.id, None).await;
    assert!(matches!(gone, Err(ServiceError::NotFound(_))));
    ctx.services.catalog_service.get(other.id, None).await?;
    assert!(ctx.services.rating_service.reviews_for(live.id).await?.is_empty());
    assert!(ctx
        .services
        .moderation_service
        .history(live.id)
        .await?
        .is_empty());

    let again = developers.delete(developer.id).await;
    assert!(matches!(again, Err(ServiceError::NotFound(_))));
    Ok(())
}
