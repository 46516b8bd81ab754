mod support;

use anyhow::Result;
use common::entities::moderation_logs::ModerationAction;
use common::entities::products::ProductStatus;
use common::services::ServiceError;
use sea_orm::ConnectionTrait;
use support::{draft, setup, submit, tick};
use uuid::Uuid;

#[tokio::test]
async fn transitions_append_one_log_entry_each() -> Result<()> {
    let ctx = setup().await?;
    let product = submit(&ctx, 1, draft("Map Pack", &[])).await?;
    assert_eq!(product.status, ProductStatus::Pending);

    let approved = ctx
        .services
        .moderation_service
        .transition(product.id, 99, "approved", "fine")
        .await?;
    assert_eq!(approved.product.status, ProductStatus::Approved);
    assert_eq!(approved.log_entry.action, ModerationAction::Approved);
    assert_eq!(approved.log_entry.created_at, approved.product.updated_at);

    tick().await;
    let suspended = ctx
        .services
        .moderation_service
        .transition(product.id, 99, "suspended", "malware report")
        .await?;
    assert_eq!(suspended.product.status, ProductStatus::Suspended);
    assert!(suspended.product.revision > approved.product.revision);

    let history = ctx.services.moderation_service.history(product.id).await?;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].action, ModerationAction::Approved);
    assert_eq!(history[1].action, ModerationAction::Suspended);
    assert_eq!(history[1].reason, "malware report");
    assert_eq!(history[1].moderator_id, 99);
    Ok(())
}

#[tokio::test]
async fn unknown_action_is_rejected_without_side_effects() -> Result<()> {
    let ctx = setup().await?;
    let product = submit(&ctx, 1, draft("Map Pack", &[])).await?;

    for action in ["pending", "Approved", "delete", ""] {
        let err = ctx
            .services
            .moderation_service
            .transition(product.id, 99, action, "")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidAction(_)), "{action}");
    }

    assert!(ctx
        .services
        .moderation_service
        .history(product.id)
        .await?
        .is_empty());
    Ok(())
}

#[tokio::test]
async fn transition_of_missing_product_is_not_found() -> Result<()> {
    let ctx = setup().await?;
    let missing = Uuid::new_v4();
    let err = ctx
        .services
        .moderation_service
        .transition(missing, 99, "rejected", "")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
    assert!(ctx.services.moderation_service.history(missing).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn queue_lists_pending_newest_first() -> Result<()> {
    let ctx = setup().await?;
    let older = submit(&ctx, 1, draft("Older", &[])).await?;
    tick().await;
    let newer = submit(&ctx, 1, draft("Newer", &[])).await?;
    tick().await;
    let reviewed = submit(&ctx, 1, draft("Reviewed", &[])).await?;
    ctx.services
        .moderation_service
        .transition(reviewed.id, 99, "rejected", "incomplete")
        .await?;

    let queue = ctx.services.moderation_service.queue().await?;
    let ids = queue.iter().map(|p| p.id).collect::<Vec<_>>();
    assert_eq!(ids, vec![newer.id, older.id]);
    Ok(())
}

#[tokio::test]
async fn failed_log_insert_rolls_back_the_status_change() -> Result<()> {
    let ctx = setup().await?;
    let product = submit(&ctx, 1, draft("Map Pack", &[])).await?;
    let before = ctx.repos.product_repo.get(product.id, None).await?.expect("row");

    ctx.db
        .execute_unprepared(
            "CREATE TRIGGER refuse_log BEFORE INSERT ON moderation_logs \
             BEGIN SELECT RAISE(ABORT, 'log write refused'); END",
        )
        .await?;

    let err = ctx
        .services
        .moderation_service
        .transition(product.id, 99, "approved", "fine")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Internal(_)), "{err:?}");

    ctx.db.execute_unprepared("DROP TRIGGER refuse_log").await?;

    let after = ctx.repos.product_repo.get(product.id, None).await?.expect("row");
    assert_eq!(after.status, ProductStatus::Pending);
    assert_eq!(after.revision, before.revision);
    assert_eq!(after.updated_at, before.updated_at);
    assert!(ctx
        .services
        .moderation_service
        .history(product.id)
        .await?
        .is_empty());
    Ok(())
}

#[tokio::test]
async fn history_follows_transition_order_not_clock() -> Result<()> {
    let ctx = setup().await?;
    let product = submit(&ctx, 1, draft("Map Pack", &[])).await?;
    let moderation = &ctx.services.moderation_service;

    let first = moderation
        .transition(product.id, 99, "approved", "")
        .await?;
    let second = moderation
        .transition(product.id, 99, "suspended", "")
        .await?;
    assert!(second.log_entry.revision > first.log_entry.revision);

    // A skewed clock on another instance stamps the later entry earlier.
    ctx.db
        .execute_unprepared(
            "UPDATE moderation_logs SET created_at = '2000-01-01 00:00:00' \
             WHERE action = 'suspended'",
        )
        .await?;

    let history = moderation.history(product.id).await?;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].action, ModerationAction::Approved);
    assert_eq!(history[1].action, ModerationAction::Suspended);
    Ok(())
}
