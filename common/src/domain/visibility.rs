//! Who may see a product. Public, owner and staff access are separate
//! predicates so each can be checked and tested on its own.

use crate::entities::products::{self, ProductStatus};
use uuid::Uuid;

/// The caller as reported by the external auth service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: Option<i64>,
    pub is_staff: bool,
}

impl Viewer {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn user(user_id: i64) -> Self {
        Self {
            user_id: Some(user_id),
            is_staff: false,
        }
    }

    pub fn staff(user_id: i64) -> Self {
        Self {
            user_id: Some(user_id),
            is_staff: true,
        }
    }
}

pub fn is_public(product: &products::Model) -> bool {
    product.status == ProductStatus::Approved
}

/// `developer_id` is the caller's developer profile, if they have one.
pub fn is_owner(product: &products::Model, developer_id: Option<Uuid>) -> bool {
    developer_id.is_some_and(|id| id == product.developer_id)
}

pub fn is_staff(viewer: &Viewer) -> bool {
    viewer.is_staff
}

pub fn can_view(product: &products::Model, viewer: &Viewer, developer_id: Option<Uuid>) -> bool {
    is_public(product) || is_owner(product, developer_id) || is_staff(viewer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::products::ProductType;

    fn product(status: ProductStatus, developer_id: Uuid) -> products::Model {
        let now = chrono::Utc::now().naive_utc();
        products::Model {
            id: Uuid::new_v4(),
            title: "t".into(),
            description: String::new(),
            developer_id,
            license: None,
            product_type: ProductType::Project,
            version: "1.0".into(),
            price_cents: None,
            is_free: true,
            status,
            download_count: 0,
            rating: 0.0,
            review_count: 0,
            tags: String::new(),
            thumbnail_asset_id: None,
            revision: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn public_requires_approval() {
        let dev = Uuid::new_v4();
        assert!(is_public(&product(ProductStatus::Approved, dev)));
        assert!(!is_public(&product(ProductStatus::Pending, dev)));
        assert!(!is_public(&product(ProductStatus::Suspended, dev)));
    }

    #[test]
    fn owner_sees_own_pending_product_only() {
        let dev = Uuid::new_v4();
        let p = product(ProductStatus::Pending, dev);
        assert!(is_owner(&p, Some(dev)));
        assert!(!is_owner(&p, Some(Uuid::new_v4())));
        assert!(!is_owner(&p, None));
        assert!(can_view(&p, &Viewer::user(1), Some(dev)));
        assert!(!can_view(&p, &Viewer::user(2), None));
    }

    #[test]
    fn staff_sees_everything_without_ownership() {
        let p = product(ProductStatus::Rejected, Uuid::new_v4());
        assert!(is_staff(&Viewer::staff(9)));
        assert!(!is_staff(&Viewer::user(9)));
        assert!(can_view(&p, &Viewer::staff(9), None));
        assert!(!can_view(&p, &Viewer::anonymous(), None));
    }
}
