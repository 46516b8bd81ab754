pub mod assets;
pub mod categories;
pub mod developers;
pub mod downloads;
pub mod licenses;
pub mod moderation_logs;
pub mod prelude;
pub mod product_categories;
pub mod product_files;
pub mod products;
pub mod reviews;

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::Related;
    use std::str::FromStr;

    #[test]
    fn active_enums_serialize_as_their_wire_values() {
        assert_eq!(
            serde_json::to_string(&products::ProductStatus::Approved).unwrap(),
            "\"approved\""
        );
        assert_eq!(
            serde_json::to_string(&assets::Bucket::Screenshots).unwrap(),
            "\"screenshots\""
        );
        assert_eq!(
            serde_json::to_string(&product_files::ScanStatus::Flagged).unwrap(),
            "\"flagged\""
        );
        assert_eq!(
            serde_json::to_string(&moderation_logs::ModerationAction::Suspended).unwrap(),
            "\"suspended\""
        );
    }

    #[test]
    fn closed_sets_parse_exact_values_only() {
        assert_eq!(
            products::ProductType::from_str("apk").unwrap(),
            products::ProductType::Apk
        );
        assert!(products::ProductType::from_str("APK").is_err());
        assert!(assets::Bucket::from_str("Products").is_err());
        assert!(moderation_logs::ModerationAction::from_str("pending").is_err());
        assert_eq!(
            moderation_logs::ModerationAction::from_str("rejected")
                .unwrap()
                .target_status(),
            products::ProductStatus::Rejected
        );
    }

    #[test]
    fn screenshots_land_in_their_own_bucket() {
        assert_eq!(
            product_files::FileType::Screenshot.bucket(),
            assets::Bucket::Screenshots
        );
        assert_eq!(
            product_files::FileType::Main.bucket(),
            assets::Bucket::Products
        );
        assert!(assets::Bucket::Thumbnails.serves_inline());
        assert!(!assets::Bucket::Products.serves_inline());
        assert!(!assets::Bucket::License.serves_inline());
    }

    #[test]
    fn relation_definitions_are_accessible() {
        let _ = <products::Entity as Related<developers::Entity>>::to();
        let _ = <products::Entity as Related<product_categories::Entity>>::to();
        let _ = <products::Entity as Related<product_files::Entity>>::to();
        let _ = <products::Entity as Related<licenses::Entity>>::to();
        let _ = <products::Entity as Related<reviews::Entity>>::to();
        let _ = <products::Entity as Related<downloads::Entity>>::to();
        let _ = <products::Entity as Related<moderation_logs::Entity>>::to();
        let _ = <developers::Entity as Related<products::Entity>>::to();
        let _ = <reviews::Entity as Related<products::Entity>>::to();
        let _ = <downloads::Entity as Related<products::Entity>>::to();
        let _ = <licenses::Entity as Related<products::Entity>>::to();
    }
}
