pub use super::assets::Entity as Assets;
pub use super::categories::Entity as Categories;
pub use super::developers::Entity as Developers;
pub use super::downloads::Entity as Downloads;
pub use super::licenses::Entity as Licenses;
pub use super::moderation_logs::Entity as ModerationLogs;
pub use super::product_categories::Entity as ProductCategories;
pub use super::product_files::Entity as ProductFiles;
pub use super::products::Entity as Products;
pub use super::reviews::Entity as Reviews;
