pub mod assets;
pub mod categories;
pub mod developers;
pub mod downloads;
pub mod moderation;
pub mod products;
pub mod reviews;

pub use assets::{AssetRepository, AssetRepositoryImpl};
pub use categories::{CategoryRepository, CategoryRepositoryImpl};
pub use developers::{DeveloperRepository, DeveloperRepositoryImpl};
pub use downloads::{DownloadRepository, DownloadRepositoryImpl};
pub use moderation::{ModerationRepository, ModerationRepositoryImpl};
pub use products::{ProductRepository, ProductRepositoryImpl};
pub use reviews::{ReviewRepository, ReviewRepositoryImpl};
