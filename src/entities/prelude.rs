pub use super::binary_image_links::Entity as BinaryImageLinks;
pub use super::images::Entity as Images;
pub use super::thumbnails::Entity as Thumbnails;
pub use super::tier_thumbnails::Entity as TierThumbnails;
pub use super::tiers::Entity as Tiers;
pub use super::users::Entity as Users;
