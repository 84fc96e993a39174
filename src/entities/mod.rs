pub mod prelude;

pub mod binary_image_links;
pub mod images;
pub mod thumbnails;
pub mod tier_thumbnails;
pub mod tiers;
pub mod users;
