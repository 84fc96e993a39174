pub mod binary_links;
pub mod health;
pub mod images;
