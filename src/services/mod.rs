pub mod binary_link_service;
pub mod image_service;
pub mod projection;
pub mod storage;
pub mod thumbnail_service;
pub mod tier_service;
