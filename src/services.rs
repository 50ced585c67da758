pub mod auth;
pub mod expiry_reaper;
pub mod image_lifecycle;
pub mod price_governance;
pub mod product_service;
