pub mod auth;
pub mod product_form;
pub mod products;
