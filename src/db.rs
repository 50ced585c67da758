pub mod stores;
pub use stores::{PriceChangeLogStore, ProductStore, UserStore};
pub mod user_repo;
pub use user_repo::UserRepository;
pub mod product_repo;
pub use product_repo::ProductRepository;
pub mod price_log_repo;
pub use price_log_repo::PriceChangeLogRepository;

#[cfg(test)]
pub mod memory;
