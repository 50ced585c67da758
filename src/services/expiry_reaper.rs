// src/services/expiry_reaper.rs
//
// Varredura periódica que remove produtos vencidos. É uma remoção em massa
// direta no banco: as imagens desses produtos NÃO passam pelo ImageLifecycle.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use tokio::{task::JoinHandle, time::MissedTickBehavior};

use crate::{common::error::AppError, db::ProductStore};

/// Vencido quando a meia-noite (UTC) da data de validade é anterior a `now`.
/// Mesma regra do `DELETE` em `ProductRepository::delete_expired`.
#[cfg(test)]
pub fn is_expired(expiry_date: chrono::NaiveDate, now: DateTime<Utc>) -> bool {
    expiry_date.and_time(chrono::NaiveTime::MIN).and_utc() < now
}

pub async fn sweep_expired(products: &dyn ProductStore, now: DateTime<Utc>) -> Result<u64, AppError> {
    products.delete_expired(now).await
}

/// Dispara a varredura a cada `every` (a primeira roda imediatamente).
/// Falhas são registradas e a próxima execução segue normalmente.
pub fn spawn_expiry_reaper(products: Arc<dyn ProductStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            match sweep_expired(products.as_ref(), Utc::now()).await {
                Ok(deleted) => tracing::info!(deleted, "Deleted {} expired products.", deleted),
                Err(e) => tracing::error!(error = %e, "Error cleaning up expired products"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::memory::MemoryDb,
        models::product::{Product, ProductStatus},
    };
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn product_expiring(expiry: &str) -> Product {
        let now = Utc::now();
        Product {
            id: Uuid::new_v4(),
            name: "Yogurt".into(),
            image: Some("/images/yogurt.png".into()),
            product_code: Uuid::new_v4().to_string(),
            price: Decimal::from(3),
            category: "Dairy".into(),
            manufacture_date: "2020-01-01".parse().unwrap(),
            expiry_date: expiry.parse().unwrap(),
            owner_id: Uuid::new_v4(),
            status: ProductStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[test]
    fn expiry_is_strictly_before_now() {
        let expiry: NaiveDate = "2024-06-01".parse().unwrap();
        assert!(!is_expired(expiry, at("2024-05-31T23:59:59Z")));
        assert!(!is_expired(expiry, at("2024-06-01T00:00:00Z")));
        assert!(is_expired(expiry, at("2024-06-01T00:00:01Z")));
        assert!(is_expired(expiry, at("2024-07-01T12:00:00Z")));
    }

    #[tokio::test]
    async fn sweep_removes_only_expired_products() {
        let db = MemoryDb::new();
        db.seed_product(product_expiring("2024-01-15"));
        db.seed_product(product_expiring("2024-02-01"));
        let keep = product_expiring("2024-03-01");
        db.seed_product(keep.clone());

        let deleted = sweep_expired(&db, at("2024-02-01T08:00:00Z")).await.unwrap();

        assert_eq!(deleted, 2);
        assert_eq!(db.products(), vec![keep]);
    }

    #[tokio::test(start_paused = true)]
    async fn reaper_keeps_running_after_a_failed_sweep() {
        let db = Arc::new(MemoryDb::new());
        db.fail_product_writes(true);
        db.seed_product(product_expiring("2000-01-01"));

        let handle = spawn_expiry_reaper(db.clone(), Duration::from_secs(60));
        settle().await;
        assert_eq!(db.products().len(), 1);

        db.fail_product_writes(false);
        tokio::time::advance(Duration::from_secs(60)).await;
        settle().await;

        assert!(db.products().is_empty());
        assert!(!handle.is_finished());
        handle.abort();
    }
}
