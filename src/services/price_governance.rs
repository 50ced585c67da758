// src/services/price_governance.rs
//
// Governança de preço: cada alteração fica limitada a ±10% do preço salvo
// e a uma alteração a cada 24h por (produto, ator). Toda alteração aceita
// gera exatamente um registro em 'price_change_logs'.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::PriceChangeLogStore,
    models::{
        auth::Actor,
        product::{PriceChangeLog, Product},
    },
};

pub const PRICE_CHANGE_COOLDOWN_HOURS: i64 = 24;

/// Faixa permitida (inclusiva) a partir do preço atual.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceBounds {
    pub min: Decimal,
    pub max: Decimal,
}

impl PriceBounds {
    /// Perto do limite do `Decimal` o teto satura em `Decimal::MAX`.
    pub fn around(current: Decimal) -> Self {
        let min = current.checked_mul(Decimal::new(9, 1)).unwrap_or(current);
        let max = current.checked_mul(Decimal::new(11, 1)).unwrap_or(Decimal::MAX);
        Self {
            min: min.normalize(),
            max: max.normalize(),
        }
    }

    pub fn contains(&self, price: Decimal) -> bool {
        self.min <= price && price <= self.max
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceDecision {
    /// Preço ausente ou igual ao atual: nada a registrar.
    Unchanged,
    /// Novo preço validado; o chamador aplica e, depois de salvar, registra.
    Accepted(Decimal),
}

#[derive(Clone)]
pub struct PriceGovernance {
    logs: Arc<dyn PriceChangeLogStore>,
}

impl PriceGovernance {
    pub fn new(logs: Arc<dyn PriceChangeLogStore>) -> Self {
        Self { logs }
    }

    pub async fn evaluate(
        &self,
        product: &Product,
        proposed: Option<Decimal>,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<PriceDecision, AppError> {
        let Some(proposed) = proposed else {
            return Ok(PriceDecision::Unchanged);
        };
        if proposed == product.price {
            return Ok(PriceDecision::Unchanged);
        }

        // A faixa sai sempre do preço salvo, nunca do último registro.
        let bounds = PriceBounds::around(product.price);
        if !bounds.contains(proposed) {
            return Err(AppError::PriceOutOfBounds {
                min: bounds.min,
                max: bounds.max,
            });
        }

        // Cooldown por ator: outro usuário não fica bloqueado.
        if let Some(last) = self.logs.latest_for(product.id, actor.id).await? {
            let next_allowed_at = last.changed_at + Duration::hours(PRICE_CHANGE_COOLDOWN_HOURS);
            if now < next_allowed_at {
                return Err(AppError::PriceChangeCooldown { next_allowed_at });
            }
        }

        Ok(PriceDecision::Accepted(proposed))
    }

    /// Só deve ser chamado depois que o produto com o novo preço foi salvo.
    pub async fn record_price_change(
        &self,
        product_id: Uuid,
        actor_id: Uuid,
        new_price: Decimal,
        changed_at: DateTime<Utc>,
    ) -> Result<PriceChangeLog, AppError> {
        let entry = self
            .logs
            .append(product_id, actor_id, new_price, changed_at)
            .await?;
        tracing::info!(
            product_id = %product_id,
            user_id = %actor_id,
            new_price = %new_price,
            "price change recorded"
        );
        Ok(entry)
    }

    pub async fn history(&self, product_id: Uuid) -> Result<Vec<PriceChangeLog>, AppError> {
        self.logs.list_for_product(product_id).await
    }
}
