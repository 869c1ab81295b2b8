use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::promo::PromoCode;
use super::{CatalogLedger, LedgerError, StockChange};

/// In-process ledger. Each update runs inside one lock acquisition, so
/// concurrent increments are serialized rather than racing.
#[derive(Default)]
pub struct MemoryLedger {
    stock: Mutex<HashMap<Uuid, u32>>,
    promos: Mutex<HashMap<String, PromoCode>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogLedger for MemoryLedger {
    async fn stock(&self, product_id: Uuid) -> Result<Option<u32>, LedgerError> {
        Ok(self.stock.lock().await.get(&product_id).copied())
    }

    async fn set_stock(&self, product_id: Uuid, stock: Option<u32>) -> Result<(), LedgerError> {
        let mut levels = self.stock.lock().await;
        match stock {
            Some(level) => levels.insert(product_id, level),
            None => levels.remove(&product_id),
        };
        Ok(())
    }

    async fn decrement_stock(
        &self,
        product_id: Uuid,
        quantity: u32,
    ) -> Result<StockChange, LedgerError> {
        let mut levels = self.stock.lock().await;
        let Some(level) = levels.get_mut(&product_id) else {
            return Ok(StockChange::Untracked);
        };

        if *level < quantity {
            return Err(LedgerError::InsufficientStock {
                product_id,
                available: *level,
                requested: quantity,
            });
        }

        *level -= quantity;
        Ok(StockChange::Updated(*level))
    }

    async fn increment_stock(
        &self,
        product_id: Uuid,
        quantity: u32,
    ) -> Result<StockChange, LedgerError> {
        let mut levels = self.stock.lock().await;
        match levels.get_mut(&product_id) {
            Some(level) => {
                *level = level.saturating_add(quantity);
                Ok(StockChange::Updated(*level))
            }
            None => Ok(StockChange::Untracked),
        }
    }

    async fn promo(&self, code: &str) -> Result<Option<PromoCode>, LedgerError> {
        Ok(self.promos.lock().await.get(&PromoCode::normalize(code)).cloned())
    }

    async fn upsert_promo(&self, mut promo: PromoCode) -> Result<(), LedgerError> {
        promo.code = PromoCode::normalize(&promo.code);
        self.promos.lock().await.insert(promo.code.clone(), promo);
        Ok(())
    }

    async fn increment_promo_usage(&self, code: &str) -> Result<u32, LedgerError> {
        let key = PromoCode::normalize(code);
        let mut promos = self.promos.lock().await;
        let promo = promos
            .get_mut(&key)
            .ok_or_else(|| LedgerError::UnknownPromo(key.clone()))?;

        if !promo.has_remaining_uses() {
            return Err(LedgerError::PromoUsageLimitReached {
                code: key,
                limit: promo.usage_limit,
            });
        }

        promo.usage_count += 1;
        Ok(promo.usage_count)
    }

    async fn release_promo_usage(&self, code: &str) -> Result<u32, LedgerError> {
        let key = PromoCode::normalize(code);
        let mut promos = self.promos.lock().await;
        let promo = promos
            .get_mut(&key)
            .ok_or(LedgerError::UnknownPromo(key))?;

        promo.usage_count = promo.usage_count.saturating_sub(1);
        Ok(promo.usage_count)
    }
}
