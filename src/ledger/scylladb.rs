use anyhow::Context;
use async_trait::async_trait;
use scylla::client::session::Session;
use std::sync::Arc;
use uuid::Uuid;

use crate::cql::{was_applied, MAX_CAS_ATTEMPTS};
use crate::domain::promo::PromoCode;
use super::{CatalogLedger, LedgerError, StockChange};

/// Ledger backed by ScyllaDB.
///
/// Counters are updated with lightweight transactions
/// (`UPDATE .. IF column = expected`), retried while another writer wins the
/// race. A missing row or null stock means the product is untracked.
pub struct ScyllaLedger {
    session: Arc<Session>,
}

impl ScyllaLedger {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    async fn read_stock(&self, product_id: Uuid) -> Result<Option<i64>, LedgerError> {
        let result = self
            .session
            .query_unpaged("SELECT stock FROM product_stock WHERE product_id = ?", (product_id,))
            .await
            .context("failed to read stock")?;

        let rows = match result.into_rows_result() {
            Ok(rows) => rows,
            Err(_) => return Ok(None),
        };

        let row = rows
            .maybe_first_row::<(Option<i64>,)>()
            .context("failed to decode stock row")?;

        Ok(row.and_then(|(stock,)| stock))
    }

    /// Swap `expected` for `next`; false when another writer got there first
    async fn swap_stock(&self, product_id: Uuid, expected: i64, next: i64) -> Result<bool, LedgerError> {
        let result = self
            .session
            .query_unpaged(
                "UPDATE product_stock SET stock = ? WHERE product_id = ? IF stock = ?",
                (next, product_id, expected),
            )
            .await
            .context("failed to update stock")?;

        Ok(was_applied(result)?)
    }

    async fn adjust_stock(&self, product_id: Uuid, delta: i64) -> Result<StockChange, LedgerError> {
        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let Some(current) = self.read_stock(product_id).await? else {
                return Ok(StockChange::Untracked);
            };

            let next = current + delta;
            if next < 0 {
                return Err(LedgerError::InsufficientStock {
                    product_id,
                    available: clamp_u32(current),
                    requested: clamp_u32(-delta),
                });
            }

            if self.swap_stock(product_id, current, next).await? {
                return Ok(StockChange::Updated(clamp_u32(next)));
            }

            tracing::debug!(
                product_id = %product_id,
                attempt = attempt,
                "Concurrent stock update, retrying compare-and-swap"
            );
        }

        Err(LedgerError::Contention(format!("stock of {}", product_id)))
    }
}

fn clamp_u32(value: i64) -> u32 {
    value.clamp(0, i64::from(u32::MAX)) as u32
}

#[async_trait]
impl CatalogLedger for ScyllaLedger {
    async fn stock(&self, product_id: Uuid) -> Result<Option<u32>, LedgerError> {
        Ok(self.read_stock(product_id).await?.map(clamp_u32))
    }

    async fn set_stock(&self, product_id: Uuid, stock: Option<u32>) -> Result<(), LedgerError> {
        match stock {
            Some(level) => {
                self.session
                    .query_unpaged(
                        "INSERT INTO product_stock (product_id, stock) VALUES (?, ?)",
                        (product_id, i64::from(level)),
                    )
                    .await
                    .context("failed to set stock")?;
            }
            None => {
                self.session
                    .query_unpaged("DELETE FROM product_stock WHERE product_id = ?", (product_id,))
                    .await
                    .context("failed to clear stock")?;
            }
        }
        Ok(())
    }

    async fn decrement_stock(
        &self,
        product_id: Uuid,
        quantity: u32,
    ) -> Result<StockChange, LedgerError> {
        self.adjust_stock(product_id, -i64::from(quantity)).await
    }

    async fn increment_stock(
        &self,
        product_id: Uuid,
        quantity: u32,
    ) -> Result<StockChange, LedgerError> {
        self.adjust_stock(product_id, i64::from(quantity)).await
    }

    async fn promo(&self, code: &str) -> Result<Option<PromoCode>, LedgerError> {
        let key = PromoCode::normalize(code);
        let result = self
            .session
            .query_unpaged(
                "SELECT definition, usage_count FROM promo_codes WHERE code = ?",
                (&key,),
            )
            .await
            .context("failed to read promo code")?;

        let rows = match result.into_rows_result() {
            Ok(rows) => rows,
            Err(_) => return Ok(None),
        };

        let Some((definition, usage_count)) = rows
            .maybe_first_row::<(String, Option<i64>)>()
            .context("failed to decode promo row")?
        else {
            return Ok(None);
        };

        let mut promo: PromoCode =
            serde_json::from_str(&definition).context("corrupt promo definition")?;
        promo.usage_count = clamp_u32(usage_count.unwrap_or(0));
        Ok(Some(promo))
    }

    async fn upsert_promo(&self, mut promo: PromoCode) -> Result<(), LedgerError> {
        promo.code = PromoCode::normalize(&promo.code);
        let definition = serde_json::to_string(&promo).context("failed to encode promo")?;

        self.session
            .query_unpaged(
                "INSERT INTO promo_codes (code, definition, usage_count) VALUES (?, ?, ?)",
                (&promo.code, definition, i64::from(promo.usage_count)),
            )
            .await
            .context("failed to store promo code")?;

        Ok(())
    }

    async fn increment_promo_usage(&self, code: &str) -> Result<u32, LedgerError> {
        let key = PromoCode::normalize(code);

        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let promo = self
                .promo(&key)
                .await?
                .ok_or_else(|| LedgerError::UnknownPromo(key.clone()))?;

            if !promo.has_remaining_uses() {
                return Err(LedgerError::PromoUsageLimitReached {
                    code: key,
                    limit: promo.usage_limit,
                });
            }

            let current = i64::from(promo.usage_count);
            let result = self
                .session
                .query_unpaged(
                    "UPDATE promo_codes SET usage_count = ? WHERE code = ? IF usage_count = ?",
                    (current + 1, &key, current),
                )
                .await
                .context("failed to increment promo usage")?;

            if was_applied(result)? {
                tracing::debug!(code = %key, usage_count = current + 1, "Promo usage counted");
                return Ok(promo.usage_count + 1);
            }

            tracing::debug!(
                code = %key,
                attempt = attempt,
                "Concurrent promo usage update, retrying compare-and-swap"
            );
        }

        Err(LedgerError::Contention(format!("promo code {}", key)))
    }

    async fn release_promo_usage(&self, code: &str) -> Result<u32, LedgerError> {
        let key = PromoCode::normalize(code);

        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let promo = self
                .promo(&key)
                .await?
                .ok_or_else(|| LedgerError::UnknownPromo(key.clone()))?;

            if promo.usage_count == 0 {
                return Ok(0);
            }

            let current = i64::from(promo.usage_count);
            let result = self
                .session
                .query_unpaged(
                    "UPDATE promo_codes SET usage_count = ? WHERE code = ? IF usage_count = ?",
                    (current - 1, &key, current),
                )
                .await
                .context("failed to release promo usage")?;

            if was_applied(result)? {
                tracing::debug!(code = %key, usage_count = current - 1, "Promo use released");
                return Ok(promo.usage_count - 1);
            }

            tracing::debug!(
                code = %key,
                attempt = attempt,
                "Concurrent promo usage update, retrying compare-and-swap"
            );
        }

        Err(LedgerError::Contention(format!("promo code {}", key)))
    }
}
