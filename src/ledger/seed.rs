use anyhow::Context;
use serde::Deserialize;
use std::path::Path;
use uuid::Uuid;

use crate::domain::promo::PromoCode;
use super::{CatalogLedger, LedgerError};

/// Initial stock levels and promo definitions, loaded from a JSON file at
/// startup. Applying a seed overwrites the entries it names and leaves every
/// other product and promo as it was.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogSeed {
    pub stock: Vec<StockLevel>,
    pub promos: Vec<PromoCode>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockLevel {
    pub product_id: Uuid,
    pub stock: u32,
}

impl CatalogSeed {
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read catalog seed {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid catalog seed in {}", path.display()))
    }

    pub async fn apply(&self, ledger: &dyn CatalogLedger) -> Result<(), LedgerError> {
        for level in &self.stock {
            ledger.set_stock(level.product_id, Some(level.stock)).await?;
        }
        for promo in &self.promos {
            ledger.upsert_promo(promo.clone()).await?;
        }

        tracing::info!(
            products = self.stock.len(),
            promos = self.promos.len(),
            "📦 Catalog ledger seeded"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::MemoryLedger;

    #[tokio::test]
    async fn test_seed_file_fills_the_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        let product = Uuid::new_v4();
        std::fs::write(
            &path,
            format!(
                r#"{{
                    "stock": [{{"productId": "{}", "stock": 12}}],
                    "promos": [{{
                        "code": "summer20",
                        "discountType": "percentage",
                        "discountValue": "20",
                        "minOrderAmount": "50",
                        "usageLimit": 100,
                        "active": true
                    }}]
                }}"#,
                product
            ),
        )
        .unwrap();

        let ledger = MemoryLedger::new();
        CatalogSeed::load(&path).await.unwrap().apply(&ledger).await.unwrap();

        assert_eq!(ledger.stock(product).await.unwrap(), Some(12));
        let promo = ledger.promo("SUMMER20").await.unwrap().unwrap();
        assert_eq!(promo.usage_limit, 100);
        assert_eq!(promo.usage_count, 0);
    }

    #[tokio::test]
    async fn test_empty_seed_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, "{}").unwrap();

        let seed = CatalogSeed::load(&path).await.unwrap();
        assert!(seed.stock.is_empty());
        assert!(seed.promos.is_empty());
    }

    #[tokio::test]
    async fn test_missing_seed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(CatalogSeed::load(&dir.path().join("absent.json")).await.is_err());
    }
}
