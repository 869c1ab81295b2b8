use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;

use crate::domain::order::{Order, OrderStatus};
use crate::errors::ServiceError;
use crate::store::DocumentStore;

// ============================================================================
// Reporting - read-only sales aggregation over stored orders
// ============================================================================
//
// Cancelled orders are excluded from every figure. There is no write path.
//
// ============================================================================

/// One order as it appears in a sales report
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesRow {
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub customer_name: String,
    pub customer_email: String,
    pub status: OrderStatus,
    pub item_count: u32,
    pub subtotal: Decimal,
    pub promo_discount: Decimal,
    pub shipping_cost: Decimal,
    pub total: Decimal,
}

impl From<&Order> for SalesRow {
    fn from(order: &Order) -> Self {
        Self {
            code: order.code.to_string(),
            created_at: order.created_at,
            customer_name: order.customer.name.clone(),
            customer_email: order.customer.email.clone(),
            status: order.status,
            item_count: order.items.iter().map(|item| item.quantity).sum(),
            subtotal: order.subtotal,
            promo_discount: order.promo_discount,
            shipping_cost: order.shipping_cost,
            total: order.total,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub total_sales: Decimal,
    pub order_count: usize,
    pub average_order_value: Decimal,
    pub orders: Vec<SalesRow>,
}

impl SalesReport {
    /// Aggregate `orders` created within `[from, to]`, oldest first
    pub fn build(orders: &[Order], from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        let mut rows: Vec<SalesRow> = orders
            .iter()
            .filter(|order| order.status != OrderStatus::Cancelled)
            .filter(|order| order.created_at >= from && order.created_at <= to)
            .map(SalesRow::from)
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        let total_sales: Decimal = rows.iter().map(|row| row.total).sum();
        let order_count = rows.len();
        let average_order_value = if order_count == 0 {
            Decimal::ZERO
        } else {
            (total_sales / Decimal::from(order_count)).round_dp(2)
        };

        Self {
            from,
            to,
            total_sales,
            order_count,
            average_order_value,
            orders: rows,
        }
    }

    /// CSV export: one line per order, header included
    pub fn to_csv(&self) -> anyhow::Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record([
            "Order",
            "Date",
            "Customer",
            "Email",
            "Status",
            "Items",
            "Subtotal",
            "Discount",
            "Shipping",
            "Total",
        ])?;

        for row in &self.orders {
            writer.write_record([
                row.code.clone(),
                row.created_at.format("%Y-%m-%d %H:%M").to_string(),
                row.customer_name.clone(),
                row.customer_email.clone(),
                row.status.to_string(),
                row.item_count.to_string(),
                row.subtotal.to_string(),
                row.promo_discount.to_string(),
                row.shipping_cost.to_string(),
                row.total.to_string(),
            ])?;
        }

        let bytes = writer.into_inner().map_err(|e| anyhow::anyhow!(e.to_string()))?;
        Ok(String::from_utf8(bytes)?)
    }
}

pub struct SalesReporter {
    orders: Arc<dyn DocumentStore<Order>>,
}

impl SalesReporter {
    pub fn new(orders: Arc<dyn DocumentStore<Order>>) -> Self {
        Self { orders }
    }

    pub async fn sales_report(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<SalesReport, ServiceError> {
        if from > to {
            return Err(ServiceError::Validation(
                "Report start must not be after its end".to_string(),
            ));
        }

        let orders = self.orders.list().await?;
        let report = SalesReport::build(&orders, from, to);

        tracing::debug!(
            from = %from,
            to = %to,
            order_count = report.order_count,
            total_sales = %report.total_sales,
            "Sales report built"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregate::Aggregate;
    use crate::domain::order::aggregate::tests::sample_new_order;
    use crate::domain::order::{OrderCode, OrderCommand};
    use crate::store::MemoryStore;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn order_at(code: &str, created_at: DateTime<Utc>) -> Order {
        Order::place(OrderCode::new(code), sample_new_order(code), created_at)
            .unwrap()
            .0
    }

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_report_totals_and_average() {
        let mut cancelled = order_at("DB-1003", day(4));
        cancelled
            .execute(&OrderCommand::ChangeStatus {
                status: OrderStatus::Cancelled,
                shipping: None,
            })
            .unwrap();

        let orders = vec![
            order_at("DB-1002", day(3)),
            order_at("DB-1001", day(2)),
            cancelled,
            order_at("DB-0999", day(20)),
        ];

        let report = SalesReport::build(&orders, day(1), day(10));
        assert_eq!(report.order_count, 2);
        assert_eq!(report.total_sales, dec!(317.90));
        assert_eq!(report.average_order_value, dec!(158.95));
        assert_eq!(report.orders[0].code, "DB-1001");
        assert_eq!(report.orders[0].item_count, 3);
    }

    #[test]
    fn test_empty_range_has_zero_average() {
        let report = SalesReport::build(&[order_at("DB-1001", day(2))], day(5), day(6));
        assert_eq!(report.order_count, 0);
        assert_eq!(report.total_sales, Decimal::ZERO);
        assert_eq!(report.average_order_value, Decimal::ZERO);
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        let at = day(2);
        let report = SalesReport::build(&[order_at("DB-1001", at)], at, at);
        assert_eq!(report.order_count, 1);
    }

    #[test]
    fn test_csv_export() {
        let mut order = order_at("DB-1001", day(2));
        order.customer.name = "Citizen, Jane".to_string();
        let report = SalesReport::build(&[order], day(1), day(3));

        let csv = report.to_csv().unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Order,Date,Customer"));
        assert_eq!(
            lines[1],
            "DB-1001,2025-03-02 12:00,\"Citizen, Jane\",jane@example.com,pending,3,149.00,0,9.95,158.95"
        );
    }

    #[tokio::test]
    async fn test_reporter_reads_store() {
        let store = Arc::new(MemoryStore::<Order>::new());
        let order = order_at("DB-1001", Utc::now() - Duration::hours(1));
        store.insert(&order, &[]).await.unwrap();

        let reporter = SalesReporter::new(store);
        let report = reporter
            .sales_report(Utc::now() - Duration::days(1), Utc::now())
            .await
            .unwrap();
        assert_eq!(report.order_count, 1);

        let backwards = reporter.sales_report(Utc::now(), Utc::now() - Duration::days(1)).await;
        assert!(matches!(backwards, Err(ServiceError::Validation(_))));
    }
}
