//! Reporting service: sales reports, product rankings and the dashboard

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    rank_top_products, AlertSweepSummary, DateRange, ProductSales, SalesChannel, SalesSummary,
    TopProducts, DEFAULT_MIN_STOCK, REPORT_RECENT_LIMIT,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::alert::AlertService;
use crate::services::merma::{LossProjection, MermaService};
use crate::services::sale::{Sale, SALE_SELECT};

/// Windows, in days, of the dashboard loss projections
const LOSS_PROJECTION_WINDOWS: [i64; 3] = [7, 14, 30];

#[derive(Clone)]
pub struct ReportingService {
    db: PgPool,
}

#[derive(Debug, Default, Deserialize)]
pub struct SalesReportFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub customer_id: Option<Uuid>,
    pub channel: Option<SalesChannel>,
}

#[derive(Debug, Serialize)]
pub struct SalesReport {
    pub range: DateRange,
    pub summary: SalesSummary,
    pub recent: Vec<Sale>,
}

#[derive(Debug, Serialize)]
pub struct TopProductsReport {
    pub range: DateRange,
    #[serde(flatten)]
    pub ranking: TopProducts,
}

/// Active alerts per severity
#[derive(Debug, Default, Serialize, FromRow)]
pub struct AlertCounts {
    pub red: i64,
    pub yellow: i64,
    pub green: i64,
}

#[derive(Debug, Serialize)]
pub struct DashboardMetrics {
    /// Absent when the sweep failed; the rest of the dashboard still loads
    pub sweep: Option<AlertSweepSummary>,
    pub live_products: i64,
    pub active_alerts: AlertCounts,
    pub low_stock_products: i64,
    pub merma_products: i64,
    pub loss_projections: Vec<LossProjection>,
    pub sales_today: Decimal,
    pub sales_today_count: i64,
}

#[derive(Debug, FromRow)]
struct SummaryRow {
    net: Decimal,
    iva: Decimal,
    total: Decimal,
    count: i64,
}

#[derive(Debug, FromRow)]
struct ProductSalesRow {
    product_id: Uuid,
    name: String,
    quantity: i64,
    net: Decimal,
}

impl From<ProductSalesRow> for ProductSales {
    fn from(row: ProductSalesRow) -> Self {
        Self {
            product_id: row.product_id,
            name: row.name,
            quantity: row.quantity,
            net: row.net,
        }
    }
}

impl ReportingService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Totals and most recent sales within the filter's range, which
    /// defaults to the current month
    pub async fn sales_report(&self, filter: SalesReportFilter, today: NaiveDate) -> AppResult<SalesReport> {
        let range = DateRange::from_bounds(filter.start_date, filter.end_date, today);
        let channel = filter.channel.map(|c| c.as_str());

        let totals = sqlx::query_as::<_, SummaryRow>(
            r#"
            SELECT COALESCE(SUM(s.net_total), 0) AS net,
                   COALESCE(SUM(s.iva_total), 0) AS iva,
                   COALESCE(SUM(s.total), 0) AS total,
                   COUNT(*) AS count
            FROM sales s
            WHERE s.sold_at::date BETWEEN $1 AND $2
              AND ($3::UUID IS NULL OR s.customer_id = $3)
              AND ($4::TEXT IS NULL OR s.channel = $4)
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .bind(filter.customer_id)
        .bind(channel)
        .fetch_one(&self.db)
        .await?;

        let recent = sqlx::query_as::<_, Sale>(&format!(
            r#"
            {}
            WHERE s.sold_at::date BETWEEN $1 AND $2
              AND ($3::UUID IS NULL OR s.customer_id = $3)
              AND ($4::TEXT IS NULL OR s.channel = $4)
            ORDER BY s.sold_at DESC
            LIMIT $5
            "#,
            SALE_SELECT
        ))
        .bind(range.start)
        .bind(range.end)
        .bind(filter.customer_id)
        .bind(channel)
        .bind(REPORT_RECENT_LIMIT)
        .fetch_all(&self.db)
        .await?;

        Ok(SalesReport {
            range,
            summary: SalesSummary::new(totals.net, totals.iva, totals.total, totals.count),
            recent,
        })
    }

    pub async fn top_products(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        today: NaiveDate,
    ) -> AppResult<TopProductsReport> {
        let range = DateRange::from_bounds(start_date, end_date, today);

        let rows: Vec<ProductSales> = sqlx::query_as::<_, ProductSalesRow>(
            r#"
            SELECT l.product_id, p.name,
                   SUM(l.quantity)::BIGINT AS quantity,
                   SUM(l.subtotal) AS net
            FROM sale_lines l
            JOIN sales s ON s.id = l.sale_id
            JOIN products p ON p.id = l.product_id
            WHERE s.sold_at::date BETWEEN $1 AND $2
            GROUP BY l.product_id, p.name
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.db)
        .await?
        .into_iter()
        .map(ProductSales::from)
        .collect();

        Ok(TopProductsReport {
            range,
            ranking: rank_top_products(rows),
        })
    }

    /// Runs the alert sweep, then gathers the dashboard metrics. A failed
    /// sweep is logged and skipped.
    pub async fn dashboard(&self, today: NaiveDate) -> AppResult<DashboardMetrics> {
        let sweep = match AlertService::new(self.db.clone()).generate(today).await {
            Ok(summary) => Some(summary),
            Err(err) => {
                tracing::warn!(error = %err, "Alert sweep failed while loading dashboard");
                None
            }
        };

        let live_products = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM products WHERE lifecycle = 'live'",
        )
        .fetch_one(&self.db)
        .await?;

        let active_alerts = sqlx::query_as::<_, AlertCounts>(
            r#"
            SELECT COUNT(*) FILTER (WHERE alert_type = 'red') AS red,
                   COUNT(*) FILTER (WHERE alert_type = 'yellow') AS yellow,
                   COUNT(*) FILTER (WHERE alert_type = 'green') AS green
            FROM alerts
            WHERE state = 'active'
            "#,
        )
        .fetch_one(&self.db)
        .await?;

        let low_stock_products = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM products
            WHERE lifecycle = 'live' AND merma_state = 'active'
              AND quantity <= COALESCE(min_stock, $1)
            "#,
        )
        .bind(DEFAULT_MIN_STOCK)
        .fetch_one(&self.db)
        .await?;

        let merma_products = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM products WHERE lifecycle = 'live' AND merma_state <> 'active'",
        )
        .fetch_one(&self.db)
        .await?;

        let merma = MermaService::new(self.db.clone());
        let mut loss_projections = Vec::with_capacity(LOSS_PROJECTION_WINDOWS.len());
        for days in LOSS_PROJECTION_WINDOWS {
            loss_projections.push(merma.loss_projection(today, days).await?);
        }

        let (sales_today, sales_today_count) = sqlx::query_as::<_, (Decimal, i64)>(
            "SELECT COALESCE(SUM(total), 0), COUNT(*) FROM sales WHERE sold_at::date = $1",
        )
        .bind(today)
        .fetch_one(&self.db)
        .await?;

        Ok(DashboardMetrics {
            sweep,
            live_products,
            active_alerts,
            low_stock_products,
            merma_products,
            loss_projections,
            sales_today,
            sales_today_count,
        })
    }
}
