use crate::api::{Mode, OrdersRequest};
use crate::clock::Clock;
use crate::commands::{logged_in_api, Out};
use crate::error::{ErrorType, IntoResult};
use crate::model::order::{self, DayGroup, OrderTotals, StatusCount};
use crate::model::{DateRange, OrderStatus, StatusFilter};
use crate::utils::plural;
use crate::{utils, Config, Result};
use anyhow::{bail, ensure};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info};

/// What `shopdash orders list` should fetch and show.
#[derive(Debug, Clone, PartialEq)]
pub struct OrdersListOptions {
    pub range: DateRange,
    /// One-based.
    pub page: u32,
    pub page_size: u32,
    pub status: StatusFilter,
    /// `Some(None)` exports to the default file name in the current directory.
    pub export: Option<Option<PathBuf>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrdersOut {
    pub range: DateRange,
    pub page: u32,
    pub page_size: u32,
    pub page_count: u64,
    pub total: u64,
    pub status: String,
    pub status_counts: Vec<StatusCount>,
    pub totals: OrderTotals,
    pub days: Vec<DayGroup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exported_to: Option<PathBuf>,
}

/// Handles `shopdash orders list`.
pub async fn orders_list(
    config: &Config,
    mode: Mode,
    clock: &dyn Clock,
    options: OrdersListOptions,
) -> Result<Out<OrdersOut>> {
    ensure!(options.page >= 1, "The page number starts at 1");
    ensure!(options.page_size >= 1, "The page size must be at least 1");

    let api = logged_in_api(config, mode).await?;
    let page = api
        .orders(&OrdersRequest {
            range: options.range,
            page: options.page,
            page_size: options.page_size,
        })
        .await
        .pub_result(ErrorType::Request)?;
    debug!(
        "Received {} order{} of {}",
        page.orders.len(),
        plural(page.orders.len()),
        page.total
    );

    let exported_to = match &options.export {
        None => None,
        Some(path) => {
            let path = path
                .clone()
                .unwrap_or_else(|| PathBuf::from(order::export_file_name(page.page, &options.range)));
            if page.orders.is_empty() {
                bail!("There are no orders on this page to export");
            }
            let mut csv = Vec::new();
            order::export_csv(&page.orders, &mut csv).pub_result(ErrorType::Io)?;
            utils::write(&path, csv).await.pub_result(ErrorType::Io)?;
            info!("Exported {} orders to {}", page.orders.len(), path.display());
            Some(path)
        }
    };

    let filtered = page.filter(&options.status);
    let totals = order::totals(filtered.iter().copied());
    let days = order::group_by_day(filtered.iter().copied(), clock.today());
    let message = if filtered.is_empty() {
        format!(
            "No orders found for {} with status {}",
            options.range, options.status
        )
    } else {
        format!(
            "Showing {} order{} ({}) for {}, page {} of {}",
            totals.count,
            plural(totals.count),
            totals.amount,
            options.range,
            page.page,
            page.page_count()
        )
    };

    Ok(Out::new(
        message,
        OrdersOut {
            range: options.range,
            page: page.page,
            page_size: page.page_size,
            page_count: page.page_count(),
            total: page.total,
            status: options.status.to_string(),
            status_counts: order::status_counts(&page.orders),
            totals,
            days,
            exported_to,
        },
    ))
}

/// Handles `shopdash orders set-status`.
pub async fn orders_set_status(
    config: &Config,
    mode: Mode,
    id: &str,
    status: &OrderStatus,
) -> Result<Out<()>> {
    let id = id.trim();
    ensure!(!id.is_empty(), "An order id is required");
    let api = logged_in_api(config, mode).await?;
    api.update_order_status(id, status)
        .await
        .pub_result(ErrorType::Request)?;
    Ok(format!("Order {id} is now {status}").into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;
    use tempfile::TempDir;

    fn options(env: &TestEnv) -> OrdersListOptions {
        OrdersListOptions {
            range: DateRange::default_for(&env.clock()),
            page: 1,
            page_size: 10,
            status: StatusFilter::All,
            export: None,
        }
    }

    #[tokio::test]
    async fn test_orders_list() {
        let env = TestEnv::logged_in().await;
        let clock = env.clock();
        let out = orders_list(&env.config(), Mode::Test, &clock, options(&env))
            .await
            .unwrap();
        let data = out.structure().unwrap();
        assert_eq!(data.total, 5);
        assert_eq!(data.totals.count, 5);
        assert_eq!(data.totals.amount.to_string(), "₹8,488.75");
        assert_eq!(data.status_counts[0].count, 5);
        // newest day first
        assert!(data.days.windows(2).all(|w| w[0].day > w[1].day));
        assert!(out.message().starts_with("Showing 5 orders (₹8,488.75)"));
    }

    #[tokio::test]
    async fn test_orders_list_filtered() {
        let env = TestEnv::logged_in().await;
        let clock = env.clock();
        let mut opts = options(&env);
        opts.status = "shipped".parse().unwrap();
        let out = orders_list(&env.config(), Mode::Test, &clock, opts)
            .await
            .unwrap();
        let data = out.structure().unwrap();
        assert_eq!(data.totals.count, 1);
        assert_eq!(data.status, "SHIPPED");
        // counts are for the whole page, not the filtered list
        assert_eq!(data.status_counts[0].count, 5);

        let mut opts = options(&env);
        opts.status = "returned".parse().unwrap();
        let out = orders_list(&env.config(), Mode::Test, &clock, opts)
            .await
            .unwrap();
        assert!(out.message().starts_with("No orders found"));
    }

    #[tokio::test]
    async fn test_orders_export() {
        let env = TestEnv::logged_in().await;
        let clock = env.clock();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("orders.csv");
        let mut opts = options(&env);
        opts.export = Some(Some(path.clone()));
        let out = orders_list(&env.config(), Mode::Test, &clock, opts)
            .await
            .unwrap();
        assert_eq!(out.structure().unwrap().exported_to.as_ref(), Some(&path));
        let csv = utils::read(&path).await.unwrap();
        assert_eq!(csv.lines().count(), 6);
        assert!(csv.lines().next().unwrap().contains("\"billingAddress\""));
    }

    #[tokio::test]
    async fn test_orders_export_empty_page() {
        let env = TestEnv::logged_in().await;
        let clock = env.clock();
        let mut opts = options(&env);
        opts.page = 9;
        opts.export = Some(Some(PathBuf::from("never.csv")));
        assert!(orders_list(&env.config(), Mode::Test, &clock, opts)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_orders_bad_paging() {
        let env = TestEnv::logged_in().await;
        let clock = env.clock();
        let mut opts = options(&env);
        opts.page = 0;
        assert!(orders_list(&env.config(), Mode::Test, &clock, opts)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_set_status() {
        let env = TestEnv::logged_in().await;
        let out = orders_set_status(&env.config(), Mode::Test, "1001", &OrderStatus::Shipped)
            .await
            .unwrap();
        assert_eq!(out.message(), "Order 1001 is now SHIPPED");
        let state = env.get_state();
        assert_eq!(state.orders[0].status(), OrderStatus::Shipped);

        assert!(
            orders_set_status(&env.config(), Mode::Test, "404", &OrderStatus::Shipped)
                .await
                .is_err()
        );
    }
}
