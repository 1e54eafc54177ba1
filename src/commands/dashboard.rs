use crate::api::{DashboardRequest, Mode};
use crate::clock::Clock;
use crate::commands::{logged_in_api, Out};
use crate::error::{ErrorType, IntoResult};
use crate::model::{DashboardView, DateRange};
use crate::utils::plural;
use crate::{Config, Result};
use tracing::debug;

/// Handles `shopdash dashboard`: fetches the analytics payload for `range` and prints the derived
/// view. `user_id` overrides the one in the config.
pub async fn dashboard(
    config: &Config,
    mode: Mode,
    clock: &dyn Clock,
    range: DateRange,
    user_id: Option<i64>,
) -> Result<Out<DashboardView>> {
    let api = logged_in_api(config, mode).await?;
    let request = DashboardRequest {
        range,
        user_id: user_id.or(config.user_id()),
    };
    let payload = api
        .dashboard(&request)
        .await
        .pub_result(ErrorType::Request)?;
    if let Some(message) = &payload.message {
        debug!("Server says: {message}");
    }

    let view = DashboardView::build(&payload, clock);
    let points = view.series.len();
    Ok(Out::new(
        format!(
            "Dashboard for {range}: {points} sales point{}, {} recent order{}",
            plural(points),
            view.recent_orders.len(),
            plural(view.recent_orders.len())
        ),
        view,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PaymentCategoryKey;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_dashboard() {
        let env = TestEnv::logged_in().await;
        let clock = env.clock();
        let range = DateRange::default_for(&clock);
        let out = dashboard(&env.config(), Mode::Test, &clock, range, None)
            .await
            .unwrap();
        let view = out.structure().unwrap();
        assert!(out.message().contains("7 sales points"));

        assert_eq!(view.series.len(), 7);
        assert!(view
            .series
            .windows(2)
            .all(|w| w[0].timestamp <= w[1].timestamp));

        let payments = view.payments.as_ref().unwrap();
        assert_eq!(payments.amount(PaymentCategoryKey::Other), 15200.0);
        assert_eq!(view.kpis[3].value, "₹2,52,840.00");

        let card = view.payment_card.as_ref().unwrap();
        assert_eq!(card.total, "₹2,52,840.00");
        assert_eq!(card.slices.len(), 4);
        assert_eq!(card.legend.len(), 4);
        assert_eq!(card.legend[0].amount, "₹1,51,200.00");
        assert_eq!(card.legend[3].name, "Other");
        assert_eq!(card.legend[3].amount, "₹15,200.00");
    }

    #[tokio::test]
    async fn test_dashboard_with_zero_payment_total() {
        let env = TestEnv::logged_in().await;
        let mut state = env.get_state();
        state.dashboard["order_payment_summary"] = serde_json::json!({
            "total_payment_estimate": 0,
            "online_payment_amount": 0,
            "cash_on_delivery_payment_amount": 0,
            "payment_not_done_amount": 0
        });
        env.set_state(state);

        let clock = env.clock();
        let range = DateRange::default_for(&clock);
        let out = dashboard(&env.config(), Mode::Test, &clock, range, None)
            .await
            .unwrap();
        let card = out.structure().unwrap().payment_card.as_ref().unwrap();
        assert_eq!(card.total, "₹0.00");
        assert_eq!(card.slices.len(), 1);
        assert_eq!(card.slices[0].name, "No data");
        assert_eq!(card.slices[0].value, 1.0);
        assert_eq!(card.legend.len(), 4);
        assert!(card.legend.iter().all(|row| row.amount == "₹0.00"));
    }

    #[tokio::test]
    async fn test_dashboard_without_login() {
        let env = TestEnv::new().await;
        let clock = env.clock();
        let range = DateRange::default_for(&clock);
        let err = dashboard(&env.config(), Mode::Test, &clock, range, None)
            .await
            .unwrap_err();
        assert!(format!("{err:#}").starts_with("credentials error"));
    }

    #[tokio::test]
    async fn test_dashboard_with_empty_payload() {
        let env = TestEnv::logged_in().await;
        let mut state = env.get_state();
        state.dashboard = serde_json::json!({"order_sale_graph": "broken"});
        env.set_state(state);

        let clock = env.clock();
        let out = dashboard(
            &env.config(),
            Mode::Test,
            &clock,
            DateRange::default_for(&clock),
            Some(9),
        )
        .await
        .unwrap();
        let view = out.structure().unwrap();
        assert!(view.series.is_empty());
        assert!(view.payments.is_none());
        assert!(view.payment_card.is_none());
        assert!(out.message().contains("0 sales points"));
    }
}
