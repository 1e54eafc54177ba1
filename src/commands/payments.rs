use crate::api::{Api, Mode};
use crate::commands::{logged_in_api, Out};
use crate::error::{ErrorType, IntoResult};
use crate::model::{PaymentServiceEdit, PaymentServiceRow};
use crate::utils::plural;
use crate::{Config, Result};
use anyhow::{ensure, Context};
use tracing::debug;

/// Handles `shopdash payments list`.
pub async fn payments_list(config: &Config, mode: Mode) -> Result<Out<Vec<PaymentServiceRow>>> {
    let api = logged_in_api(config, mode).await?;
    let rows = api
        .payment_services()
        .await
        .pub_result(ErrorType::Request)?;
    let active = rows.iter().filter(|r| r.service.is_active()).count();
    Ok(Out::new(
        format!(
            "{} payment service{}, {active} active",
            rows.len(),
            plural(rows.len())
        ),
        rows,
    ))
}

/// Handles `shopdash payments toggle`: flips `is_active` for the service stored under `key`.
pub async fn payments_toggle(
    config: &Config,
    mode: Mode,
    key: &str,
) -> Result<Out<PaymentServiceRow>> {
    let api = logged_in_api(config, mode).await?;
    let current = find(api.as_ref(), key).await?;
    let edit = PaymentServiceEdit {
        is_active: Some(!current.service.is_active()),
        ..PaymentServiceEdit::default()
    };
    let row = apply(api.as_ref(), current, &edit).await?;
    let state = if row.service.is_active() {
        "enabled"
    } else {
        "disabled"
    };
    Ok(Out::new(format!("Payment service '{key}' {state}"), row))
}

/// Handles `shopdash payments update`.
pub async fn payments_update(
    config: &Config,
    mode: Mode,
    key: &str,
    edit: &PaymentServiceEdit,
) -> Result<Out<PaymentServiceRow>> {
    ensure!(
        !edit.is_empty(),
        "Nothing to update, pass at least one field to change"
    );
    let api = logged_in_api(config, mode).await?;
    let current = find(api.as_ref(), key).await?;
    let row = apply(api.as_ref(), current, edit).await?;
    Ok(Out::new(format!("Payment service '{key}' updated"), row))
}

async fn find(api: &dyn Api, key: &str) -> Result<PaymentServiceRow> {
    api.payment_services()
        .await
        .pub_result(ErrorType::Request)?
        .into_iter()
        .find(|row| row.key == key)
        .with_context(|| format!("There is no payment service '{key}'"))
        .pub_result(ErrorType::Input)
}

/// Sends `edit`. When the server echoes the service back that copy is used, otherwise the edit is
/// applied to the copy we already have.
async fn apply(
    api: &dyn Api,
    mut current: PaymentServiceRow,
    edit: &PaymentServiceEdit,
) -> Result<PaymentServiceRow> {
    match api
        .update_payment_service(&current.key, edit)
        .await
        .pub_result(ErrorType::Request)?
    {
        Some(service) => current.service = service,
        None => {
            debug!("The server did not echo '{}', merging locally", current.key);
            current.service.merge(edit);
        }
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_list() {
        let env = TestEnv::logged_in().await;
        let out = payments_list(&env.config(), Mode::Test).await.unwrap();
        assert_eq!(out.message(), "2 payment services, 1 active");
        assert_eq!(out.structure().unwrap()[0].key, "cod");
    }

    #[tokio::test]
    async fn test_toggle() {
        let env = TestEnv::logged_in().await;
        let out = payments_toggle(&env.config(), Mode::Test, "razorpay")
            .await
            .unwrap();
        assert_eq!(out.message(), "Payment service 'razorpay' disabled");
        assert!(!env.get_state().payment_services["razorpay"].is_active());

        let out = payments_toggle(&env.config(), Mode::Test, "razorpay")
            .await
            .unwrap();
        assert_eq!(out.message(), "Payment service 'razorpay' enabled");
    }

    #[tokio::test]
    async fn test_update() {
        let env = TestEnv::logged_in().await;
        let edit = PaymentServiceEdit {
            url: Some("https://pay.example.com".to_string()),
            ..PaymentServiceEdit::default()
        };
        let out = payments_update(&env.config(), Mode::Test, "cod", &edit)
            .await
            .unwrap();
        let row = out.structure().unwrap();
        assert_eq!(row.service.url.as_deref(), Some("https://pay.example.com"));
        assert_eq!(row.service.name.as_deref(), Some("Cash on delivery"));
    }

    #[tokio::test]
    async fn test_update_errors() {
        let env = TestEnv::logged_in().await;
        let empty = PaymentServiceEdit::default();
        assert!(payments_update(&env.config(), Mode::Test, "cod", &empty)
            .await
            .is_err());

        let edit = PaymentServiceEdit {
            name: Some("x".to_string()),
            ..PaymentServiceEdit::default()
        };
        let err = payments_update(&env.config(), Mode::Test, "stripe", &edit)
            .await
            .unwrap_err();
        assert!(format!("{err:#}").starts_with("input error"));
    }
}
