use anyhow::bail;
use clap::Parser;
use shopdash::args::{Args, Command, OrdersCommand, PaymentsCommand, ProfileCommand};
use shopdash::clock::SystemClock;
use shopdash::commands::{self, OrdersListOptions};
use shopdash::{Config, Mode, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    let result = tokio::select! {
        result = main_inner(args) => result,
        _ = tokio::signal::ctrl_c() => interrupted(),
    };

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn interrupted() -> Result<()> {
    bail!("Interrupted")
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().shopdash_home().path();

    // This allows for testing the program without a storefront server. When
    // SHOPDASH_IN_TEST_MODE is set and non-zero in length, then the mode will be Mode::Test,
    // otherwise it will be Mode::Http.
    let mode = Mode::from_env();
    let clock = SystemClock;

    // Route to appropriate command handler
    let _: () = match args.command() {
        Command::Init(init_args) => commands::init(
            home,
            init_args.api_url(),
            init_args.scheme(),
            init_args.user_id(),
        )
        .await?
        .print()?,

        Command::Login(login_args) => {
            let config = Config::load(home).await?;
            commands::login(&config, mode, login_args.email(), login_args.password())
                .await?
                .print()?
        }

        Command::Logout => commands::logout(&Config::load(home).await?).await?.print()?,

        Command::Whoami => commands::whoami(&Config::load(home).await?, mode)
            .await?
            .print()?,

        Command::Dashboard(dashboard_args) => {
            let config = Config::load(home).await?;
            let range = dashboard_args.range().range(&clock)?;
            commands::dashboard(&config, mode, &clock, range, dashboard_args.user_id())
                .await?
                .print()?
        }

        Command::Orders(orders_args) => {
            let config = Config::load(home).await?;
            match orders_args.command() {
                OrdersCommand::List(list) => {
                    let options = OrdersListOptions {
                        range: list.range().range(&clock)?,
                        page: list.page(),
                        page_size: list.page_size(),
                        status: list.status().clone(),
                        export: list.export(),
                    };
                    commands::orders_list(&config, mode, &clock, options)
                        .await?
                        .print()?
                }
                OrdersCommand::SetStatus(set) => {
                    commands::orders_set_status(&config, mode, set.id(), set.status())
                        .await?
                        .print()?
                }
            }
        }

        Command::Payments(payments_args) => {
            let config = Config::load(home).await?;
            match payments_args.command() {
                PaymentsCommand::List => commands::payments_list(&config, mode).await?.print()?,
                PaymentsCommand::Toggle(toggle) => {
                    commands::payments_toggle(&config, mode, toggle.key())
                        .await?
                        .print()?
                }
                PaymentsCommand::Update(update) => {
                    commands::payments_update(&config, mode, update.key(), &update.edit())
                        .await?
                        .print()?
                }
            }
        }

        Command::Profile(profile_args) => {
            let config = Config::load(home).await?;
            match profile_args.command() {
                ProfileCommand::Show => commands::profile_show(&config, mode).await?.print()?,
                ProfileCommand::Update(update) => {
                    commands::profile_update(&config, mode, &update.update())
                        .await?
                        .print()?
                }
            }
        }
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_CRATE_NAME"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
