//! These structs provide the CLI interface for the shopdash CLI.

use crate::api::AuthScheme;
use crate::clock::Clock;
use crate::model::{DateRange, OrderStatus, PaymentServiceEdit, ProfileUpdate, StatusFilter};
use crate::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing::level_filters::LevelFilter;

/// shopdash: A command-line admin dashboard for a storefront.
///
/// shopdash talks to your storefront's REST API and shows what the web dashboard shows: KPIs, a
/// sales series, a breakdown of payments by method, recent orders and top products. It also lets
/// you manage orders, payment services and your profile.
///
/// Start with `shopdash init --api-url URL`, then `shopdash login`. Every command prints a short
/// message to stderr and its data as JSON to stdout.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory and initialize the configuration file.
    ///
    /// This is the first command you should run. Decide what directory you want to store data in
    /// and pass this as --shopdash-home. By default, it will be $HOME/shopdash.
    Init(InitArgs),
    /// Log in with your admin email and password and save the token.
    Login(LoginArgs),
    /// Forget the saved token.
    Logout,
    /// Show who you are logged in as.
    Whoami,
    /// Show the dashboard for a date range.
    Dashboard(DashboardArgs),
    /// List orders, export them, or change their status.
    Orders(OrdersArgs),
    /// List and edit payment services.
    Payments(PaymentsArgs),
    /// Show or edit your profile.
    Profile(ProfileArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where shopdash configuration and credentials are held. Defaults to
    /// ~/shopdash
    #[arg(long, env = "SHOPDASH_HOME", default_value_t = default_shopdash_home())]
    shopdash_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, shopdash_home: PathBuf) -> Self {
        Self {
            log_level,
            shopdash_home: shopdash_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn shopdash_home(&self) -> &DisplayPath {
        &self.shopdash_home
    }
}

/// (Not shown): Args for the `shopdash init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The base URL of your storefront API, e.g. https://shop.example.com
    #[arg(long)]
    api_url: String,

    /// How the API expects the token: "token" (Authorization: Token ...) or "bearer"
    #[arg(long, default_value_t = AuthScheme::Token)]
    scheme: AuthScheme,

    /// The user id to send with dashboard requests, if your server needs one.
    #[arg(long)]
    user_id: Option<i64>,
}

impl InitArgs {
    pub fn new(api_url: impl Into<String>, scheme: AuthScheme, user_id: Option<i64>) -> Self {
        Self {
            api_url: api_url.into(),
            scheme,
            user_id,
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn scheme(&self) -> AuthScheme {
        self.scheme
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user_id
    }
}

/// (Not shown): Args for the `shopdash login` command.
#[derive(Debug, Parser, Clone)]
pub struct LoginArgs {
    #[arg(long, env = "SHOPDASH_EMAIL")]
    email: String,

    #[arg(long, env = "SHOPDASH_PASSWORD", hide_env_values = true)]
    password: String,
}

impl LoginArgs {
    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

/// The date range of a dashboard or orders request. Without any of these, the last 30 days.
#[derive(Debug, Parser, Clone, Default)]
pub struct RangeArgs {
    /// The first day of the range, YYYY-MM-DD.
    #[arg(long, conflicts_with_all = ["last", "this_month"])]
    start: Option<NaiveDate>,

    /// The last day of the range, YYYY-MM-DD. Defaults to today.
    #[arg(long, conflicts_with_all = ["last", "this_month"])]
    end: Option<NaiveDate>,

    /// The last N days, including today.
    #[arg(long, conflicts_with = "this_month")]
    last: Option<u64>,

    /// From the first of this month through today.
    #[arg(long)]
    this_month: bool,
}

impl RangeArgs {
    /// Resolves the flags against `clock`.
    pub fn range(&self, clock: &dyn Clock) -> Result<DateRange> {
        if let Some(days) = self.last {
            DateRange::last_days(days, clock)
        } else if self.this_month {
            Ok(DateRange::this_month(clock))
        } else {
            DateRange::resolve(self.start, self.end, clock)
        }
    }
}

/// (Not shown): Args for the `shopdash dashboard` command.
#[derive(Debug, Parser, Clone)]
pub struct DashboardArgs {
    #[clap(flatten)]
    range: RangeArgs,

    /// Overrides the user id from the config.
    #[arg(long)]
    user_id: Option<i64>,
}

impl DashboardArgs {
    pub fn range(&self) -> &RangeArgs {
        &self.range
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user_id
    }
}

/// (Not shown): Args for the `shopdash orders` command.
#[derive(Debug, Parser, Clone)]
pub struct OrdersArgs {
    #[command(subcommand)]
    command: OrdersCommand,
}

impl OrdersArgs {
    pub fn command(&self) -> &OrdersCommand {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum OrdersCommand {
    /// Show one page of orders grouped by day.
    List(OrdersListArgs),
    /// Change the status of an order.
    SetStatus(SetStatusArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct OrdersListArgs {
    #[clap(flatten)]
    range: RangeArgs,

    /// The page to fetch, starting at 1.
    #[arg(long, default_value_t = 1)]
    page: u32,

    #[arg(long, default_value_t = 20)]
    page_size: u32,

    /// Only show orders with this status, e.g. PENDING or DELIVERED. ALL shows everything.
    #[arg(long, default_value = "ALL")]
    status: StatusFilter,

    /// Write the whole page as CSV. Without a file name it is written to
    /// orders_page_{page}_{start}_to_{end}.csv in the current directory.
    #[arg(long, num_args = 0..=1)]
    export: Option<Option<PathBuf>>,
}

impl OrdersListArgs {
    pub fn range(&self) -> &RangeArgs {
        &self.range
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn status(&self) -> &StatusFilter {
        &self.status
    }

    pub fn export(&self) -> Option<Option<PathBuf>> {
        self.export.clone()
    }
}

#[derive(Debug, Parser, Clone)]
pub struct SetStatusArgs {
    /// The order id.
    #[arg(long)]
    id: String,

    /// The new status, e.g. SHIPPED.
    #[arg(long)]
    status: OrderStatus,
}

impl SetStatusArgs {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> &OrderStatus {
        &self.status
    }
}

/// (Not shown): Args for the `shopdash payments` command.
#[derive(Debug, Parser, Clone)]
pub struct PaymentsArgs {
    #[command(subcommand)]
    command: PaymentsCommand,
}

impl PaymentsArgs {
    pub fn command(&self) -> &PaymentsCommand {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum PaymentsCommand {
    /// List the payment services.
    List,
    /// Enable a disabled service or disable an enabled one.
    Toggle(ServiceKeyArgs),
    /// Change the settings of a service.
    Update(PaymentsUpdateArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct ServiceKeyArgs {
    /// The key the service is stored under, e.g. razorpay.
    #[arg(long)]
    key: String,
}

impl ServiceKeyArgs {
    pub fn key(&self) -> &str {
        &self.key
    }
}

#[derive(Debug, Parser, Clone)]
pub struct PaymentsUpdateArgs {
    /// The key the service is stored under, e.g. razorpay.
    #[arg(long)]
    key: String,

    #[arg(long)]
    name: Option<String>,

    #[arg(long)]
    url: Option<String>,

    /// true or false
    #[arg(long)]
    active: Option<bool>,

    #[arg(long)]
    start_date: Option<String>,

    #[arg(long)]
    end_date: Option<String>,

    #[arg(long)]
    razorpay_key_id: Option<String>,

    #[arg(long)]
    razorpay_key_secret: Option<String>,
}

impl PaymentsUpdateArgs {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn edit(&self) -> PaymentServiceEdit {
        PaymentServiceEdit {
            name: self.name.clone(),
            url: self.url.clone(),
            is_active: self.active,
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            razorpay_key_id: self.razorpay_key_id.clone(),
            razorpay_key_secret: self.razorpay_key_secret.clone(),
        }
    }
}

/// (Not shown): Args for the `shopdash profile` command.
#[derive(Debug, Parser, Clone)]
pub struct ProfileArgs {
    #[command(subcommand)]
    command: ProfileCommand,
}

impl ProfileArgs {
    pub fn command(&self) -> &ProfileCommand {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum ProfileCommand {
    /// Show your profile.
    Show,
    /// Change fields of your profile.
    Update(ProfileUpdateArgs),
}

#[derive(Debug, Parser, Clone)]
pub struct ProfileUpdateArgs {
    #[arg(long)]
    first_name: Option<String>,

    #[arg(long)]
    last_name: Option<String>,

    #[arg(long)]
    bio: Option<String>,

    #[arg(long)]
    email: Option<String>,

    #[arg(long)]
    image_url: Option<String>,
}

impl ProfileUpdateArgs {
    pub fn update(&self) -> ProfileUpdate {
        ProfileUpdate {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            bio: self.bio.clone(),
            email: self.email.clone(),
            image_url: self.image_url.clone(),
        }
    }
}

fn default_shopdash_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("shopdash"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --shopdash-home or SHOPDASH_HOME instead of relying on the \
                default shopdash home directory. If you continue using the program right now, you \
                may have problems!",
            );
            PathBuf::from("shopdash")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}
