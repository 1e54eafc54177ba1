//! Types that represent the data the storefront API returns, and the derived views built from it.
mod amount;
pub(crate) mod coerce;
pub mod dashboard;
mod date_range;
pub mod order;
pub mod payment_service;
pub mod payments;
mod profile;
pub mod series;

pub use amount::{Amount, AmountError};
pub use dashboard::{DashboardPayload, DashboardView};
pub use date_range::DateRange;
pub use order::{Order, OrderPage, OrderStatus, StatusFilter};
pub use payment_service::{PaymentService, PaymentServiceEdit, PaymentServiceRow};
pub use payments::{
    aggregate_payments, LegendEntry, PaymentCard, PaymentCategoryKey, PaymentCategoryTotals,
    PieSlice,
};
pub use profile::{Profile, ProfileUpdate};
pub use series::{normalize_series, NormalizedSeriesPoint, RawDate, RawSeriesPoint};
