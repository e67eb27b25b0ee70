pub mod alert;
pub mod instrument;
pub mod rates;
pub mod telegram;

pub use alert::{Alert, AlertBook, UserId};
pub use instrument::{AssetClass, Catalog, InstrumentSpec, PriceTier, Tolerance, format_price};
pub use rates::{Origin, Quote, Quotes, RateMap, Snapshot};
pub use telegram::{InlineKeyboard, Update};

/// One hit, addressed to its owner. Lives only until dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub user_id: UserId,
    pub text: String,
}
