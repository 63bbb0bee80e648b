pub mod batch;
pub mod quote;
pub mod rate;
pub mod setting;

pub use batch::{Batch, BatchStatus};
pub use quote::{DutyQuote, QuoteOffer, QuoteRequest, QuoteResponse};
pub use rate::{PromotionKey, RateRow, RateStatus};
pub use setting::ServiceSetting;
