pub mod batch;
pub mod rate;
pub mod setting;

pub use batch::{BatchFilter, BatchStore};
pub use rate::{ActiveRateFilter, RateStore};
pub use setting::SettingStore;
