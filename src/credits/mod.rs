//! Account credits: current balance and daily usage history.

pub mod client;
pub mod types;

pub use client::Credits;
pub use types::{CreditBalance, DailyUsage, DailyUsageListOptions};
