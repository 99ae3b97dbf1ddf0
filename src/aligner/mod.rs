//! Monthly alignment of water-quality readings with dam totals.
//!
//! Daily readings are averaged per calendar month, dam totals are turned into
//! daily rates using the exact length of their month, and the two are
//! inner-joined on month into one complete row per month.

pub mod aggregate;
pub mod error;
pub mod merge;
pub mod types;
pub mod utility;

pub use aggregate::{aggregate_monthly, daily_rates};
pub use error::AlignError;
pub use merge::{align, align_subset, default_columns};
pub use types::{Column, DamRates, Dated, MergedTable, MonthlyAggregate, MonthlyRecord, YearMonth};
