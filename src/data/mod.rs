//! Turning raw order rows into a monthly sales series.
//!
//! - lenient date parsing (`dates`)
//! - amount validation and calendar-month aggregation (`monthly`)

pub mod dates;
pub mod monthly;

pub use dates::parse_order_date;
pub use monthly::{Aggregation, ParsedOrders, aggregate, to_records};
