//! BlockFund primitives.
//! Stable, ledger-neutral, behavior-free.
//!
//! Rule: amounts are integers in the smallest unit. No floats anywhere.

pub mod primitives;
pub mod units;
pub mod decimal;
pub mod errors;

pub use primitives::{Address, Amount, Bps, MAX_BPS, TOKEN_DECIMALS};
pub use units::{bps_of, format_units, mul_div_floor, one_token, parse_units, tokens};
pub use errors::{AddressParseError, UnitsError};
