pub mod deposit;
pub mod ledger;
pub mod market;
pub mod order;
pub mod trade;
pub mod user;
pub mod withdrawal;

pub use deposit::*;
pub use ledger::*;
pub use market::*;
pub use order::*;
pub use trade::*;
pub use user::*;
pub use withdrawal::*;
