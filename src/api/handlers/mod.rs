pub mod bets;
pub mod ledger;
pub mod markets;
pub mod withdrawals;
