mod balance;
mod network;

pub use balance::{BalanceRecord, Category, Coin};
pub use network::{NetworkKey, QueryPair};
