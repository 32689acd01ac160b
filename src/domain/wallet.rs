//! `Wallet` — the plain projection of a wallet's current state, shared by
//! the aggregate (as embedded state) and the read model (as the row shape).

use serde::{Deserialize, Serialize};

use super::amount::Balance;
use super::ids::WalletId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: WalletId,
    pub name: String,
    pub balance: Balance,
}

impl Wallet {
    pub fn new(id: WalletId, name: String, balance: Balance) -> Self {
        Self { id, name, balance }
    }
}
