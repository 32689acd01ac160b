//! `WalletAggregate` — the aggregate root for a single wallet stream.
//!
//! Grounded in `original_source/wallet.go`'s `WalletAggregate`/`on()` apply
//! table and the teacher's `aggregate/account.rs` (consuming-self `apply`,
//! guard placement). The apply table in `apply_event` is the sole place that
//! knows how each `WalletEvent` mutates `Wallet` state; `apply` and `replay`
//! both funnel through it so the two paths can never diverge.

use uuid::Uuid;

use crate::domain::{Amount, Balance, DomainError, WalletEvent, WalletId};
use crate::domain::wallet::Wallet;

use super::Aggregate;

#[derive(Debug, Clone)]
pub struct WalletAggregate {
    wallet: Option<Wallet>,
    version: i64,
    uncommitted: Vec<WalletEvent>,
}

impl Default for WalletAggregate {
    fn default() -> Self {
        Self {
            wallet: None,
            version: 0,
            uncommitted: Vec::new(),
        }
    }
}

impl WalletAggregate {
    /// A freshly initialised aggregate for a brand new wallet, with the
    /// `WalletInitialized` event already applied and buffered.
    pub fn create(name: String) -> Result<Self, DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::InvalidName);
        }
        let event = WalletEvent::WalletInitialized {
            id: WalletId::new(),
            name,
            balance: Balance::ZERO,
        };
        Ok(Self::default().apply(event))
    }

    /// The current projection of wallet state, if any event has been
    /// applied yet (`version == 0` means "not found" to callers per spec
    /// §4.5 step 2).
    pub fn wallet(&self) -> Option<&Wallet> {
        self.wallet.as_ref()
    }

    pub fn deposit(&self, amount: Amount) -> Result<WalletEvent, DomainError> {
        let wallet = self
            .wallet
            .as_ref()
            .ok_or_else(|| DomainError::WalletNotFound(String::new()))?;
        Ok(WalletEvent::Deposit {
            wallet_id: wallet.id,
            amount,
        })
    }

    pub fn withdraw(&self, amount: Amount) -> Result<WalletEvent, DomainError> {
        let wallet = self
            .wallet
            .as_ref()
            .ok_or_else(|| DomainError::WalletNotFound(String::new()))?;
        if !wallet.balance.is_sufficient_for(amount) {
            return Err(DomainError::InsufficientBalance {
                required: amount.get(),
                available: wallet.balance.get(),
            });
        }
        Ok(WalletEvent::Withdraw {
            wallet_id: wallet.id,
            amount,
        })
    }

    /// The apply table. Command-time guards (sufficient balance, positive
    /// amount) are checked by `deposit`/`withdraw` before the event is even
    /// constructed; this function trusts the event and never rejects it —
    /// a persisted event must always replay (spec §4.4).
    ///
    /// Exposed at crate visibility so the projection subscriber (C7) can
    /// apply a single event directly to a read-model `Wallet` without
    /// reconstructing a whole `WalletAggregate`'s version bookkeeping.
    pub(crate) fn apply_event(mut wallet: Option<Wallet>, event: &WalletEvent) -> Option<Wallet> {
        match event {
            WalletEvent::WalletInitialized { id, name, balance } => {
                Some(Wallet::new(*id, name.clone(), *balance))
            }
            WalletEvent::Deposit { amount, .. } => {
                wallet.map(|w| Wallet::new(w.id, w.name, w.balance.credit(*amount)))
            }
            WalletEvent::Withdraw { amount, .. } => wallet.map(|w| {
                let balance = w.balance.debit(*amount).unwrap_or(w.balance);
                Wallet::new(w.id, w.name, balance)
            }),
        }
    }
}

impl Aggregate for WalletAggregate {
    type Event = WalletEvent;

    fn aggregate_type() -> &'static str {
        "Wallet"
    }

    fn id(&self) -> Uuid {
        self.wallet.as_ref().map(|w| w.id.as_uuid()).unwrap_or_default()
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(mut self, event: Self::Event) -> Self {
        self.wallet = Self::apply_event(self.wallet, &event);
        self.version += 1;
        self.uncommitted.push(event);
        self
    }

    fn replay(mut self, event: Self::Event) -> Self {
        self.wallet = Self::apply_event(self.wallet, &event);
        self.version += 1;
        self
    }

    fn sync(&mut self) {
        if !self.uncommitted.is_empty() {
            self.uncommitted.remove(0);
        }
    }

    fn events(&self) -> &[Self::Event] {
        &self.uncommitted
    }
}
