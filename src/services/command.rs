//! Command services (C5): `CreateWalletService`, `PostTransactionService`.
//!
//! Grounded in `lactam6-financeATP/src/handlers/mint_handler.rs` and
//! `.../handlers/commands.rs` (load-aggregate / build-event / append shape)
//! and `original_source/transaction.go`'s `TransactionRequest.Validate`/
//! `CreateTransaction` orchestration.

use std::sync::Arc;

use serde::Deserialize;

use crate::aggregate::{Aggregate, WalletAggregate};
use crate::domain::{Amount, DomainError, EventMetadata, Wallet, WalletId};
use crate::ports::event_store::{AppendError, EventStorePort, NewEvent};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateWalletRequest {
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Deposit,
    Withdraw,
}

impl TransactionType {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        match raw.to_uppercase().as_str() {
            "DEPOSIT" => Ok(TransactionType::Deposit),
            "WITHDRAW" => Ok(TransactionType::Withdraw),
            other => Err(DomainError::InvalidTransactionType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostTransactionRequest {
    pub wallet_id: String,
    #[serde(rename = "transaction")]
    pub transaction_type: String,
    pub amount: i64,
}

pub struct CreateWalletService<S: EventStorePort> {
    event_store: Arc<S>,
}

impl<S: EventStorePort> CreateWalletService<S> {
    pub fn new(event_store: Arc<S>) -> Self {
        Self { event_store }
    }

    #[tracing::instrument(skip(self), fields(name = %req.name))]
    pub async fn execute(&self, req: CreateWalletRequest) -> Result<Wallet, DomainError> {
        let mut aggregate = WalletAggregate::create(req.name)?;

        let mut metadata = EventMetadata::default();
        metadata.ensure_correlation_id();

        let events = aggregate
            .events()
            .iter()
            .enumerate()
            .map(|(i, event)| NewEvent {
                aggregate_id: event.wallet_id(),
                expected_version: i as i64,
                payload: event.clone(),
                metadata: metadata.clone(),
            })
            .collect::<Vec<_>>();

        self.event_store
            .append(events)
            .await
            .map_err(map_append_error)?;

        for _ in 0..aggregate.events().len() {
            aggregate.sync();
        }

        let wallet = aggregate
            .wallet()
            .cloned()
            .expect("WalletAggregate::create always applies WalletInitialized");
        tracing::info!(wallet_id = %wallet.id, "wallet created");
        Ok(wallet)
    }
}

pub struct PostTransactionService<S: EventStorePort> {
    event_store: Arc<S>,
}

impl<S: EventStorePort> PostTransactionService<S> {
    pub fn new(event_store: Arc<S>) -> Self {
        Self { event_store }
    }

    #[tracing::instrument(skip(self), fields(wallet_id = %req.wallet_id))]
    pub async fn execute(&self, req: PostTransactionRequest) -> Result<Wallet, DomainError> {
        let wallet_id = WalletId::parse(&req.wallet_id)
            .map_err(|_| DomainError::InvalidWalletId(req.wallet_id.clone()))?;
        let transaction_type = TransactionType::parse(&req.transaction_type)?;
        let amount = Amount::new(req.amount)?;

        let mut aggregate = self.load(wallet_id).await?;

        let event = match transaction_type {
            TransactionType::Deposit => aggregate.deposit(amount)?,
            TransactionType::Withdraw => aggregate.withdraw(amount)?,
        };
        let expected_version = aggregate.version();
        aggregate = aggregate.apply(event.clone());

        let mut metadata = EventMetadata::default();
        metadata.ensure_correlation_id();
        let new_event = NewEvent {
            aggregate_id: wallet_id,
            expected_version,
            payload: event,
            metadata,
        };

        self.event_store
            .append(vec![new_event])
            .await
            .map_err(map_append_error)?;
        aggregate.sync();

        let wallet = aggregate
            .wallet()
            .cloned()
            .expect("a loaded wallet always has state after apply");
        tracing::info!(wallet_id = %wallet.id, balance = wallet.balance.get(), "transaction posted");
        Ok(wallet)
    }

    async fn load(&self, wallet_id: WalletId) -> Result<WalletAggregate, DomainError> {
        let events = self
            .event_store
            .load(wallet_id, 0)
            .await
            .map_err(|e| DomainError::Transport(e.to_string()))?;

        if events.is_empty() {
            return Err(DomainError::WalletNotFound(wallet_id.to_string()));
        }

        let mut aggregate = WalletAggregate::default();
        for stored in events {
            aggregate = aggregate.replay(stored.payload);
        }
        Ok(aggregate)
    }
}

fn map_append_error(err: AppendError) -> DomainError {
    match err {
        AppendError::VersionConflict {
            aggregate_id,
            expected,
            found,
        } => DomainError::VersionConflict {
            aggregate_id: aggregate_id.to_string(),
            expected,
            found,
        },
        AppendError::Transport(e) => DomainError::Transport(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Balance, StoredEvent, WalletEvent};
    use crate::ports::event_store::{EventAppeared, LoadError, SubscribeError};
    use async_trait::async_trait;
    use futures::stream::BoxStream;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeEventStore {
        events: Mutex<Vec<StoredEvent>>,
        reject_append: bool,
    }

    #[async_trait]
    impl EventStorePort for FakeEventStore {
        async fn append(&self, events: Vec<NewEvent>) -> Result<(), AppendError> {
            if self.reject_append {
                return Err(AppendError::VersionConflict {
                    aggregate_id: events[0].aggregate_id,
                    expected: events[0].expected_version,
                    found: events[0].expected_version + 1,
                });
            }
            let mut guard = self.events.lock().unwrap();
            for event in events {
                let version = event.expected_version + 1;
                guard.push(StoredEvent {
                    aggregate_type: "Wallet".into(),
                    aggregate_id: event.aggregate_id,
                    version,
                    global_sequence: guard.len() as i64 + 1,
                    event_type: event.payload.event_type().to_string(),
                    payload: event.payload,
                    metadata: event.metadata,
                    created_at: chrono::Utc::now(),
                });
            }
            Ok(())
        }

        async fn load(
            &self,
            aggregate_id: WalletId,
            from_version: i64,
        ) -> Result<Vec<StoredEvent>, LoadError> {
            Ok(self
                .events
                .lock()
                .unwrap()
                .iter()
                .filter(|e| e.aggregate_id == aggregate_id && e.version > from_version)
                .cloned()
                .collect())
        }

        fn subscribe_all(&self) -> BoxStream<'static, Result<EventAppeared, SubscribeError>> {
            Box::pin(futures::stream::empty())
        }
    }

    #[tokio::test]
    async fn create_wallet_persists_initialized_event() {
        let store = Arc::new(FakeEventStore::default());
        let service = CreateWalletService::new(store.clone());

        let wallet = service
            .execute(CreateWalletRequest { name: "alice".into() })
            .await
            .unwrap();

        assert_eq!(wallet.name, "alice");
        assert_eq!(wallet.balance, Balance::ZERO);
        assert_eq!(store.events.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn create_wallet_rejects_empty_name() {
        let store = Arc::new(FakeEventStore::default());
        let service = CreateWalletService::new(store);
        let result = service.execute(CreateWalletRequest { name: "".into() }).await;
        assert!(matches!(result, Err(DomainError::InvalidName)));
    }

    #[tokio::test]
    async fn post_transaction_against_missing_wallet_fails() {
        let store = Arc::new(FakeEventStore::default());
        let service = PostTransactionService::new(store);

        let result = service
            .execute(PostTransactionRequest {
                wallet_id: WalletId::new().to_string(),
                transaction_type: "DEPOSIT".into(),
                amount: 10,
            })
            .await;

        assert!(matches!(result, Err(DomainError::WalletNotFound(_))));
    }

    #[tokio::test]
    async fn deposit_then_withdraw_round_trips_through_store() {
        let store = Arc::new(FakeEventStore::default());
        let create = CreateWalletService::new(store.clone());
        let wallet = create
            .execute(CreateWalletRequest { name: "bob".into() })
            .await
            .unwrap();

        let post = PostTransactionService::new(store.clone());
        post.execute(PostTransactionRequest {
            wallet_id: wallet.id.to_string(),
            transaction_type: "deposit".into(),
            amount: 100,
        })
        .await
        .unwrap();

        let final_wallet = post
            .execute(PostTransactionRequest {
                wallet_id: wallet.id.to_string(),
                transaction_type: "WITHDRAW".into(),
                amount: 30,
            })
            .await
            .unwrap();

        assert_eq!(final_wallet.balance.get(), 70);
        assert_eq!(store.events.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn withdraw_over_balance_is_rejected_without_appending() {
        let store = Arc::new(FakeEventStore::default());
        let create = CreateWalletService::new(store.clone());
        let wallet = create
            .execute(CreateWalletRequest { name: "carol".into() })
            .await
            .unwrap();

        let post = PostTransactionService::new(store.clone());
        let result = post
            .execute(PostTransactionRequest {
                wallet_id: wallet.id.to_string(),
                transaction_type: "WITHDRAW".into(),
                amount: 1,
            })
            .await;

        assert!(matches!(result, Err(DomainError::InsufficientBalance { .. })));
        assert_eq!(store.events.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn malformed_wallet_id_rejected_before_touching_store() {
        let store = Arc::new(FakeEventStore::default());
        let service = PostTransactionService::new(store);
        let result = service
            .execute(PostTransactionRequest {
                wallet_id: "not-a-uuid".into(),
                transaction_type: "DEPOSIT".into(),
                amount: 10,
            })
            .await;
        assert!(matches!(result, Err(DomainError::InvalidWalletId(_))));
    }

    #[tokio::test]
    async fn zero_amount_rejected() {
        let store = Arc::new(FakeEventStore::default());
        let service = PostTransactionService::new(store);
        let result = service
            .execute(PostTransactionRequest {
                wallet_id: WalletId::new().to_string(),
                transaction_type: "DEPOSIT".into(),
                amount: 0,
            })
            .await;
        assert!(matches!(result, Err(DomainError::InvalidAmount(_))));
    }
}
