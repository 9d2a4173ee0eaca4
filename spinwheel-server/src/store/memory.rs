use crate::error::StoreError;
use crate::store::Store;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use spinwheel::{ClaimRecord, Contact, EventKind, Identity, MemoryLedger, SpinRecord};
use tokio::sync::{mpsc, oneshot};

/// Message types for the ledger actor
pub enum LedgerMessage {
    CountEvents {
        identity: Identity,
        kind: EventKind,
        since: DateTime<Utc>,
        response_tx: oneshot::Sender<u64>,
    },
    EarliestEvent {
        identity: Identity,
        kind: EventKind,
        since: DateTime<Utc>,
        response_tx: oneshot::Sender<Option<DateTime<Utc>>>,
    },
    InsertSpinWithin {
        record: SpinRecord,
        since: DateTime<Utc>,
        cap: u32,
        response_tx: oneshot::Sender<bool>,
    },
    InsertClaimWithin {
        record: ClaimRecord,
        since: DateTime<Utc>,
        limit: u32,
        response_tx: oneshot::Sender<bool>,
    },
    NextSerial {
        response_tx: oneshot::Sender<u64>,
    },
    LastSerial {
        response_tx: oneshot::Sender<u64>,
    },
    UpsertContact {
        identity: Identity,
        name: String,
        now: DateTime<Utc>,
        response_tx: oneshot::Sender<bool>,
    },
    FindContact {
        identity: Identity,
        response_tx: oneshot::Sender<Option<Contact>>,
    },
}

/// Handle to communicate with the ledger actor
#[derive(Clone)]
pub struct LedgerHandle {
    tx: mpsc::Sender<LedgerMessage>,
}

impl LedgerHandle {
    async fn request<T>(
        &self,
        message: impl FnOnce(oneshot::Sender<T>) -> LedgerMessage,
    ) -> Result<T, StoreError> {
        let (response_tx, response_rx) = oneshot::channel();

        self.tx
            .send(message(response_tx))
            .await
            .map_err(|_| StoreError::Unavailable("ledger actor has shut down".into()))?;

        response_rx
            .await
            .map_err(|_| StoreError::Unavailable("ledger actor dropped response channel".into()))
    }
}

/// The in-memory ledger actor
pub struct LedgerActor;

impl LedgerActor {
    /// Spawn a ledger actor owning `ledger`
    pub fn spawn(buffer_size: usize, ledger: MemoryLedger) -> LedgerHandle {
        let (tx, rx) = mpsc::channel(buffer_size);

        tokio::spawn(async move {
            run_actor(rx, ledger).await;
        });

        LedgerHandle { tx }
    }
}

async fn run_actor(mut rx: mpsc::Receiver<LedgerMessage>, mut ledger: MemoryLedger) {
    while let Some(msg) = rx.recv().await {
        handle_message(&mut ledger, msg);
    }

    tracing::info!(
        spins = ledger.total_spins(),
        claims = ledger.total_claims(),
        "Ledger actor shutting down"
    );
}

// Send errors are ignored: the requester may have gone away
fn handle_message(ledger: &mut MemoryLedger, msg: LedgerMessage) {
    match msg {
        LedgerMessage::CountEvents {
            identity,
            kind,
            since,
            response_tx,
        } => {
            let _ = response_tx.send(ledger.count_since(&identity, kind, since));
        }
        LedgerMessage::EarliestEvent {
            identity,
            kind,
            since,
            response_tx,
        } => {
            let _ = response_tx.send(ledger.earliest_since(&identity, kind, since));
        }
        LedgerMessage::InsertSpinWithin {
            record,
            since,
            cap,
            response_tx,
        } => {
            let _ = response_tx.send(ledger.record_spin_within(record, since, cap));
        }
        LedgerMessage::InsertClaimWithin {
            record,
            since,
            limit,
            response_tx,
        } => {
            let _ = response_tx.send(ledger.record_claim_within(record, since, limit));
        }
        LedgerMessage::NextSerial { response_tx } => {
            let _ = response_tx.send(ledger.next_serial());
        }
        LedgerMessage::LastSerial { response_tx } => {
            let _ = response_tx.send(ledger.last_serial());
        }
        LedgerMessage::UpsertContact {
            identity,
            name,
            now,
            response_tx,
        } => {
            let _ = response_tx.send(ledger.upsert_contact(identity, name, now));
        }
        LedgerMessage::FindContact {
            identity,
            response_tx,
        } => {
            let _ = response_tx.send(ledger.contact(&identity).cloned());
        }
    }
}

#[async_trait]
impl Store for LedgerHandle {
    async fn count_events(
        &self,
        identity: &Identity,
        kind: EventKind,
        since: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let identity = identity.clone();
        self.request(|response_tx| LedgerMessage::CountEvents {
            identity,
            kind,
            since,
            response_tx,
        })
        .await
    }

    async fn earliest_event(
        &self,
        identity: &Identity,
        kind: EventKind,
        since: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, StoreError> {
        let identity = identity.clone();
        self.request(|response_tx| LedgerMessage::EarliestEvent {
            identity,
            kind,
            since,
            response_tx,
        })
        .await
    }

    async fn insert_spin_within(
        &self,
        record: SpinRecord,
        since: DateTime<Utc>,
        cap: u32,
    ) -> Result<bool, StoreError> {
        self.request(|response_tx| LedgerMessage::InsertSpinWithin {
            record,
            since,
            cap,
            response_tx,
        })
        .await
    }

    async fn insert_claim_within(
        &self,
        record: ClaimRecord,
        since: DateTime<Utc>,
        limit: u32,
    ) -> Result<bool, StoreError> {
        self.request(|response_tx| LedgerMessage::InsertClaimWithin {
            record,
            since,
            limit,
            response_tx,
        })
        .await
    }

    async fn next_coupon_serial(&self) -> Result<u64, StoreError> {
        self.request(|response_tx| LedgerMessage::NextSerial { response_tx })
            .await
    }

    async fn last_coupon_serial(&self) -> Result<u64, StoreError> {
        self.request(|response_tx| LedgerMessage::LastSerial { response_tx })
            .await
    }

    async fn upsert_contact(
        &self,
        identity: &Identity,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let identity = identity.clone();
        let name = name.to_string();
        self.request(|response_tx| LedgerMessage::UpsertContact {
            identity,
            name,
            now,
            response_tx,
        })
        .await
    }

    async fn find_contact(&self, identity: &Identity) -> Result<Option<Contact>, StoreError> {
        let identity = identity.clone();
        self.request(|response_tx| LedgerMessage::FindContact {
            identity,
            response_tx,
        })
        .await
    }
}
