use super::{ClaimRecord, Contact, Event, EventKind, Identity, SpinRecord};
use chrono::{DateTime, Utc};

#[cfg(feature = "ahash")]
use ahash::AHashMap as HashMap;
#[cfg(not(feature = "ahash"))]
use std::collections::HashMap;


const DEFAULT_CAPACITY: usize = 1000;

/// In-memory record ledger
///
/// Holds the spin, claim and contact record sets plus the coupon counter
/// singleton. Every method is a single step against the ledger; callers that
/// need atomicity across steps must use the combined operations such as
/// [`MemoryLedger::record_claim_within`].
///
/// The ledger is not synchronized. Share it behind a single owner (for
/// example an actor task) rather than a lock held across several steps.
///
/// # Example
///
/// ```
/// use spinwheel::{EventKind, Identity, MemoryLedger, Prize, SpinRecord};
/// use chrono::Utc;
///
/// let mut ledger = MemoryLedger::new();
/// let identity = Identity::parse("21999998888").unwrap();
/// let now = Utc::now();
///
/// ledger.record_spin(SpinRecord {
///     identity: identity.clone(),
///     prize: Prize::Combo,
///     angle: 1390.0,
///     created_at: now,
/// });
///
/// assert_eq!(ledger.count_since(&identity, EventKind::Spin, now), 1);
/// assert_eq!(ledger.next_serial(), 1);
/// ```
pub struct MemoryLedger {
    spins: HashMap<Identity, Vec<SpinRecord>>,
    claims: HashMap<Identity, Vec<ClaimRecord>>,
    contacts: HashMap<Identity, Contact>,
    coupon_counter: u64,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a ledger pre-sized for `capacity` participants
    pub fn with_capacity(capacity: usize) -> Self {
        MemoryLedger {
            spins: HashMap::with_capacity(capacity),
            claims: HashMap::with_capacity(capacity),
            contacts: HashMap::with_capacity(capacity),
            coupon_counter: 0,
        }
    }

    /// Number of `kind` events for `identity` at or after `since`
    pub fn count_since(&self, identity: &Identity, kind: EventKind, since: DateTime<Utc>) -> u64 {
        match kind {
            EventKind::Spin => count_in(self.spins.get(identity), since),
            EventKind::Claim => count_in(self.claims.get(identity), since),
        }
    }

    /// Timestamp of the oldest `kind` event at or after `since`
    pub fn earliest_since(
        &self,
        identity: &Identity,
        kind: EventKind,
        since: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        match kind {
            EventKind::Spin => earliest_in(self.spins.get(identity), since),
            EventKind::Claim => earliest_in(self.claims.get(identity), since),
        }
    }

    pub fn record_spin(&mut self, record: SpinRecord) {
        self.spins
            .entry(record.identity.clone())
            .or_default()
            .push(record);
    }

    /// Append a spin unless the owner already has `cap` spins since `since`
    pub fn record_spin_within(&mut self, record: SpinRecord, since: DateTime<Utc>, cap: u32) -> bool {
        let spins = self.spins.entry(record.identity.clone()).or_default();
        if count_in(Some(&*spins), since) >= u64::from(cap) {
            return false;
        }
        spins.push(record);
        true
    }

    /// Append a claim unless the owner already has `limit` claims since `since`
    ///
    /// Returns whether the record was stored.
    pub fn record_claim_within(
        &mut self,
        record: ClaimRecord,
        since: DateTime<Utc>,
        limit: u32,
    ) -> bool {
        let claims = self.claims.entry(record.identity.clone()).or_default();
        if count_in(Some(&*claims), since) >= u64::from(limit) {
            return false;
        }
        claims.push(record);
        true
    }

    /// Increment the coupon counter and return the new value
    pub fn next_serial(&mut self) -> u64 {
        self.coupon_counter += 1;
        self.coupon_counter
    }

    /// Last serial handed out, `0` before the first claim
    pub fn last_serial(&self) -> u64 {
        self.coupon_counter
    }

    /// Insert or rename a contact; returns `true` if the identity was new
    pub fn upsert_contact(&mut self, identity: Identity, name: String, now: DateTime<Utc>) -> bool {
        match self.contacts.get_mut(&identity) {
            Some(contact) => {
                contact.name = name;
                contact.updated_at = now;
                false
            }
            None => {
                self.contacts.insert(
                    identity.clone(),
                    Contact {
                        identity,
                        name,
                        created_at: now,
                        updated_at: now,
                    },
                );
                true
            }
        }
    }

    pub fn contact(&self, identity: &Identity) -> Option<&Contact> {
        self.contacts.get(identity)
    }

    pub fn total_spins(&self) -> usize {
        self.spins.values().map(Vec::len).sum()
    }

    pub fn total_claims(&self) -> usize {
        self.claims.values().map(Vec::len).sum()
    }

    pub fn total_contacts(&self) -> usize {
        self.contacts.len()
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

fn count_in<E: Event>(events: Option<&Vec<E>>, since: DateTime<Utc>) -> u64 {
    events.map_or(0, |events| {
        events.iter().filter(|e| e.created_at() >= since).count() as u64
    })
}

fn earliest_in<E: Event>(events: Option<&Vec<E>>, since: DateTime<Utc>) -> Option<DateTime<Utc>> {
    events?
        .iter()
        .map(Event::created_at)
        .filter(|at| *at >= since)
        .min()
}
