//! Per-recipient message queues with one-tick delivery delay.
//!
//! Agents write into an [`Outbox`] while they tick.  At the end of the tick
//! the simulation hands every outbox to [`PostOffice::post`] and then calls
//! [`PostOffice::deliver`]; from the next tick on each recipient reads its
//! mail exactly once with [`PostOffice::take`].  Nothing sent during a tick
//! is visible during that same tick.

use std::collections::BTreeSet;

use tx_core::{AgentRef, TaxiId};
use tx_dispatch::{Envelope, Outbox, Outgoing, Recipient};

#[cfg(feature = "fx-hash")]
type InboxMap = rustc_hash::FxHashMap<AgentRef, Vec<Envelope>>;

#[cfg(not(feature = "fx-hash"))]
type InboxMap = std::collections::HashMap<AgentRef, Vec<Envelope>>;

/// Mail routing for every registered agent.
#[derive(Default)]
pub struct PostOffice {
    /// Broadcast recipients, iterated in ascending id order.
    taxis:   BTreeSet<TaxiId>,
    /// Posted this tick, not yet readable.
    staged:  Vec<Outgoing>,
    /// One inbox per registered agent.
    inboxes: InboxMap,
    dropped: u64,
}

impl PostOffice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give `agent` an inbox.  Taxis also start receiving broadcasts.
    pub fn register(&mut self, agent: AgentRef) {
        if let AgentRef::Taxi(id) = agent {
            self.taxis.insert(id);
        }
        self.inboxes.entry(agent).or_default();
    }

    /// Close `agent`'s inbox.  Unread and later mail to it is discarded.
    pub fn forget(&mut self, agent: AgentRef) {
        if let AgentRef::Taxi(id) = agent {
            self.taxis.remove(&id);
        }
        self.inboxes.remove(&agent);
    }

    /// Queue everything in `outbox` for the end-of-tick delivery.
    pub fn post(&mut self, outbox: &mut Outbox) {
        self.staged.extend(outbox.drain());
    }

    /// Move staged messages into their recipients' inboxes.  Returns the
    /// number of envelopes delivered.
    ///
    /// Broadcasts reach every registered taxi except the sender, in
    /// ascending id order.  Mail for unregistered agents is dropped.
    pub fn deliver(&mut self) -> usize {
        let mut delivered = 0;
        for msg in std::mem::take(&mut self.staged) {
            let envelope = Envelope { from: msg.from, payload: msg.payload };
            match msg.to {
                Recipient::Taxis => {
                    for &taxi in &self.taxis {
                        let to = AgentRef::Taxi(taxi);
                        if to == msg.from {
                            continue;
                        }
                        if let Some(inbox) = self.inboxes.get_mut(&to) {
                            inbox.push(envelope);
                            delivered += 1;
                        }
                    }
                }
                Recipient::One(to) => match self.inboxes.get_mut(&to) {
                    Some(inbox) => {
                        inbox.push(envelope);
                        delivered += 1;
                    }
                    None => {
                        self.dropped += 1;
                        tracing::trace!(target: "post", from = %msg.from, %to, "mail for unregistered agent dropped");
                    }
                },
            }
        }
        delivered
    }

    /// Read and consume `agent`'s inbox.
    pub fn take(&mut self, agent: AgentRef) -> Vec<Envelope> {
        self.inboxes.get_mut(&agent).map(std::mem::take).unwrap_or_default()
    }

    /// Messages waiting in `agent`'s inbox.
    pub fn unread(&self, agent: AgentRef) -> usize {
        self.inboxes.get(&agent).map_or(0, Vec::len)
    }

    /// Messages posted but not yet delivered.
    pub fn staged(&self) -> usize {
        self.staged.len()
    }

    /// Messages discarded because their recipient had no inbox.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}
