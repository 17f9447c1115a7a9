//! Extension item negotiation.
//!
//! Legacy numeric IDs are fixed by declaration order, but extension items are
//! addressed by identifier string and only gain a numeric ID per connection.
//! Both peers advertise the identifiers they understand; the connection-local
//! ID table is then derived from the intersection alone, sorted
//! lexicographically, so both sides compute identical tables without any
//! extra coordination round.

use skirmish_schema::Schema;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// First numeric ID handed to negotiated extension items. Leaves the entire
/// legacy ID space below it untouched.
pub const EX_ID_BASE: i32 = 1 << 16;

/// Progress of the extension negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// No advertisement exchanged yet.
    Unresolved,
    /// We advertised; the peer's list is still outstanding.
    Negotiating,
    /// ID table frozen for the lifetime of the connection.
    Resolved,
}

/// Per-connection extension ID table.
///
/// Once resolved the table is frozen: renegotiation requires an explicit
/// [`reset`](Handshake::reset), which a transport would pair with tearing
/// down the connection state that depended on the old IDs.
#[derive(Debug)]
pub struct Handshake {
    state: HandshakeState,
    by_id: BTreeMap<i32, String>,
    by_ident: BTreeMap<String, i32>,
}

impl Default for Handshake {
    fn default() -> Self {
        Self::new()
    }
}

impl Handshake {
    /// Start unresolved.
    pub fn new() -> Self {
        Self {
            state: HandshakeState::Unresolved,
            by_id: BTreeMap::new(),
            by_ident: BTreeMap::new(),
        }
    }

    /// The identifiers to advertise to the peer: every extension item in the
    /// schema, lexicographically sorted. Moves the state to `Negotiating`.
    pub fn local_advertisement(&mut self, schema: &Schema) -> Vec<String> {
        if self.state == HandshakeState::Unresolved {
            self.state = HandshakeState::Negotiating;
        }
        schema.ex_idents().map(str::to_string).collect()
    }

    /// Resolve the table from the peer's advertised identifiers.
    ///
    /// Only identifiers both sides know get an ID: the intersection is
    /// sorted, deduplicated and numbered from [`EX_ID_BASE`] in one sequence
    /// across all categories. Identifiers we do not recognize are skipped
    /// (the peer is newer than us; its advertisement is not an error).
    pub fn resolve<I, S>(&mut self, schema: &Schema, peer_idents: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if self.state == HandshakeState::Resolved {
            warn!("duplicate extension advertisement ignored; table already frozen");
            return;
        }

        // BTreeMap gives the lexicographic order and deduplication for free.
        self.by_ident.clear();
        for ident in peer_idents {
            let ident = ident.as_ref();
            if schema.ex_item(ident).is_some() {
                self.by_ident.insert(ident.to_string(), 0);
            } else {
                debug!(ident, "peer advertised unknown extension identifier");
            }
        }

        self.by_id.clear();
        for (index, (ident, id)) in self.by_ident.iter_mut().enumerate() {
            *id = EX_ID_BASE + index as i32;
            self.by_id.insert(*id, ident.clone());
        }

        self.state = HandshakeState::Resolved;
        debug!(extensions = self.by_id.len(), "extension handshake resolved");
    }

    /// Connection-local ID for an extension identifier, once resolved.
    pub fn ext_id(&self, ident: &str) -> Option<i32> {
        self.by_ident.get(ident).copied()
    }

    /// Extension identifier behind a connection-local ID, once resolved.
    pub fn ident_for(&self, id: i32) -> Option<&str> {
        self.by_id.get(&id).map(String::as_str)
    }

    /// Current negotiation state.
    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Whether the ID table is frozen and usable.
    pub fn is_resolved(&self) -> bool {
        self.state == HandshakeState::Resolved
    }

    /// Drop the table and return to `Unresolved`, for reconnection.
    pub fn reset(&mut self) {
        self.state = HandshakeState::Unresolved;
        self.by_id.clear();
        self.by_ident.clear();
    }
}
