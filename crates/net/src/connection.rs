//! Per-connection protocol state: the shared schema plus the negotiated
//! extension ID table, with encode/decode entry points that route between
//! the legacy and extension ID spaces.

use crate::codec::{decode_fields, encode_fields, Record, Value};
use crate::error::WireError;
use crate::handshake::{Handshake, HandshakeState, EX_ID_BASE};
use skirmish_schema::{Item, ItemCategory, Schema};
use tracing::warn;

/// One peer's protocol state.
///
/// The schema is shared read-only across connections; only the handshake
/// table is per-connection.
#[derive(Debug)]
pub struct Connection<'s> {
    schema: &'s Schema,
    handshake: Handshake,
}

impl<'s> Connection<'s> {
    /// New connection with an unresolved extension table.
    pub fn new(schema: &'s Schema) -> Self {
        Self { schema, handshake: Handshake::new() }
    }

    /// The schema this connection speaks.
    pub fn schema(&self) -> &'s Schema {
        self.schema
    }

    /// Extension identifiers to send to the peer.
    pub fn local_advertisement(&mut self) -> Vec<String> {
        self.handshake.local_advertisement(self.schema)
    }

    /// Feed the peer's advertised identifiers, freezing the extension table.
    pub fn apply_peer_advertisement<I, S>(&mut self, idents: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.handshake.resolve(self.schema, idents);
    }

    /// Current handshake state.
    pub fn handshake_state(&self) -> HandshakeState {
        self.handshake.state()
    }

    /// Drop the negotiated table, for reconnection.
    pub fn reset_handshake(&mut self) {
        self.handshake.reset();
    }

    /// Resolve a received wire ID to its item.
    ///
    /// IDs below [`EX_ID_BASE`] address the legacy space; IDs at or above it
    /// address the negotiated extension table. An extension item resolved for
    /// the wrong category is treated as unknown, not as a field error.
    fn item_for(&self, category: ItemCategory, id: i32) -> Result<&'s Item, WireError> {
        if id < EX_ID_BASE {
            return self
                .schema
                .legacy_item(category, id)
                .ok_or(WireError::UnknownItem { category, id });
        }

        if !self.handshake.is_resolved() {
            return Err(WireError::HandshakeNotComplete);
        }
        self.handshake
            .ident_for(id)
            .and_then(|ident| self.schema.ex_item(ident))
            .filter(|item| item.category() == category)
            .ok_or(WireError::UnknownItem { category, id })
    }

    /// Decode one item payload received under `(category, id)`.
    ///
    /// [`WireError::UnknownItem`] is recoverable: the caller skips this
    /// item's bytes and continues with the next one, so an older build keeps
    /// talking to a newer peer.
    pub fn decode(
        &self,
        category: ItemCategory,
        id: i32,
        bytes: &[u8],
    ) -> Result<Record, WireError> {
        let item = match self.item_for(category, id) {
            Ok(item) => item,
            Err(err) => {
                if matches!(err, WireError::UnknownItem { .. }) {
                    warn!(%category, id, "skipping unknown item");
                }
                return Err(err);
            }
        };
        decode_fields(item, bytes)
    }

    /// Wire ID for an item on this connection.
    ///
    /// Legacy items carry their fixed ID. Extension items require a resolved
    /// handshake and an identifier the peer advertised; otherwise the item
    /// cannot be sent on this connection.
    pub fn wire_id(&self, item: &Item) -> Result<i32, WireError> {
        if let Some(id) = item.legacy_id() {
            return Ok(id);
        }
        if !self.handshake.is_resolved() {
            return Err(WireError::HandshakeNotComplete);
        }
        item.ident()
            .and_then(|ident| self.handshake.ext_id(ident))
            .ok_or(WireError::UnknownItem { category: item.category(), id: -1 })
    }

    /// Encode an item by name, yielding its wire ID and payload.
    pub fn encode(&self, name: &str, values: &[Value]) -> Result<(i32, Vec<u8>), WireError> {
        let item = self.schema.item(name).ok_or_else(|| {
            // Encoding a name absent from our own schema is a caller bug,
            // reported through the same unknown-item path.
            WireError::UnknownItem { category: ItemCategory::Message, id: -1 }
        })?;
        let id = self.wire_id(item)?;
        let bytes = encode_fields(item, values)?;
        Ok((id, bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_schema::{int_any, string_half_strict, SchemaBuilder};

    fn arena_schema() -> Schema {
        let mut b = SchemaBuilder::new();
        b.object("projectile", vec![int_any("x"), int_any("y")]);
        b.message("sv_chat", vec![int_any("client_id"), string_half_strict("text")]);
        b.object_ex("projectile_ext", "projectile@netobj.example.org", true, vec![int_any("vel")]);
        b.message_ex("sv_teams", "teams@netmsg.example.org", true, vec![int_any("team")]);
        b.build().unwrap()
    }

    fn resolved_connection(schema: &Schema) -> Connection<'_> {
        let mut conn = Connection::new(schema);
        let adv = conn.local_advertisement();
        conn.apply_peer_advertisement(adv);
        conn
    }

    #[test]
    fn legacy_items_work_without_handshake() {
        let schema = arena_schema();
        let conn = Connection::new(&schema);

        let (id, bytes) = conn.encode("projectile", &[Value::Int(3), Value::Int(-4)]).unwrap();
        assert_eq!(id, 0);

        let record = conn.decode(ItemCategory::Object, id, &bytes).unwrap();
        assert_eq!(record.item, "projectile");
        assert_eq!(record.get("y"), Some(&Value::Int(-4)));
    }

    #[test]
    fn extension_items_require_resolution() {
        let schema = arena_schema();
        let conn = Connection::new(&schema);
        assert_eq!(
            conn.encode("sv_teams", &[Value::Int(1)]).unwrap_err(),
            WireError::HandshakeNotComplete
        );
        assert_eq!(
            conn.decode(ItemCategory::Message, EX_ID_BASE, &[]).unwrap_err(),
            WireError::HandshakeNotComplete
        );
    }

    #[test]
    fn extension_round_trip_after_handshake() {
        let schema = arena_schema();
        let conn = resolved_connection(&schema);

        let (id, bytes) = conn.encode("sv_teams", &[Value::Int(2)]).unwrap();
        assert!(id >= EX_ID_BASE);

        let record = conn.decode(ItemCategory::Message, id, &bytes).unwrap();
        assert_eq!(record.item, "sv_teams");
        assert_eq!(record.get("team"), Some(&Value::Int(2)));
    }

    #[test]
    fn both_sides_assign_identical_extension_ids() {
        let schema = arena_schema();
        let mut client = Connection::new(&schema);
        let mut server = Connection::new(&schema);

        let client_adv = client.local_advertisement();
        let mut server_adv = server.local_advertisement();
        server_adv.reverse();

        client.apply_peer_advertisement(server_adv);
        server.apply_peer_advertisement(client_adv);

        let item = schema.item("projectile_ext").unwrap();
        assert_eq!(client.wire_id(item).unwrap(), server.wire_id(item).unwrap());
    }

    // An older build shipping a subset of the extensions.
    fn versioned_schema(with_ping: bool) -> Schema {
        let mut b = SchemaBuilder::new();
        b.object("projectile", vec![int_any("x"), int_any("y")]);
        b.object_ex("projectile_ext", "projectile@netobj.example.org", true, vec![int_any("vel")]);
        b.message_ex("sv_teams", "teams@netmsg.example.org", true, vec![int_any("team")]);
        if with_ping {
            b.message_ex("sv_ping", "ping@netmsg.example.org", true, vec![int_any("t")]);
        }
        b.build().unwrap()
    }

    #[test]
    fn different_schema_builds_agree_on_shared_extension_ids() {
        let old_build = versioned_schema(false);
        let new_build = versioned_schema(true);
        let mut old_peer = Connection::new(&old_build);
        let mut new_peer = Connection::new(&new_build);

        let old_adv = old_peer.local_advertisement();
        let new_adv = new_peer.local_advertisement();
        old_peer.apply_peer_advertisement(new_adv);
        new_peer.apply_peer_advertisement(old_adv);

        // The ping extension sorts before both shared identifiers, so a
        // table computed over the local set instead of the intersection
        // would shift every shared ID on the newer side.
        for name in ["projectile_ext", "sv_teams"] {
            let old_item = old_build.item(name).unwrap();
            let new_item = new_build.item(name).unwrap();
            assert_eq!(
                old_peer.wire_id(old_item).unwrap(),
                new_peer.wire_id(new_item).unwrap(),
                "item {name}"
            );
        }

        // The extension the old build lacks is unusable on the new side.
        let ping = new_build.item("sv_ping").unwrap();
        assert_eq!(
            new_peer.wire_id(ping).unwrap_err(),
            WireError::UnknownItem { category: ItemCategory::Message, id: -1 }
        );

        // Traffic flows across the version gap.
        let (id, bytes) = new_peer.encode("sv_teams", &[Value::Int(1)]).unwrap();
        let record = old_peer.decode(ItemCategory::Message, id, &bytes).unwrap();
        assert_eq!(record.get("team"), Some(&Value::Int(1)));
    }

    #[test]
    fn unadvertised_extension_cannot_be_sent() {
        let schema = arena_schema();
        let mut conn = Connection::new(&schema);
        conn.local_advertisement();
        // Peer only knows one of our two extensions.
        conn.apply_peer_advertisement(["teams@netmsg.example.org"]);

        assert!(conn.encode("sv_teams", &[Value::Int(0)]).is_ok());
        assert_eq!(
            conn.encode("projectile_ext", &[Value::Int(0)]).unwrap_err(),
            WireError::UnknownItem { category: ItemCategory::Object, id: -1 }
        );
    }

    #[test]
    fn unknown_id_is_recoverable() {
        let schema = arena_schema();
        let conn = resolved_connection(&schema);

        assert_eq!(
            conn.decode(ItemCategory::Message, 99, &[]).unwrap_err(),
            WireError::UnknownItem { category: ItemCategory::Message, id: 99 }
        );
        assert_eq!(
            conn.decode(ItemCategory::Object, EX_ID_BASE + 50, &[]).unwrap_err(),
            WireError::UnknownItem { category: ItemCategory::Object, id: EX_ID_BASE + 50 }
        );

        // The connection keeps decoding after an unknown item.
        let (id, bytes) = conn.encode("projectile", &[Value::Int(1), Value::Int(2)]).unwrap();
        assert!(conn.decode(ItemCategory::Object, id, &bytes).is_ok());
    }

    #[test]
    fn extension_id_under_wrong_category_is_unknown() {
        let schema = arena_schema();
        let conn = resolved_connection(&schema);

        let item = schema.item("sv_teams").unwrap();
        let id = conn.wire_id(item).unwrap();
        assert_eq!(
            conn.decode(ItemCategory::Object, id, &[]).unwrap_err(),
            WireError::UnknownItem { category: ItemCategory::Object, id }
        );
    }

    #[test]
    fn reset_returns_to_legacy_only_operation() {
        let schema = arena_schema();
        let mut conn = resolved_connection(&schema);
        conn.reset_handshake();
        assert_eq!(conn.handshake_state(), HandshakeState::Unresolved);
        assert_eq!(
            conn.encode("sv_teams", &[Value::Int(0)]).unwrap_err(),
            WireError::HandshakeNotComplete
        );
        assert!(conn.encode("sv_chat", &[Value::Int(0), Value::Str("gg".into())]).is_ok());
    }
}
