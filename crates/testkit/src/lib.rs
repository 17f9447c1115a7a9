#![warn(missing_docs)]
//! Shared helpers for integration and fuzz tests: tracing setup, small
//! schema fixtures and record inspection utilities.

use skirmish_net::{Connection, Record, Value, WireError};
use skirmish_schema::{
    boolean, int_any, int_range, string_half_strict, string_strict, tick, Schema, SchemaBuilder,
};
use tracing_subscriber::EnvFilter;

/// Install a test tracing subscriber honoring `RUST_LOG`. Safe to call from
/// every test; only the first call wins.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A small but representative schema fixture: every field kind, a derived
/// item, range validators bound to an enum and a flags set, and extension
/// items in two categories.
pub fn arena_schema() -> Schema {
    let mut b = SchemaBuilder::new();
    b.constant("max_clients", 16);
    b.enumeration("weapon", ["hammer", "pistol", "laser"]);
    b.flag_set("state_flag", ["paused", "sudden_death", "round_over"]);

    b.object(
        "char_core",
        vec![int_any("x"), int_any("y"), tick("spawn_tick")],
    );
    b.derived_object(
        "char",
        "char_core",
        vec![
            int_range("weapon", 0, "weapon_count-1"),
            int_range("health", 0, 10),
            boolean("alive"),
        ],
    );
    b.object("game_state", vec![int_range("flags", 0, "state_flag_mask")]);
    b.event("explosion", vec![int_any("x"), int_any("y")]);
    b.message(
        "sv_chat",
        vec![
            int_range("client_id", -1, "max_clients-1"),
            string_half_strict("text"),
            string_strict("sender"),
        ],
    );
    b.object_ex("char_ext", "char@netobj.example.org", false, vec![int_any("jumps")]);
    b.message_ex("sv_teams", "teams@netmsg.example.org", true, vec![int_any("team")]);
    b.build().expect("fixture schema is valid")
}

/// A pair of connections over [`arena_schema`]-compatible schemas with the
/// extension handshake already resolved in both directions.
pub fn resolved_pair(schema: &Schema) -> (Connection<'_>, Connection<'_>) {
    let mut client = Connection::new(schema);
    let mut server = Connection::new(schema);
    let client_adv = client.local_advertisement();
    let server_adv = server.local_advertisement();
    client.apply_peer_advertisement(server_adv);
    server.apply_peer_advertisement(client_adv);
    (client, server)
}

/// Render a decoded record as JSON, for snapshot-style assertions.
pub fn record_to_json(record: &Record) -> anyhow::Result<serde_json::Value> {
    Ok(serde_json::to_value(record)?)
}

/// Assert helper: decode failed with a field-level error on `field`.
pub fn assert_field_error(result: Result<Record, WireError>, field: &str) {
    match result {
        Err(WireError::Field { field: got, .. }) if got == field => {}
        other => panic!("expected a field error on `{field}`, got {other:?}"),
    }
}

/// Shorthand for building `Value::Int`.
pub fn int(v: i32) -> Value {
    Value::Int(v)
}

/// Shorthand for building `Value::Str`.
pub fn text(s: &str) -> Value {
    Value::Str(s.to_string())
}
