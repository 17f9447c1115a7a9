//! End-to-end flow over the shipped game schema: legacy traffic before the
//! handshake, extension traffic after, and forward compatibility with peers
//! that know more item kinds.

use skirmish_net::{Connection, Value, WireError, EX_ID_BASE};
use skirmish_schema::defs;
use skirmish_schema::ItemCategory;
use skirmish_testkit::{init_tracing, int, resolved_pair, text};

#[test]
fn chat_round_trip_without_handshake() {
    init_tracing();
    let schema = defs::schema();
    let server = Connection::new(schema);
    let client = Connection::new(schema);

    let (id, bytes) = server
        .encode("sv_chat", &[int(0), int(3), text("top row to mid")])
        .unwrap();
    let record = client.decode(ItemCategory::Message, id, &bytes).unwrap();
    assert_eq!(record.item, "sv_chat");
    assert_eq!(record.get("client_id"), Some(&Value::Int(3)));
    assert_eq!(record.get("message"), Some(&Value::Str("top row to mid".into())));
}

#[test]
fn character_snapshot_round_trip() {
    init_tracing();
    let schema = defs::schema();
    let conn = Connection::new(schema);

    let item = schema.item("character").unwrap();
    let values: Vec<Value> = item
        .fields()
        .iter()
        .enumerate()
        .map(|(i, f)| match f.name.as_str() {
            "hook_tick" => Value::Tick(1200),
            "health" | "armor" | "ammo_count" => Value::Int(10),
            "direction" => Value::Int(-1),
            "jumped" | "weapon" | "emote" => Value::Int(1),
            "hooked_player" | "hook_state" => Value::Int(-1),
            "player_flags" => Value::Int(0b101),
            "attack_tick" => Value::Int(900),
            _ => Value::Int(i as i32 * 17 - 40),
        })
        .collect();

    let (id, bytes) = conn.encode("character", &values).unwrap();
    let record = conn.decode(ItemCategory::Object, id, &bytes).unwrap();
    assert_eq!(record.get("health"), Some(&Value::Int(10)));
    assert_eq!(record.get("hook_tick"), Some(&Value::Tick(1200)));
}

#[test]
fn race_time_upgrades_after_handshake() {
    init_tracing();
    let schema = defs::schema();
    let (server, client) = resolved_pair(schema);

    // Extended form, identifier-negotiated ID.
    let (ext_id, bytes) = server.encode("sv_race_time", &[int(61_000), int(2), int(0)]).unwrap();
    assert!(ext_id >= EX_ID_BASE);
    let record = client.decode(ItemCategory::Message, ext_id, &bytes).unwrap();
    assert_eq!(record.item, "sv_race_time");

    // Legacy form still decodes under its frozen ID.
    let (legacy_id, bytes) =
        server.encode("sv_race_time_legacy", &[int(61_000), int(2), int(0)]).unwrap();
    assert!(legacy_id < EX_ID_BASE);
    let record = client.decode(ItemCategory::Message, legacy_id, &bytes).unwrap();
    assert_eq!(record.item, "sv_race_time_legacy");
}

#[test]
fn game_info_ext_from_a_newer_peer() {
    init_tracing();
    let schema = defs::schema();
    let (server, client) = resolved_pair(schema);

    let (id, mut bytes) = server.encode("game_info_ext", &[int(1), int(7)]).unwrap();
    // A newer peer appended a field we do not know about.
    bytes.push(0x05);
    let record = client.decode(ItemCategory::Object, id, &bytes).unwrap();
    assert_eq!(record.get("version"), Some(&Value::Int(7)));
}

#[test]
fn unknown_message_id_does_not_poison_the_connection() {
    init_tracing();
    let schema = defs::schema();
    let (server, client) = resolved_pair(schema);

    assert!(matches!(
        client.decode(ItemCategory::Message, 4000, &[0x01]),
        Err(WireError::UnknownItem { category: ItemCategory::Message, id: 4000 })
    ));

    let (id, bytes) = server.encode("sv_ready_to_enter", &[]).unwrap();
    assert!(client.decode(ItemCategory::Message, id, &bytes).is_ok());
}

#[test]
fn asymmetric_advertisements_agree_on_the_intersection() {
    init_tracing();
    let schema = defs::schema();
    let mut server = Connection::new(schema);
    let mut client = Connection::new(schema);

    // Simulate a client build that predates one extension: it neither
    // advertises the identifier nor accepts it from the server.
    let stale = "show-distance@netmsg.skirmish.gg";
    let mut server_adv = server.local_advertisement();
    let mut client_adv = client.local_advertisement();
    client_adv.retain(|ident| ident != stale);
    server_adv.retain(|ident| ident != stale);

    server.apply_peer_advertisement(client_adv);
    client.apply_peer_advertisement(server_adv);

    // Remaining extensions get the same IDs on both sides.
    for name in ["sv_teams_state", "character_ext", "sv_race_time"] {
        let item = schema.item(name).unwrap();
        assert_eq!(server.wire_id(item).unwrap(), client.wire_id(item).unwrap(), "item {name}");
    }

    // The stale extension is unusable in either direction.
    let missing = schema.item("cl_show_distance").unwrap();
    assert!(client.wire_id(missing).is_err());
    assert!(server.wire_id(missing).is_err());
}
