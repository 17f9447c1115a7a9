//! The shipped game schema.
//!
//! Declaration order below is a wire compatibility contract: legacy numeric
//! IDs are assigned by position, so existing entries must never be reordered
//! or removed once shipped — only appended. New item kinds that may still
//! change go in as extension items with a stable identifier instead.
//!
//! The frozen-snapshot tests at the bottom pin every legacy ID.

use crate::field::{
    boolean, int_any, int_range, string, string_half_strict, string_strict, tick,
};
use crate::schema::{Schema, SchemaBuilder};
use std::sync::OnceLock;

/// Identifier domain for extension objects.
pub const NETOBJ_DOMAIN: &str = "netobj.skirmish.gg";
/// Identifier domain for extension messages.
pub const NETMSG_DOMAIN: &str = "netmsg.skirmish.gg";

/// The process-wide game schema, built on first use.
///
/// Schema errors are fatal at process start by design, hence the `expect`:
/// a process must not serve connections with an invalid schema, and the
/// snapshot tests below keep the definition valid.
pub fn schema() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| build().expect("shipped schema must be valid"))
}

fn build() -> Result<Schema, crate::error::SchemaError> {
    let mut b = SchemaBuilder::new();

    b.constant("max_clients", 64);
    b.constant("num_sounds", 64);
    b.constant("team_spectators", -1);
    b.constant("team_red", 0);
    b.constant("team_blue", 1);
    b.constant("flag_missing", -3);
    b.constant("spec_freeview", -1);

    b.enumeration("emote", ["normal", "pain", "happy", "surprise", "angry", "blink"]);
    b.enumeration("powerup", ["health", "armor", "weapon", "ninja"]);
    b.enumeration(
        "emoticon",
        [
            "oop", "exclamation", "hearts", "drop", "dotdot", "music", "sorry", "ghost",
            "sushi", "splattee", "deviltee", "zomg", "zzz", "wtf", "eyes", "question",
        ],
    );
    b.enumeration("weapon", ["hammer", "pistol", "shotgun", "grenade", "laser", "ninja"]);
    b.enumeration("authed", ["no", "helper", "moderator", "admin"]);

    b.flag_set("player_flag", ["playing", "in_menu", "chatting", "scoreboard", "aim"]);
    b.flag_set("game_flag", ["teams", "flags"]);
    b.flag_set("game_state_flag", ["game_over", "sudden_death", "paused", "race_time"]);
    b.flag_set(
        "character_flag",
        [
            "solo", "jetpack", "no_collision", "endless_hook", "endless_jump", "super",
            "no_hammer_hit", "no_shotgun_hit", "no_grenade_hit", "no_laser_hit", "no_hook",
            "in_freeze", "practice_mode",
        ],
    );
    b.flag_set(
        "projectile_flag",
        ["no_owner", "explosive", "freeze", "bounce_horizontal", "bounce_vertical"],
    );

    // --- Snapshot objects ------------------------------------------------

    b.object(
        "player_input",
        vec![
            int_any("direction"),
            int_any("target_x"),
            int_any("target_y"),
            int_any("jump"),
            int_any("fire"),
            int_any("hook"),
            int_range("player_flags", 0, "player_flag_mask"),
            int_any("wanted_weapon"),
            int_any("next_weapon"),
            int_any("prev_weapon"),
        ],
    );

    b.object(
        "projectile",
        vec![
            int_any("x"),
            int_any("y"),
            int_any("vel_x"),
            int_any("vel_y"),
            int_range("kind", 0, "weapon_count-1"),
            tick("start_tick"),
        ],
    );

    b.object(
        "laser",
        vec![
            int_any("x"),
            int_any("y"),
            int_any("from_x"),
            int_any("from_y"),
            tick("start_tick"),
        ],
    );

    b.object(
        "pickup",
        vec![
            int_any("x"),
            int_any("y"),
            int_range("kind", 0, "powerup_count-1"),
            int_range("subtype", 0, "max_int"),
        ],
    );

    b.object(
        "flag",
        vec![int_any("x"), int_any("y"), int_range("team", "team_red", "team_blue")],
    );

    b.object(
        "game_info",
        vec![
            int_range("game_flags", 0, "game_flag_mask"),
            int_range("game_state_flags", 0, "game_state_flag_mask"),
            tick("round_start_tick"),
            int_range("warmup_timer", "min_int", "max_int"),
            int_range("score_limit", 0, "max_int"),
            int_range("time_limit", 0, "max_int"),
            int_range("round_num", 0, "max_int"),
            int_range("round_current", 0, "max_int"),
        ],
    );

    b.object(
        "game_data",
        vec![
            int_any("teamscore_red"),
            int_any("teamscore_blue"),
            int_range("flag_carrier_red", "flag_missing", "max_clients-1"),
            int_range("flag_carrier_blue", "flag_missing", "max_clients-1"),
        ],
    );

    b.object(
        "character_core",
        vec![
            int_any("tick"),
            int_any("x"),
            int_any("y"),
            int_any("vel_x"),
            int_any("vel_y"),
            int_any("angle"),
            int_range("direction", -1, 1),
            int_range("jumped", 0, 3),
            int_range("hooked_player", -1, "max_clients-1"),
            int_range("hook_state", -1, 5),
            tick("hook_tick"),
            int_any("hook_x"),
            int_any("hook_y"),
            int_any("hook_dx"),
            int_any("hook_dy"),
        ],
    );

    b.derived_object(
        "character",
        "character_core",
        vec![
            int_range("player_flags", 0, "player_flag_mask"),
            int_range("health", 0, 10),
            int_range("armor", 0, 10),
            int_range("ammo_count", 0, 10),
            int_range("weapon", 0, "weapon_count-1"),
            int_range("emote", 0, "emote_count-1"),
            int_range("attack_tick", 0, "max_int"),
        ],
    );

    b.object(
        "player_info",
        vec![
            int_range("local", 0, 1),
            int_range("client_id", 0, "max_clients-1"),
            int_range("team", "team_spectators", "team_blue"),
            int_any("score"),
            int_any("latency"),
        ],
    );

    b.object(
        "client_info",
        vec![
            string_strict("name"),
            string_strict("clan"),
            int_any("country"),
            string_strict("skin"),
            boolean("use_custom_color"),
            int_any("color_body"),
            int_any("color_feet"),
        ],
    );

    b.object(
        "spectator_info",
        vec![
            int_range("spectator_id", "spec_freeview", "max_clients-1"),
            int_any("x"),
            int_any("y"),
        ],
    );

    b.object_ex(
        "character_ext",
        "character@netobj.skirmish.gg",
        true,
        vec![
            int_any("flags"),
            tick("freeze_end"),
            int_range("jumps", -1, 255),
            int_range("ninja_activation_tick", -1, "max_int"),
            int_range("freeze_start", -1, "max_int"),
            int_any("target_x"),
            int_any("target_y"),
        ],
    );

    b.object_ex(
        "player_ext",
        "player@netobj.skirmish.gg",
        true,
        vec![int_any("flags"), int_range("auth_level", 0, "authed_count-1")],
    );

    // validate_size is off so older peers keep decoding this object as a
    // validated prefix when new fields are appended.
    b.object_ex(
        "game_info_ext",
        "gameinfo@netobj.skirmish.gg",
        false,
        vec![int_any("flags"), int_any("version")],
    );

    b.object_ex(
        "laser_ext",
        "laser@netobj.skirmish.gg",
        true,
        vec![
            int_any("to_x"),
            int_any("to_y"),
            int_any("from_x"),
            int_any("from_y"),
            tick("start_tick"),
            int_range("owner", -1, "max_clients-1"),
            int_any("kind"),
            int_any("subtype"),
            int_any("flags"),
        ],
    );

    // --- Events -----------------------------------------------------------

    b.event("common", vec![int_any("x"), int_any("y")]);
    b.derived_event("explosion", "common", vec![]);
    b.derived_event("spawn", "common", vec![]);
    b.derived_event("hammer_hit", "common", vec![]);
    b.derived_event("death", "common", vec![int_range("victim", 0, "max_clients-1")]);
    b.derived_event("sound_world", "common", vec![int_range("sound_id", 0, "num_sounds-1")]);
    b.derived_event("damage_indicator", "common", vec![int_any("angle")]);

    // Extension "event": shipped as an extension object, since events have
    // no identifier-negotiated variant of their own.
    b.object_ex(
        "spectator_char",
        "spec-char@netobj.skirmish.gg",
        true,
        vec![int_any("x"), int_any("y")],
    );

    // --- Server messages ---------------------------------------------------

    b.message("sv_motd", vec![string("message")]);
    b.message("sv_broadcast", vec![string("message")]);
    b.message(
        "sv_chat",
        vec![
            int_range("team", -2, 3),
            int_range("client_id", -1, "max_clients-1"),
            string_half_strict("message"),
        ],
    );
    b.message(
        "sv_kill_msg",
        vec![
            int_range("killer", 0, "max_clients-1"),
            int_range("victim", 0, "max_clients-1"),
            int_range("weapon", -3, "weapon_count-1"),
            int_any("mode_special"),
        ],
    );
    b.message("sv_sound_global", vec![int_range("sound_id", 0, "num_sounds-1")]);
    b.message("sv_ready_to_enter", vec![]);
    b.message("sv_weapon_pickup", vec![int_range("weapon", 0, "weapon_count-1")]);
    b.message(
        "sv_emoticon",
        vec![
            int_range("client_id", 0, "max_clients-1"),
            int_range("emoticon", 0, "emoticon_count-1"),
        ],
    );
    b.message("sv_vote_clear_options", vec![]);
    b.message("sv_vote_option_add", vec![string_strict("description")]);
    b.message("sv_vote_option_remove", vec![string_strict("description")]);
    b.message(
        "sv_vote_set",
        vec![
            int_range("timeout", 0, 60),
            string_strict("description"),
            string_strict("reason"),
        ],
    );
    b.message(
        "sv_vote_status",
        vec![
            int_range("yes", 0, "max_clients"),
            int_range("no", 0, "max_clients"),
            int_range("pass", 0, "max_clients"),
            int_range("total", 0, "max_clients"),
        ],
    );

    // --- Client messages ---------------------------------------------------

    b.message("cl_say", vec![boolean("team"), string_half_strict("message")]);
    b.message("cl_set_team", vec![int_range("team", "team_spectators", "team_blue")]);
    b.message(
        "cl_set_spectator_mode",
        vec![int_range("spectator_id", "spec_freeview", "max_clients-1")],
    );
    b.message(
        "cl_start_info",
        vec![
            string_strict("name"),
            string_strict("clan"),
            int_any("country"),
            string_strict("skin"),
            boolean("use_custom_color"),
            int_any("color_body"),
            int_any("color_feet"),
        ],
    );
    b.message("cl_kill", vec![]);
    b.message("cl_emoticon", vec![int_range("emoticon", 0, "emoticon_count-1")]);
    b.message("cl_vote", vec![int_range("vote", -1, 1)]);
    b.message(
        "cl_call_vote",
        vec![string_strict("kind"), string_strict("value"), string_strict("reason")],
    );

    // Legacy forms kept for peers that predate the extension handshake.
    // Whether a sender suppresses them once the extended form is negotiated
    // is transport policy, not schema policy.
    b.message(
        "sv_race_time_legacy",
        vec![int_any("time"), int_any("check"), int_range("finish", 0, 1)],
    );
    b.message("cl_show_others_legacy", vec![boolean("show")]);
    // No legacy messages may be added after this point.

    // --- Extension messages --------------------------------------------------

    b.message_ex(
        "sv_race_time",
        "race-time@netmsg.skirmish.gg",
        true,
        vec![int_any("time"), int_any("check"), int_range("finish", 0, 1)],
    );
    b.message_ex(
        "cl_show_others",
        "show-others@netmsg.skirmish.gg",
        true,
        vec![int_range("show", 0, 2)],
    );
    b.message_ex(
        "cl_show_distance",
        "show-distance@netmsg.skirmish.gg",
        true,
        vec![int_any("x"), int_any("y")],
    );
    b.message_ex("sv_teams_state", "teams-state@netmsg.skirmish.gg", true, vec![]);

    b.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemCategory;

    #[test]
    fn shipped_schema_builds() {
        let s = schema();
        assert!(s.items().count() > 0);
    }

    /// Frozen snapshot of legacy object IDs. A failure here means the wire
    /// protocol changed incompatibly: existing entries were reordered or
    /// removed. Append-only is the rule.
    #[test]
    fn object_ids_are_frozen() {
        let expected = [
            "player_input",
            "projectile",
            "laser",
            "pickup",
            "flag",
            "game_info",
            "game_data",
            "character_core",
            "character",
            "player_info",
            "client_info",
            "spectator_info",
        ];
        for (id, name) in expected.iter().enumerate() {
            assert_eq!(
                schema().legacy_item(ItemCategory::Object, id as i32).map(|i| i.name()),
                Some(*name),
                "object id {id} drifted"
            );
        }
    }

    /// Frozen snapshot of legacy event IDs.
    #[test]
    fn event_ids_are_frozen() {
        let expected = [
            "common",
            "explosion",
            "spawn",
            "hammer_hit",
            "death",
            "sound_world",
            "damage_indicator",
        ];
        for (id, name) in expected.iter().enumerate() {
            assert_eq!(
                schema().legacy_item(ItemCategory::Event, id as i32).map(|i| i.name()),
                Some(*name),
                "event id {id} drifted"
            );
        }
    }

    /// Frozen snapshot of legacy message IDs.
    #[test]
    fn message_ids_are_frozen() {
        let expected = [
            "sv_motd",
            "sv_broadcast",
            "sv_chat",
            "sv_kill_msg",
            "sv_sound_global",
            "sv_ready_to_enter",
            "sv_weapon_pickup",
            "sv_emoticon",
            "sv_vote_clear_options",
            "sv_vote_option_add",
            "sv_vote_option_remove",
            "sv_vote_set",
            "sv_vote_status",
            "cl_say",
            "cl_set_team",
            "cl_set_spectator_mode",
            "cl_start_info",
            "cl_kill",
            "cl_emoticon",
            "cl_vote",
            "cl_call_vote",
            "sv_race_time_legacy",
            "cl_show_others_legacy",
        ];
        for (id, name) in expected.iter().enumerate() {
            assert_eq!(
                schema().legacy_item(ItemCategory::Message, id as i32).map(|i| i.name()),
                Some(*name),
                "message id {id} drifted"
            );
        }
        // Nothing legacy beyond the frozen list.
        assert!(schema()
            .legacy_item(ItemCategory::Message, expected.len() as i32)
            .is_none());
    }

    #[test]
    fn extension_identifiers_use_project_domains() {
        for ident in schema().ex_idents() {
            let (_, domain) = ident.split_once('@').unwrap();
            assert!(
                domain == NETOBJ_DOMAIN || domain == NETMSG_DOMAIN,
                "unexpected identifier domain in {ident}"
            );
        }
    }

    #[test]
    fn derived_character_flattens_core_fields() {
        let character = schema().item("character").unwrap();
        let core = schema().item("character_core").unwrap();
        assert_eq!(&character.fields()[..core.fields().len()], core.fields());
        assert_eq!(character.fields().len(), core.fields().len() + 7);
    }

    #[test]
    fn legacy_and_extended_race_time_share_field_layout() {
        let legacy = schema().item("sv_race_time_legacy").unwrap();
        let ext = schema().item("sv_race_time").unwrap();
        assert_eq!(legacy.fields(), ext.fields());
    }

    #[test]
    fn game_info_ext_tolerates_growth() {
        assert!(!schema().item("game_info_ext").unwrap().validate_size());
        assert!(schema().item("character_ext").unwrap().validate_size());
    }
}
