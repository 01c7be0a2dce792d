// Karacfg Hold-Tap Tests
//
// Builder behavior of on_hold / on_hold_cmd and the records they lower to.
//
// Run with: cargo test -p karacfg-core --test hold_tap

use karacfg_core::{
    Config, HoldAction, HoldTiming, Key, MapBuilder, Modifier, ModifierSet, Target,
};
use serde_json::json;

#[test]
fn test_on_hold_records_key() {
    let mut config = Config::default();
    let map = config.rule("Test hold").map(Key::F, []);
    map.on_hold(Key::LeftShift, []);

    let hold = map.hold().unwrap();
    assert_eq!(
        hold.action,
        HoldAction::Key {
            key: Key::LeftShift,
            modifiers: ModifierSet::new(),
        }
    );
    assert_eq!(hold.timing, HoldTiming::default());
}

#[test]
fn test_on_hold_with_modifiers() {
    let mut config = Config::default();
    let map = config.rule("Test hold with modifiers").map(Key::Escape, []);
    map.on_hold(Key::V, [Modifier::LeftCommand]);

    assert_eq!(
        map.hold().unwrap().action,
        HoldAction::Key {
            key: Key::V,
            modifiers: ModifierSet::from([Modifier::LeftCommand]),
        }
    );
}

#[test]
fn test_on_hold_cmd_records_shell() {
    let mut config = Config::default();
    let map = config.rule("Test hold command").map(Key::Tab, []);
    map.on_hold_cmd("open -b 'com.apple.Safari'");

    assert_eq!(
        map.hold().unwrap().action,
        HoldAction::Shell("open -b 'com.apple.Safari'".to_string())
    );
}

#[test]
fn test_timing_setters() {
    let mut config = Config::default();
    let map = config.rule("Test multiple args").map(Key::Escape, []);
    map.on_hold(Key::LeftControl, [])
        .hold_threshold_ms(200)
        .hold_delayed_action_ms(500)
        .hold_alone_timeout_ms(100)
        .desc("Chained configuration");

    let timing = map.hold().unwrap().timing;
    assert_eq!(timing.threshold_ms, Some(200));
    assert_eq!(timing.delayed_action_ms, Some(500));
    assert_eq!(timing.alone_timeout_ms, Some(100));
    assert_eq!(map.map().description(), Some("Chained configuration"));
}

#[test]
fn test_timing_without_hold_is_ignored() {
    let mut config = Config::default();
    let map = config.rule("Too early").map(Key::A, []);
    map.hold_threshold_ms(300);

    assert!(map.hold().is_none());
}

#[test]
fn test_later_hold_replaces_action_and_keeps_timing() {
    let mut config = Config::default();
    let map = config.rule("Test overwrite").map(Key::F, []);
    map.on_hold(Key::LeftShift, []).hold_threshold_ms(250);
    map.on_hold_cmd("echo test");

    let hold = map.hold().unwrap();
    assert_eq!(hold.action, HoldAction::Shell("echo test".to_string()));
    assert_eq!(hold.timing.threshold_ms, Some(250));
}

#[test]
fn test_hold_keeps_normal_destinations() {
    let mut config = Config::default();
    let map = config.rule("Test with normal mapping").map(Key::F, []);
    map.to(Key::F).on_hold(Key::LeftShift, []);

    assert_eq!(map.map().destinations().len(), 1);
    assert_eq!(map.map().destinations()[0].target, Target::Key(Key::F));
    assert!(map.hold().is_some());
}

#[test]
fn test_hold_record_defaults_tap_to_source_key() {
    let mut config = Config::default();
    config
        .rule("Space")
        .map(Key::Spacebar, [])
        .on_hold(Key::ReturnOrEnter, []);

    let output = config.compile().unwrap();
    let record = serde_json::to_value(&output.rules()[0].manipulators[0]).unwrap();
    assert_eq!(
        record,
        json!({
            "description": "spacebar",
            "type": "basic",
            "from": {"key_code": "spacebar"},
            "to_if_alone": [{"key_code": "spacebar", "halt": true}],
            "to_if_held_down": [{"key_code": "return_or_enter"}],
            "to_delayed_action": {"to_if_canceled": [{"key_code": "spacebar"}]},
            "parameters": {
                "basic.to_if_held_down_threshold_milliseconds": 150,
                "basic.to_delayed_action_delay_milliseconds": 150
            }
        })
    );
}

#[test]
fn test_hold_record_with_shell_and_rule_timing() {
    let mut config = Config::default();
    let rule = config.rule("Home Rows");
    rule.set_on_hold(HoldTiming::new(170, 120));
    rule.map(Key::Tab, [])
        .to(Key::Tab)
        .on_hold_cmd("open -a Safari")
        .hold_alone_timeout_ms(400);
    rule.map(Key::F, [])
        .on_hold(Key::LeftShift, [])
        .hold_threshold_ms(220);

    let output = config.compile().unwrap();
    let records = &output.rules()[0].manipulators;
    assert_eq!(output.rules()[0].description, "Home Rows (2)\n  + [ tab ] : tab\n  + [ f ] : f");

    let tab = serde_json::to_value(&records[0]).unwrap();
    assert_eq!(tab["to_if_held_down"], json!([{"shell_command": "open -a Safari"}]));
    assert_eq!(
        tab["parameters"],
        json!({
            "basic.to_if_alone_timeout_milliseconds": 400,
            "basic.to_if_held_down_threshold_milliseconds": 170,
            "basic.to_delayed_action_delay_milliseconds": 120
        })
    );

    let f = serde_json::to_value(&records[1]).unwrap();
    assert_eq!(f["parameters"]["basic.to_if_held_down_threshold_milliseconds"], 220);
    assert_eq!(f["parameters"]["basic.to_delayed_action_delay_milliseconds"], 120);
    assert_eq!(f["to_if_held_down"], json!([{"key_code": "left_shift"}]));
}

#[test]
fn test_blank_hold_command_fails() {
    let mut config = Config::default();
    config.rule("Blank").map(Key::A, []).on_hold_cmd("  ");

    assert!(config.compile().is_err());
}

#[test]
fn test_rule_without_hold_is_plain() {
    let mut config = Config::default();
    config.rule("Arrows").map(Key::H, [Modifier::LeftControl]).to(Key::LeftArrow);

    let output = config.compile().unwrap();
    let record = serde_json::to_value(&output.rules()[0].manipulators[0]).unwrap();
    assert_eq!(
        record,
        json!({
            "description": "h+left_control",
            "type": "basic",
            "from": {"key_code": "h", "modifiers": {"mandatory": ["left_control"]}},
            "to": [{"key_code": "left_arrow"}]
        })
    );
}
