//! JSON merge helpers for layered configuration.

use serde_json::{Map, Value};

/// Recursively fold `overlay` into `base`; objects merge key by key and any
/// other value replaces what was there. A `null` removes the key so the
/// model default applies again.
pub(super) fn overlay(base: &mut Value, overlay: &Value) {
    let (Value::Object(base_map), Value::Object(overlay_map)) = (&mut *base, overlay) else {
        *base = overlay.clone();
        return;
    };
    for (key, value) in overlay_map {
        if value.is_null() {
            base_map.remove(key);
            continue;
        }
        match base_map.get_mut(key) {
            Some(slot) => self::overlay(slot, value),
            None => {
                base_map.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Fold `overlay` into `base` while leaving every leaf named by `locked`
/// untouched. Objects in `locked` narrow the lock to their own keys.
pub(super) fn overlay_unlocked(base: &mut Value, overlay: &Value, locked: Option<&Value>) {
    let Some(locked) = locked else {
        self::overlay(base, overlay);
        return;
    };
    let Value::Object(locked_map) = locked else {
        // A locked leaf: the requirements value wins.
        return;
    };
    let Value::Object(overlay_map) = overlay else {
        // Replacing a partially locked object wholesale would drop locked keys.
        return;
    };
    if !base.is_object() {
        *base = Value::Object(Map::new());
    }
    let Value::Object(base_map) = base else {
        return;
    };
    for (key, value) in overlay_map {
        match locked_map.get(key) {
            None if value.is_null() => {
                base_map.remove(key);
            }
            None => match base_map.get_mut(key) {
                Some(slot) => self::overlay(slot, value),
                None => {
                    base_map.insert(key.clone(), value.clone());
                }
            },
            Some(lock) => {
                let slot = base_map.entry(key.clone()).or_insert(Value::Null);
                overlay_unlocked(slot, value, Some(lock));
            }
        }
    }
}

/// Drop `null` object entries at any depth.
pub(super) fn strip_nulls(value: &mut Value) {
    if let Value::Object(map) = value {
        map.retain(|_, entry| !entry.is_null());
        map.values_mut().for_each(strip_nulls);
    }
}
