//! User record types — the collection element and its patch payload.
//!
//! Only `id` is typed. Every other attribute (username, email, role, color,
//! whatever the server adds next) rides in a flattened JSON map and is never
//! validated locally: the remote service owns the shape.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type UserId = u64;

/// One entity in the managed collection, uniquely keyed by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(flatten)]
    pub attrs: Map<String, Value>,
}

impl User {
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            attrs: Map::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attrs.get(key)
    }
}

/// Shallow-overwrite merge payload for `update_user`.
///
/// A patch may rewrite `id`; the store does not police id uniqueness, so a
/// patched id can collide with an existing record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    #[serde(flatten)]
    pub attrs: Map<String, Value>,
}

impl UserPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Merge into `user`: present fields overwrite, absent fields are kept.
    pub(crate) fn apply(&self, user: &mut User) {
        if let Some(id) = self.id {
            user.id = id;
        }
        for (key, value) in &self.attrs {
            user.attrs.insert(key.clone(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_extra_attributes() {
        let user: User =
            serde_json::from_str(r##"{"id":2,"username":"carol","color":"#ff0000"}"##).unwrap();
        assert_eq!(user.id, 2);
        assert_eq!(user.attr("username"), Some(&Value::from("carol")));
        assert_eq!(user.attr("color"), Some(&Value::from("#ff0000")));
    }

    #[test]
    fn serializes_flat() {
        let user = User::new(7).with_attr("username", "dave");
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json, serde_json::json!({"id": 7, "username": "dave"}));
    }

    #[test]
    fn patch_overwrites_present_fields_and_keeps_the_rest() {
        let mut user = User::new(1)
            .with_attr("username", "alice")
            .with_attr("role", "admin");
        let patch = UserPatch::new().with_attr("username", "alicia");

        patch.apply(&mut user);

        assert_eq!(user.id, 1);
        assert_eq!(user.attr("username"), Some(&Value::from("alicia")));
        assert_eq!(user.attr("role"), Some(&Value::from("admin")));
    }

    #[test]
    fn patch_can_rewrite_the_id() {
        let mut user = User::new(1);
        let patch = UserPatch {
            id: Some(9),
            attrs: Map::new(),
        };
        patch.apply(&mut user);
        assert_eq!(user.id, 9);
    }
}
