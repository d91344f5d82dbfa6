use std::collections::HashSet;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{Error, Mode, Result};

/// Identifier of a user, opaque to the access list.
pub type UserId = u64;

/// The persisted access list record.
///
/// Both fields are required when decoding; a record missing either one is
/// treated as corrupt rather than defaulted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccessListState {
    mode: Mode,
    allowed_users: Vec<UserId>,
}

impl AccessListState {
    /// Current mode.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Members in insertion order.
    #[must_use]
    pub fn users(&self) -> &[UserId] {
        &self.allowed_users
    }

    /// Whether `user_id` is a member.
    #[must_use]
    pub fn contains(&self, user_id: UserId) -> bool {
        self.allowed_users.contains(&user_id)
    }

    /// Whether `user_id` may use the system under the current mode.
    #[must_use]
    pub fn is_allowed(&self, user_id: UserId) -> bool {
        self.mode.allows(self.contains(user_id))
    }

    /// Checks that the member list holds no duplicates.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptState`] naming the first repeated id.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.allowed_users.len());
        for user_id in &self.allowed_users {
            if !seen.insert(user_id) {
                return Err(Error::CorruptState(format!(
                    "user {user_id} is listed more than once"
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let state: Self =
            serde_json::from_slice(bytes).map_err(|e| Error::CorruptState(e.to_string()))?;
        state.validate()?;
        Ok(state)
    }

    pub(crate) fn to_bytes(&self) -> Result<Bytes> {
        serde_json::to_vec_pretty(self)
            .map(Bytes::from)
            .map_err(|e| Error::Serialize(e.to_string()))
    }

    pub(crate) fn insert(&mut self, user_id: UserId) -> bool {
        if self.contains(user_id) {
            return false;
        }
        self.allowed_users.push(user_id);
        true
    }

    pub(crate) fn remove(&mut self, user_id: UserId) -> bool {
        match self.allowed_users.iter().position(|&id| id == user_id) {
            Some(index) => {
                self.allowed_users.remove(index);
                true
            }
            None => false,
        }
    }

    pub(crate) fn clear(&mut self) -> usize {
        let count = self.allowed_users.len();
        self.allowed_users.clear();
        count
    }

    pub(crate) fn set_mode(&mut self, mode: Mode) -> bool {
        let changed = self.mode != mode;
        self.mode = mode;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_record_layout() {
        let bytes = AccessListState::default().to_bytes().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(
            value,
            serde_json::json!({ "mode": "blacklist", "allowed_users": [] })
        );
    }

    #[test]
    fn test_record_is_pretty_printed() {
        let mut state = AccessListState::default();
        state.insert(7);
        let text = String::from_utf8(state.to_bytes().unwrap().to_vec()).unwrap();

        assert!(text.contains("\n  \"mode\": \"blacklist\""));
    }

    #[test]
    fn test_decode_preserves_order() {
        let state = AccessListState::from_bytes(
            br#"{"mode": "whitelist", "allowed_users": [30, 10, 20]}"#,
        )
        .unwrap();

        assert_eq!(state.mode(), Mode::Whitelist);
        assert_eq!(state.users(), &[30, 10, 20]);
    }

    #[test]
    fn test_decode_rejects_corrupt_records() {
        let cases: &[&[u8]] = &[
            b"",
            b"not json",
            br#"{"mode": "greylist", "allowed_users": []}"#,
            br#"{"allowed_users": []}"#,
            br#"{"mode": "blacklist"}"#,
            br#"{"mode": "blacklist", "allowed_users": [1, 2, 1]}"#,
            br#"{"mode": "blacklist", "allowed_users": [-1]}"#,
            br#"{"mode": "blacklist", "allowed_users": ["42"]}"#,
            br#"{"mode": "blacklist", "allowed_users": [], "extra": true}"#,
        ];

        for bytes in cases {
            assert!(
                matches!(
                    AccessListState::from_bytes(bytes),
                    Err(Error::CorruptState(_))
                ),
                "expected corrupt: {}",
                String::from_utf8_lossy(bytes)
            );
        }
    }

    #[test]
    fn test_insert_and_remove() {
        let mut state = AccessListState::default();

        assert!(state.insert(1));
        assert!(state.insert(2));
        assert!(!state.insert(1));
        assert_eq!(state.users(), &[1, 2]);

        assert!(state.remove(1));
        assert!(!state.remove(1));
        assert_eq!(state.users(), &[2]);
    }

    #[test]
    fn test_clear_returns_count() {
        let mut state = AccessListState::default();
        state.insert(1);
        state.insert(2);

        assert_eq!(state.clear(), 2);
        assert_eq!(state.clear(), 0);
        assert!(state.users().is_empty());
    }

    #[test]
    fn test_set_mode_reports_change() {
        let mut state = AccessListState::default();

        assert!(!state.set_mode(Mode::Blacklist));
        assert!(state.set_mode(Mode::Whitelist));
        assert_eq!(state.mode(), Mode::Whitelist);
    }
}
