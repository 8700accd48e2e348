//! Presence derivation.
//!
//! The presence view is never stored: it is recomputed from the current
//! membership on every change. These are pure functions over
//! `(user_id, username)` pairs listed in registration order.

use std::collections::HashSet;

use serde_json::{Value, json};

use super::value_object::UserId;

/// One entry of the presence view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnlineUser {
    pub id: UserId,
    pub username: String,
}

impl OnlineUser {
    pub fn new(id: UserId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
        }
    }

    pub fn to_json(&self) -> Value {
        json!({ "id": self.id.as_str(), "username": self.username })
    }
}

/// Build the deduplicated online-user list.
///
/// A user holding several connections appears once; the display name of the
/// earliest registered connection wins and the list keeps first-seen order.
pub fn build_online_users<'a, I>(members: I) -> Vec<OnlineUser>
where
    I: IntoIterator<Item = (&'a UserId, &'a str)>,
{
    let mut seen = HashSet::new();
    members
        .into_iter()
        .filter(|(user_id, _)| seen.insert(*user_id))
        .map(|(user_id, username)| OnlineUser::new(user_id.clone(), username))
        .collect()
}

/// Count the live connections held by `user_id`.
pub fn count_connections_for<'a, I>(members: I, user_id: &UserId) -> usize
where
    I: IntoIterator<Item = (&'a UserId, &'a str)>,
{
    members
        .into_iter()
        .filter(|(member, _)| *member == user_id)
        .count()
}
