//! Acting-user reference
//!
//! Log entries point at the user who performed an action. The username is
//! copied into the entry so the history stays readable after the account is
//! removed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::UserId;
use crate::error::PartLogError;

/// Reference to the user that performed a logged action
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserRef {
    pub id: UserId,
    pub username: String,
}

impl UserRef {
    pub fn new(id: impl Into<UserId>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
        }
    }
}

impl fmt::Display for UserRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.username, self.id)
    }
}

impl FromStr for UserRef {
    type Err = PartLogError;

    /// Parse the `ID:NAME` form used on the command line
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, name) = s.split_once(':').ok_or_else(|| {
            PartLogError::InvalidArgument(format!("expected user as ID:NAME, got '{}'", s))
        })?;

        let id: UserId = id
            .parse()
            .map_err(|e| PartLogError::InvalidArgument(format!("invalid user id '{}': {}", id, e)))?;

        let name = name.trim();
        if name.is_empty() {
            return Err(PartLogError::InvalidArgument(
                "username cannot be empty".into(),
            ));
        }

        Ok(Self::new(id, name))
    }
}
