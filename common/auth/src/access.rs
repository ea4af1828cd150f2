use std::fmt;

use serde::{Deserialize, Serialize};

/// Inverted privilege rank carried in tokens: 0 is the most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessLevel(u8);

impl AccessLevel {
    pub const SUPER_ADMIN: AccessLevel = AccessLevel(0);
    pub const ADMIN: AccessLevel = AccessLevel(1);
    pub const STAFF: AccessLevel = AccessLevel(2);
    pub const CUSTOMER: AccessLevel = AccessLevel(4);

    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u8 {
        self.0
    }

    /// Levels 0 and 1 are admin-equivalent.
    pub fn is_admin(self) -> bool {
        self <= Self::ADMIN
    }

    /// True when this level is at least as privileged as `required`.
    pub fn satisfies(self, required: AccessLevel) -> bool {
        self <= required
    }
}

impl From<u8> for AccessLevel {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
