use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// How membership in the access list is interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Listed users are denied, everyone else is allowed.
    #[default]
    Blacklist,

    /// Only listed users are allowed.
    Whitelist,
}

impl Mode {
    /// Decides access for a user given whether they are a member of the list.
    #[must_use]
    pub const fn allows(self, is_member: bool) -> bool {
        match self {
            Self::Blacklist => !is_member,
            Self::Whitelist => is_member,
        }
    }

    /// The other mode.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Blacklist => Self::Whitelist,
            Self::Whitelist => Self::Blacklist,
        }
    }

    /// Lowercase name, as persisted.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Blacklist => "blacklist",
            Self::Whitelist => "whitelist",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("blacklist") {
            Ok(Self::Blacklist)
        } else if s.eq_ignore_ascii_case("whitelist") {
            Ok(Self::Whitelist)
        } else {
            Err(Error::InvalidArgument(format!(
                "unknown mode {s:?}, expected \"blacklist\" or \"whitelist\""
            )))
        }
    }
}
