use std::fmt;

/// Reply codes of the FTP control channel.
///
/// Servers are free to answer with codes not listed here, so this is an
/// open set rather than an enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatusCode(pub u16);

impl StatusCode {
    pub const READY_MINUTE: Self = Self(120);
    pub const ALREADY_OPEN: Self = Self(125);
    pub const ABOUT_TO_SEND: Self = Self(150);

    pub const COMMAND_OK: Self = Self(200);
    pub const COMMAND_SUPERFLUOUS: Self = Self(202);
    pub const READY: Self = Self(220);
    pub const CLOSING: Self = Self(221);
    pub const CLOSING_DATA_CONNECTION: Self = Self(226);
    pub const PASSIVE_MODE: Self = Self(227);
    pub const EXTENDED_PASSIVE_MODE: Self = Self(229);
    pub const LOGGED_IN: Self = Self(230);
    pub const REQUESTED_FILE_ACTION_OK: Self = Self(250);
    pub const PATH_CREATED: Self = Self(257);

    pub const USER_OK: Self = Self(331);
    pub const REQUEST_FILE_PENDING: Self = Self(350);

    pub const CANNOT_OPEN_DATA_CONNECTION: Self = Self(425);
    pub const TRANSFER_ABORTED: Self = Self(426);
    pub const FILE_ACTION_IGNORED: Self = Self(450);
    pub const ABORTED: Self = Self(451);

    pub const BAD_COMMAND: Self = Self(500);
    pub const NOT_IMPLEMENTED: Self = Self(502);
    pub const NOT_LOGGED_IN: Self = Self(530);
    pub const FILE_UNAVAILABLE: Self = Self(550);

    /// 1yz: the command was accepted and another reply will follow
    #[must_use]
    pub fn is_preliminary(self) -> bool {
        (100..200).contains(&self.0)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for StatusCode {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod test_status {
    use super::*;

    #[test]
    fn test_preliminary() {
        assert!(StatusCode::READY_MINUTE.is_preliminary());
        assert!(StatusCode::ABOUT_TO_SEND.is_preliminary());
        assert!(!StatusCode::READY.is_preliminary());
        assert!(!StatusCode(99).is_preliminary());
    }
}
