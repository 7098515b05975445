//! Host-agnostic key representation.
//!
//! The session only distinguishes the keys its state machine reacts to;
//! everything else is `Other` and falls through to a query update. Hosts
//! translate their own key events into this enum.

/// Keys routed to the autocomplete session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Backspace,
    Tab,
    Enter,
    Escape,
    Up,
    Down,
    Shift,
    Control,
    Alt,
    Other,
}

impl Key {
    /// Navigation and modifier keys never change the query.
    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            Key::Up | Key::Down | Key::Shift | Key::Control | Key::Alt
        )
    }
}

/// What the session did with a key-down, so the host knows whether to
/// suppress its default behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDisposition {
    /// The session consumed the key; the host must not apply its default.
    Consumed,
    /// The key is not the session's concern.
    Ignored,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation_keys() {
        assert!(Key::Up.is_navigation());
        assert!(Key::Down.is_navigation());
        assert!(Key::Shift.is_navigation());
        assert!(Key::Control.is_navigation());
        assert!(Key::Alt.is_navigation());
        assert!(!Key::Backspace.is_navigation());
        assert!(!Key::Char('a').is_navigation());
        assert!(!Key::Other.is_navigation());
    }
}
