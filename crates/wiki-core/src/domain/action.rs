//! Action - the closed set of operations the database service understands.
//!
//! The action travels in the `action` header of an envelope. Inside the
//! process it is always an `Action`; the string form only exists on the wire,
//! so `FromStr` is the one place an unknown action can show up.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    AllPages,
    GetPage,
    CreatePage,
    SavePage,
    DeletePage,
}

impl Action {
    /// Every action, in declaration order.
    pub const ALL: [Action; 5] = [
        Action::AllPages,
        Action::GetPage,
        Action::CreatePage,
        Action::SavePage,
        Action::DeletePage,
    ];

    /// Header value used on the bus.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::AllPages => "all-pages",
            Action::GetPage => "get-page",
            Action::CreatePage => "create-page",
            Action::SavePage => "save-page",
            Action::DeletePage => "delete-page",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The header carried an action string nobody knows.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown action '{0}'")]
pub struct UnknownAction(pub String);

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all-pages" => Ok(Action::AllPages),
            "get-page" => Ok(Action::GetPage),
            "create-page" => Ok(Action::CreatePage),
            "save-page" => Ok(Action::SavePage),
            "delete-page" => Ok(Action::DeletePage),
            other => Err(UnknownAction(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("all-pages", Action::AllPages)]
    #[case("get-page", Action::GetPage)]
    #[case("create-page", Action::CreatePage)]
    #[case("save-page", Action::SavePage)]
    #[case("delete-page", Action::DeletePage)]
    fn header_value_parses(#[case] raw: &str, #[case] expected: Action) {
        assert_eq!(raw.parse::<Action>().unwrap(), expected);
        assert_eq!(expected.as_str(), raw);
    }

    #[rstest]
    #[case("")]
    #[case("ALL_PAGES")]
    #[case("All-Pages")]
    #[case("drop-table")]
    fn unknown_header_value_keeps_the_raw_string(#[case] raw: &str) {
        let err = raw.parse::<Action>().unwrap_err();
        assert_eq!(err, UnknownAction(raw.to_string()));
    }

    #[test]
    fn serde_uses_header_spelling() {
        for action in Action::ALL {
            let json = serde_json::to_value(action).unwrap();
            assert_eq!(json, serde_json::json!(action.as_str()));
        }
    }
}
