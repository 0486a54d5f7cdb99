//! Page model and the per-action request/reply bodies.

use serde::{Deserialize, Serialize};

use super::action::Action;
use crate::typed::ActionRequest;

/// One row of the `pages` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: i64,
    pub name: String,
    pub content: String,
}

/// Reply body for actions that only acknowledge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Done {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllPages {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllPagesReply {
    /// Page names, sorted by byte order.
    pub pages: Vec<String>,
}

impl ActionRequest for AllPages {
    const ACTION: Action = Action::AllPages;
    type Reply = AllPagesReply;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetPage {
    pub page: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPageReply {
    pub found: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_content: Option<String>,
}

impl GetPageReply {
    pub fn found(id: i64, raw_content: String) -> Self {
        Self {
            found: true,
            id: Some(id),
            raw_content: Some(raw_content),
        }
    }

    pub fn not_found() -> Self {
        Self {
            found: false,
            id: None,
            raw_content: None,
        }
    }
}

impl ActionRequest for GetPage {
    const ACTION: Action = Action::GetPage;
    type Reply = GetPageReply;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePage {
    pub title: String,
    pub markdown: String,
}

impl ActionRequest for CreatePage {
    const ACTION: Action = Action::CreatePage;
    type Reply = Done;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavePage {
    pub id: i64,
    pub markdown: String,
}

impl ActionRequest for SavePage {
    const ACTION: Action = Action::SavePage;
    type Reply = Done;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletePage {
    pub id: i64,
}

impl ActionRequest for DeletePage {
    const ACTION: Action = Action::DeletePage;
    type Reply = Done;
}
