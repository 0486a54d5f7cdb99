//! Domain model (ids, actions, envelopes, failures, pages).

pub mod action;
pub mod envelope;
pub mod errors;
pub mod ids;
pub mod page;

pub use self::action::{Action, UnknownAction};
pub use self::envelope::{ACTION_HEADER, Envelope};
pub use self::errors::{ErrorCode, ReplyFailure};
pub use self::ids::{ConsumerId, MessageId};
pub use self::page::{
    AllPages, AllPagesReply, CreatePage, DeletePage, Done, GetPage, GetPageReply, Page, SavePage,
};
