//! ActionRequest - ties a request body type to its action and reply type.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::domain::Action;

/// A request body that can be sent over the bus.
///
/// ```ignore
/// #[derive(Serialize, Deserialize)]
/// struct GetPage { page: String }
///
/// impl ActionRequest for GetPage {
///     const ACTION: Action = Action::GetPage;
///     type Reply = GetPageReply;
/// }
/// ```
///
/// `ACTION` が header に載り、`Reply` が受け手から返る型になります。
pub trait ActionRequest: Serialize + DeserializeOwned + Send + Sync + 'static {
    const ACTION: Action;
    type Reply: Serialize + DeserializeOwned + Send + 'static;
}
