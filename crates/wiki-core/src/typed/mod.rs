//! Typed - 型付き Action API
//!
//! Action の typo を型で排除し、Handler との対応付けを静的に保証します。
//!
//! - **表層（Typed）**: `ActionRequest`, `Handler<T>`, `BusClient`
//! - **内部（Dyn）**: `DynHandler` で型消去して `ActionRegistry` に格納

pub mod client;
pub mod handler;
pub mod registry;
pub mod request;

pub use self::client::BusClient;
pub use self::handler::{DynHandler, Handler, TypedHandler};
pub use self::registry::{ActionRegistry, RegistryError};
pub use self::request::ActionRequest;
