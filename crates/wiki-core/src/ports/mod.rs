//! Ports - 抽象化レイヤー
//!
//! The database service only talks to storage through `PageStore`; the
//! SQLite adapter in `impls` is the production implementation.

pub mod store;

pub use self::store::{PageStore, StoreError};
