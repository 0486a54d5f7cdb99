//! wiki-core
//!
//! The database side of the wiki and the bus that reaches it.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, action, envelope, errors, page）
//! - **bus**: channel ごとに受け手 1 つの request/reply バス
//! - **typed**: 型付き Action API（ActionRequest, Handler, ActionRegistry, BusClient）
//! - **ports**: 抽象化レイヤー（PageStore）
//! - **impls**: 実装（SqlitePageStore, QueryTable）
//! - **app**: DatabaseService と handler の組み立て
//! - **config**: DatabaseConfig

pub mod app;
pub mod bus;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;
pub mod typed;

pub use app::{DatabaseService, ServiceState, StartError};
pub use bus::{BusConfig, EventBus};
pub use config::DatabaseConfig;
pub use domain::{Action, Envelope, ErrorCode, ReplyFailure};
pub use typed::BusClient;
