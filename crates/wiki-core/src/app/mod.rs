//! App - アプリケーション層
//!
//! - **PageHandlers**: action ごとの store 呼び出し
//! - **DatabaseService**: channel の唯一の受け手

pub mod handlers;
pub mod service;

pub use self::handlers::PageHandlers;
pub use self::service::{DatabaseService, ServiceState, StartError};
