//! storefront Library
//!
//! Re-exports modules for integration testing and external use.

pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod notifier;
pub mod store;

mod error;

pub use config::Config;
pub use domain::{Category, DomainError, Product};
pub use error::{AppError, AppResult};
pub use notifier::{ChangeNotifier, HttpBuildHook, NotifierConfig, NotifierHandle};
pub use store::{ChangeEvent, DocumentStore, StoreConnection, StoreError};
