//! Infrastructure layer: stream storage and the commit/checkout unit of work.

pub mod config;
pub mod event_store;
pub mod stream_processor;
pub mod unit_of_work;

pub use config::UnitOfWorkConfig;
pub use event_store::{AppendOutcome, InMemoryStreamStorage, StorageError, StreamStorage};
pub use stream_processor::StreamProcessor;
pub use unit_of_work::{UnitOfWork, UnitOfWorkError};

#[cfg(test)]
mod integration_tests;
