//! Processors drive records through filters, a layout, appenders and child
//! processors. They differ in where and when that work happens.

mod async_wait;
mod async_wait_free;
mod buffered;
mod default;
mod exclusive;
mod sync;
mod worker;

pub use async_wait::AsyncWaitProcessor;
pub use async_wait_free::AsyncWaitFreeProcessor;
pub use buffered::BufferedProcessor;
pub use default::DefaultProcessor;
pub use exclusive::ExclusiveProcessor;
pub use sync::SyncProcessor;
pub use worker::ThreadHooks;

use crate::{element::Element, record::Record};

pub trait Processor: Element + Send + Sync {
    /// Returns `false` if any filter rejects the record.
    fn filter_record(&self, record: &Record) -> bool;

    /// Runs the record through the pipeline. Returns `false` to stop
    /// sibling processors from seeing the record.
    fn process_record(&self, record: &mut Record) -> bool;

    fn flush(&self);
}
