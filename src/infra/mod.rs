// Adapters for the application ports

pub mod jsonl_queue;
pub mod log_notifier;
pub mod memory_queue;

pub use jsonl_queue::{JsonLinesSink, JsonLinesSource};
pub use log_notifier::LogNotifier;
pub use memory_queue::InMemoryQueue;
