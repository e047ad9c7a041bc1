//! Real-time fan-out to connected viewers

pub mod broadcaster;

pub use broadcaster::EventBus;
