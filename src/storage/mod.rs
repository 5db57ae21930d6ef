pub mod durable;

pub use durable::DurableWriter;
