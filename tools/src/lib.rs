//! Shared pieces of the try-on dataset command-line tools.

pub mod common;

pub use common::{init_tracing, parse_fine_size, DatasetArgs};
