pub mod instrument;

pub use instrument::{instrument_request, UNMATCHED_ENDPOINT};
