//! Fetch layer
//!
//! GET requests with retry/backoff and body decoding that tolerates
//! mislabelled gzip payloads and non-UTF-8 charsets.

mod decode;
mod fetcher;

pub use decode::{decode_body, decompress_if_gzip, is_gzip};
pub use fetcher::{backoff_delay, build_http_client, FetchOutcome, FetchedPage, Fetcher};
