pub mod client;
mod parser;
pub mod types;

pub use client::{LoginOutcome, PortalClient, PortalError, classify_login_response};
pub use parser::ParseError;

pub(crate) const BASE_URL: &str = "https://www.lokitime.com/kiinteisto";
