//! Outbound HTTP: the request capability workers call and its reqwest
//! implementation.
mod client;
mod issuer;
mod resolver;


pub use client::{ClientSettings, ReqwestIssuer};
pub use issuer::{HttpIssuer, IssuedResponse, OutboundRequest};
