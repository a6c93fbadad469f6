//! ARTE API client
//!
//! - arte: HTTP session, authentication and the two endpoints
//! - item: raw catalog items, routing and listing rows
//! - streams: player configuration and stream versions

pub mod arte;
pub mod item;
pub mod streams;

pub use arte::{ArteClient, ArteError, DEFAULT_LANGUAGE, LANGUAGES};
