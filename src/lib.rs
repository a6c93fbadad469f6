//! artetv - ARTE catalog browser and player adapter
//!
//! Lists the ARTE video-on-demand catalog and resolves playable streams on
//! behalf of a media-center host.
//!
//! # Modules
//!
//! - `models` - Routes, navigable items, stream variants
//! - `api` - ARTE API client (catalog and player endpoints)
//! - `host` - Contract with the host media center
//! - `navigation` - Request dispatch and listing construction
//! - `config` - Persistent settings
//! - `cli` / `terminal` - Command line host

pub mod api;
pub mod cli;
pub mod config;
pub mod host;
pub mod models;
pub mod navigation;
pub mod terminal;

// Re-export commonly used types
pub use models::{
    InfoLabels, NavigableItem, Params, Route,
    StreamVariant, StreamVariants,
};

pub use api::{ArteClient, ArteError};
pub use host::{DirectoryEntry, Host, ResolvedStream};
pub use navigation::{Addon, NavigationError};
