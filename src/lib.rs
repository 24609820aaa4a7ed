//! mockdir
//!
//! A directory-backed HTTP mock server: request paths map to files under a
//! data directory and their contents come back as responses.
//!
//! # Features
//!
//! - **File-backed responses**: any file under the data root is servable
//! - **In-memory caching**: each file is read from disk once, then served
//!   from memory keyed by its resolved path
//! - **Live invalidation**: a filesystem watcher clears exactly the cache
//!   entries whose files were written, while the server keeps running
//! - **Routing modes**: direct path joining, or an enumerated route table
//!   where `__S__` in a filename encodes `/` in the route
//! - **Latency simulation**: fixed or random per-request delays
//! - **Response templates**: opt-in Handlebars rendering against the JSON
//!   request body
//!
//! # Example configuration
//!
//! ```yaml
//! data_dir: ./data
//! port: 8080
//! delay:
//!   fixed_ms: 0
//! unescape_request_query: true
//! template: false
//! routing: direct
//! ```

pub mod cache;
pub mod config;
pub mod resolver;
pub mod server;
pub mod sniff;
pub mod store;
pub mod template;
pub mod watcher;

pub use cache::ResponseCache;
pub use config::{DelayConfig, RoutingMode, ServerConfig};
pub use server::AppState;
pub use watcher::{spawn_watcher, WatcherHandle};
