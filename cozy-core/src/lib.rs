//! Client library for the cozy task and calendar services.
//!
//! This crate holds everything a cozy frontend needs apart from rendering:
//! - `client`: typed REST clients for the auth, task, calendar and event services
//! - `query`: the shared query cache the views read through
//! - `selection` and `filter`: keeping URL query parameters in step with server data
//! - `invalidate`: mapping mutations onto the cache keys they make stale
//! - `context`: all of the above wired together in an [`AppContext`]

pub mod calendar_view;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod filter;
pub mod invalidate;
pub mod location;
pub mod model;
pub mod notify;
pub mod query;
pub mod route;
pub mod selection;
pub mod session;
pub mod task_table;
pub mod validate;

pub use config::CozyConfig;
pub use context::AppContext;
pub use error::{CozyError, CozyResult};
pub use location::{Location, MemoryHistory, Navigator};
pub use query::{Loadable, QueryCache, QueryKey};
