//! Live game-server directory core: a self-refreshing server list, a TTL
//! and request-coalescing mod metadata cache, and the filter/sort/paginate
//! view over the list.

pub mod config;
pub mod error;
pub mod models;
pub mod storage;
pub mod transport;
pub mod utils;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use config::Config;
pub use error::{FetchError, Result};
pub use storage::directory::{ServerDirectoryStore, Snapshot, Subscription};
pub use storage::mod_cache::{Catalog, ModInfoCache};
pub use transport::{HttpTransport, Transport};
pub use view::pipeline::ViewPipeline;
pub use view::state::ViewState;
