//! Route table and discovery.

mod discovery;
mod table;

pub use discovery::{DiscoveryError, RouteDiscovery};
pub use table::{RouteInsertError, RouteTable};
