//! Transport seam: where the final response leaves the kernel.

use crate::error::BoxError;
use crate::response::Response;

/// The layer that carries the final response back to the client.
///
/// `Kernel::handle` sends exactly one response through this, exactly once,
/// per call. The wire representation is out of scope for the kernel.
pub trait Transport: Send + Sync {
    /// Send the final response.
    fn send(&self, response: &Response) -> Result<(), BoxError>;
}
