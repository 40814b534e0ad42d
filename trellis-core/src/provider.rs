//! Identity seam.

use crate::request::Request;

/// An authentication/identity service.
///
/// The kernel does not implement identity; when configuration names a
/// provider factory, the service is constructed once at startup and made
/// available to the surrounding system through the kernel.
pub trait UserProvider: Send + Sync {
    /// Identify the user behind a request, if any.
    fn identify(&self, request: &Request) -> Option<String>;
}
