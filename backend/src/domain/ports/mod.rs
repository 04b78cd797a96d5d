//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod identity_resolver;
mod user_directory;

#[cfg(test)]
pub use identity_resolver::{MockIdentityResolver, MockTokenIssuer};
pub use identity_resolver::{IdentityResolver, IdentityResolverError, TokenIssuer};
#[cfg(test)]
pub use user_directory::MockUserDirectory;
pub use user_directory::{UserDirectory, UserDirectoryError};
