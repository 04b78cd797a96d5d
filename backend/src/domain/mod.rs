//! Domain primitives, ports, and the RPC routing core.
//!
//! Purpose: keep the user-management router transport agnostic. Inbound
//! adapters build an [`rpc::RpcEnvelope`] and hand it to
//! [`router::UserRouter`]; outbound adapters implement the traits in
//! [`ports`].
//!
//! Public surface:
//! - Error / ErrorCode: failure category and envelope status mapping.
//! - User, UserRecord, NewUser, UserPatch: user model with secrets split out.
//! - Credential, Identity: caller token and the resolved caller.
//! - TraceId: request-scoped correlation identifier.

pub mod authorization;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod ports;
pub mod router;
pub mod rpc;
pub mod trace_id;
pub mod user;

pub use self::error::{Error, ErrorCode};
pub use self::identity::{Credential, Identity};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{
    NewUser, Role, USERNAME_MAX, USERNAME_MIN, User, UserId, UserPatch, UserRecord,
    UserValidationError, Username,
};
