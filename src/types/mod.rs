// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Mirror names and bind addresses are validated before they reach the runtime.

mod bind_address;
mod id;
mod mirror_name;

pub use bind_address::{BindAddress, BindAddressError};
pub use id::{ContainerId, ExecId, NetworkId};
pub use mirror_name::{MirrorName, MirrorNameError};
