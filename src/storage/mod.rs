pub mod memory;
pub mod traits;
pub mod versioned;

pub use memory::{InMemoryRightsIndex, InMemoryRowStore};
pub use traits::{AclRow, RightsIndex, RowStore, WriteOutcome};
pub use versioned::{VersionedAcl, VersionedAclStore, INITIAL_VERSION};
