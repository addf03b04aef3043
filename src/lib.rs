pub mod acl;
pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod mapper;
pub mod metrics;
pub mod rights_index;
pub mod storage;
pub mod types;

pub use error::{MailboxAclError, Result};
pub use config::Config;
pub use mapper::{AclMapper, AclUpdate, UpdateContext};
