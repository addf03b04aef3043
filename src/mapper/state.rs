use crate::acl::MailboxAcl;
use crate::error::MailboxAclError;
use crate::storage::VersionedAcl;
use crate::types::Version;

/// Progress of a single read-modify-write cycle.
///
/// `attempt` counts conditional writes that lost a race so far.
#[derive(Debug)]
pub enum UpdateState {
    Reading {
        attempt: u32,
    },
    Writing {
        attempt: u32,
        current: VersionedAcl,
        updated: MailboxAcl,
        next_version: Version,
    },
    Retrying {
        attempt: u32,
    },
    Done {
        old: MailboxAcl,
        new: MailboxAcl,
        version: Version,
    },
    Failed(MailboxAclError),
}

impl UpdateState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, UpdateState::Done { .. } | UpdateState::Failed(_))
    }

    pub fn attempt(&self) -> Option<u32> {
        match self {
            UpdateState::Reading { attempt }
            | UpdateState::Writing { attempt, .. }
            | UpdateState::Retrying { attempt } => Some(*attempt),
            UpdateState::Done { .. } | UpdateState::Failed(_) => None,
        }
    }
}
