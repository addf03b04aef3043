//! ACL blob format
//!
//! Stored form is `{"entries": {"<entry key>": "<rights letters>"}}`.

use super::{EntryKey, MailboxAcl, Rights};
use crate::error::{MailboxAclError, Result};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Serialize, Deserialize)]
struct AclJson {
    entries: BTreeMap<String, String>,
}

/// Result of a tolerant decode. A corrupted blob still yields a usable value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    Valid(MailboxAcl),
    Corrupted { reason: String },
}

impl DecodeOutcome {
    pub fn is_corrupted(&self) -> bool {
        matches!(self, DecodeOutcome::Corrupted { .. })
    }

    /// The decoded ACL, or `EMPTY` when the blob could not be read.
    pub fn into_acl(self) -> MailboxAcl {
        match self {
            DecodeOutcome::Valid(acl) => acl,
            DecodeOutcome::Corrupted { .. } => MailboxAcl::EMPTY,
        }
    }
}

pub fn serialize(acl: &MailboxAcl) -> Result<Bytes> {
    let mut entries = BTreeMap::new();
    for (key, rights) in acl.entries() {
        let serialized = key.serialize();
        if entries.contains_key(&serialized) {
            return Err(MailboxAclError::MalformedInput(format!(
                "entry keys collide on '{}'",
                serialized
            )));
        }
        entries.insert(serialized, rights.to_string());
    }
    Ok(Bytes::from(serde_json::to_vec(&AclJson { entries })?))
}

pub fn deserialize(data: &[u8]) -> Result<MailboxAcl> {
    let json: AclJson = serde_json::from_slice(data)?;

    json.entries
        .iter()
        .try_fold(MailboxAcl::EMPTY, |acl, (key, rights)| {
            let key = EntryKey::deserialize(key)?;
            let rights: Rights = rights.parse()?;
            Ok::<_, MailboxAclError>(acl.union(&key, rights))
        })
}

pub fn deserialize_tolerant(data: &[u8]) -> DecodeOutcome {
    match deserialize(data) {
        Ok(acl) => DecodeOutcome::Valid(acl),
        Err(e) => DecodeOutcome::Corrupted {
            reason: e.to_string(),
        },
    }
}
