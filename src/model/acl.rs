//! Access-control lists.
//!
//! An [`Acl`] is materialized from a record's `ACL` field and flattened back
//! into it with [`Acl::to_value`]. Permission checks for a user go, in order:
//! the record owner, the user's own override, then the `others` policy.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use crate::error::Result;

/// Read/update/delete flags. An absent flag defers to the next policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<bool>,
}

/// Operation guarded by an ACL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AclOp {
    Read,
    Update,
    Delete,
}

impl Permissions {
    fn get(&self, op: AclOp) -> Option<bool> {
        match op {
            AclOp::Read => self.read,
            AclOp::Update => self.update,
            AclOp::Delete => self.delete,
        }
    }

    fn set(&mut self, op: AclOp, allowed: bool) {
        let slot = match op {
            AclOp::Read => &mut self.read,
            AclOp::Update => &mut self.update,
            AclOp::Delete => &mut self.delete,
        };
        *slot = Some(allowed);
    }
}

/// Per-user or per-role override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclEntry {
    pub uid: String,
    #[serde(flatten)]
    pub permissions: Permissions,
}

/// Wire shape of the `ACL` field.
#[derive(Debug, Default, Deserialize)]
struct AclData {
    #[serde(default)]
    disable: bool,
    #[serde(default)]
    others: Permissions,
    #[serde(default)]
    users: Vec<AclEntry>,
    #[serde(default)]
    roles: Vec<AclEntry>,
    #[serde(default)]
    can: Vec<String>,
}

/// Permission view over a record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Acl {
    disabled: bool,
    others: Permissions,
    users: Vec<AclEntry>,
    roles: Vec<AclEntry>,
    can: Vec<String>,
    owner_uid: Option<String>,
}

impl Acl {
    /// Empty ACL: nothing allowed for anyone but the owner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Materialize from an `ACL` field value.
    ///
    /// `owner_uid` is the uid of the user owning the record, who is always
    /// allowed. A missing or null field is an empty ACL.
    ///
    /// # Errors
    ///
    /// [`Error::Json`] if the field is not a valid ACL.
    pub fn try_from_value(data: Option<&Value>, owner_uid: Option<&str>) -> Result<Self> {
        let data: AclData = match data {
            None | Some(Value::Null) => AclData::default(),
            Some(value) => serde_json::from_value(value.clone())?,
        };

        Ok(Self {
            disabled: data.disable,
            others: data.others,
            users: data.users,
            roles: data.roles,
            can: data.can,
            owner_uid: owner_uid.filter(|u| !u.is_empty()).map(String::from),
        })
    }

    /// Like [`Acl::try_from_value`], but malformed data yields an empty ACL
    /// and a warning. Writing such an ACL back replaces the server's one.
    pub fn from_value(data: Option<&Value>, owner_uid: Option<&str>) -> Self {
        Self::try_from_value(data, owner_uid).unwrap_or_else(|e| {
            warn!("Ignoring malformed ACL: {}", e);
            Self {
                owner_uid: owner_uid.filter(|u| !u.is_empty()).map(String::from),
                ..Self::default()
            }
        })
    }

    /// The write-back shape, `{disable, others, users, roles}`.
    pub fn to_value(&self) -> Value {
        json!({
            "disable": self.disabled,
            "others": self.others,
            "users": self.users,
            "roles": self.roles,
        })
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn disable(&mut self) {
        self.disabled = true;
    }

    pub fn enable(&mut self) {
        self.disabled = false;
    }

    pub fn others(&self) -> &Permissions {
        &self.others
    }

    pub fn users(&self) -> &[AclEntry] {
        &self.users
    }

    pub fn roles(&self) -> &[AclEntry] {
        &self.roles
    }

    // ===== Capabilities granted to the caller =====

    /// Whether the server says the caller may update the record.
    pub fn can_update(&self) -> bool {
        self.can.iter().any(|c| c == "update")
    }

    /// Whether the server says the caller may delete the record.
    pub fn can_delete(&self) -> bool {
        self.can.iter().any(|c| c == "delete")
    }

    // ===== Others =====

    pub fn can_others_read(&self) -> bool {
        self.others.read.unwrap_or(false)
    }

    pub fn can_others_update(&self) -> bool {
        self.others.update.unwrap_or(false)
    }

    pub fn can_others_delete(&self) -> bool {
        self.others.delete.unwrap_or(false)
    }

    pub fn others_read(&mut self, allowed: bool) {
        self.others.set(AclOp::Read, allowed);
    }

    pub fn others_update(&mut self, allowed: bool) {
        self.others.set(AclOp::Update, allowed);
    }

    pub fn others_delete(&mut self, allowed: bool) {
        self.others.set(AclOp::Delete, allowed);
    }

    // ===== Users =====

    pub fn can_user_read(&self, user_uid: &str) -> bool {
        self.can_user(user_uid, AclOp::Read)
    }

    pub fn can_user_update(&self, user_uid: &str) -> bool {
        self.can_user(user_uid, AclOp::Update)
    }

    pub fn can_user_delete(&self, user_uid: &str) -> bool {
        self.can_user(user_uid, AclOp::Delete)
    }

    pub fn user_read(&mut self, user_uid: &str, allowed: bool) {
        upsert(&mut self.users, user_uid, AclOp::Read, allowed);
    }

    pub fn user_update(&mut self, user_uid: &str, allowed: bool) {
        upsert(&mut self.users, user_uid, AclOp::Update, allowed);
    }

    pub fn user_delete(&mut self, user_uid: &str, allowed: bool) {
        upsert(&mut self.users, user_uid, AclOp::Delete, allowed);
    }

    // ===== Roles =====

    pub fn can_role_read(&self, role_uid: &str) -> bool {
        self.can_role(role_uid, AclOp::Read)
    }

    pub fn can_role_update(&self, role_uid: &str) -> bool {
        self.can_role(role_uid, AclOp::Update)
    }

    pub fn can_role_delete(&self, role_uid: &str) -> bool {
        self.can_role(role_uid, AclOp::Delete)
    }

    pub fn role_read(&mut self, role_uid: &str, allowed: bool) {
        upsert(&mut self.roles, role_uid, AclOp::Read, allowed);
    }

    pub fn role_update(&mut self, role_uid: &str, allowed: bool) {
        upsert(&mut self.roles, role_uid, AclOp::Update, allowed);
    }

    pub fn role_delete(&mut self, role_uid: &str, allowed: bool) {
        upsert(&mut self.roles, role_uid, AclOp::Delete, allowed);
    }

    /// Owner, then user override, then others.
    pub fn can_user(&self, user_uid: &str, op: AclOp) -> bool {
        if self.owner_uid.as_deref() == Some(user_uid) {
            return true;
        }
        lookup(&self.users, user_uid, op).unwrap_or_else(|| self.others.get(op).unwrap_or(false))
    }

    /// Role override, then others.
    pub fn can_role(&self, role_uid: &str, op: AclOp) -> bool {
        lookup(&self.roles, role_uid, op).unwrap_or_else(|| self.others.get(op).unwrap_or(false))
    }
}

fn lookup(entries: &[AclEntry], uid: &str, op: AclOp) -> Option<bool> {
    entries
        .iter()
        .find(|e| e.uid == uid)
        .and_then(|e| e.permissions.get(op))
}

fn upsert(entries: &mut Vec<AclEntry>, uid: &str, op: AclOp, allowed: bool) {
    match entries.iter_mut().find(|e| e.uid == uid) {
        Some(entry) => entry.permissions.set(op, allowed),
        None => {
            let mut permissions = Permissions::default();
            permissions.set(op, allowed);
            entries.push(AclEntry {
                uid: uid.to_string(),
                permissions,
            });
        }
    }
}
