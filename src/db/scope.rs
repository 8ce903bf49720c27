use serde::Serialize;

/// Organization used when nothing else is configured (single-tenant installs).
pub const DEFAULT_ORGANIZATION_ID: i32 = 1;

/// The set of rows an organization may see: its own rows plus the global rows
/// stored with a NULL organization.
///
/// Every org-or-NULL filter in the crate is produced here so the rule lives in
/// one place.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct EffectiveScope {
    organization_id: i32,
}

pub fn resolve_scope(organization_id: i32) -> EffectiveScope {
    EffectiveScope { organization_id }
}

impl EffectiveScope {
    pub fn organization_id(&self) -> i32 {
        self.organization_id
    }

    /// Rows owned by the organization or shared globally.
    /// The organization id must be bound at `$placeholder`.
    pub fn visible(&self, column: &str, placeholder: usize) -> String {
        format!("({column} = ${placeholder} OR {column} IS NULL)")
    }

    /// Rows owned by the organization only.
    pub fn owned(&self, column: &str, placeholder: usize) -> String {
        format!("{column} = ${placeholder}")
    }
}
