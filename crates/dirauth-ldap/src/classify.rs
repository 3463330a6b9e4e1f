//! Principal classification: configured group and owner rules applied to a
//! raw directory record.
//!
//! Rule order matters and later rules override earlier ones:
//!
//! 1. With no view-groups configured, every record starts as [`AccessTier::Member`].
//!    With view-groups configured, membership in at least one of them becomes
//!    a requirement — the tier starts unresolved.
//! 2. View-groups, in configured order: a match grants Member and sets the
//!    group label.
//! 3. Admin-groups, in configured order: a match grants Admin and sets the
//!    group label. Running after the view-group loop, admin membership
//!    always outranks a simultaneous view match.
//! 4. Owners: an exact `samaccountname` match grants Admin and clears the
//!    label — the break-glass escape hatch independent of group structure,
//!    evaluated last so it unconditionally wins.
//!
//! A record that leaves the tier unresolved is rejected: the caller sees no
//! principal, not a principal with a special tier.

use crate::client::{DirectoryClient, RawRecord};
use crate::config::DirectoryConfig;
use crate::membership::is_member;
use crate::principal::{AccessTier, Principal};
use dirauth_core::Result;
use tracing::debug;

const ACCOUNT_NAME: &str = "samaccountname";

/// Classifies a raw record into a [`Principal`], or `None` when the record
/// is excluded by the configured view-group requirement.
///
/// # Errors
///
/// Propagates timeouts from the membership walks.
pub async fn classify(
    client: &mut DirectoryClient,
    config: &DirectoryConfig,
    record: &RawRecord,
) -> Result<Option<Principal>> {
    let Some(username) = record.first(ACCOUNT_NAME) else {
        debug!(dn = %record.dn, "record has no account name, rejecting");
        return Ok(None);
    };
    let username = username.to_string();

    // None doubles as the "unresolved" sentinel while view-groups are being
    // checked.
    let mut tier = if config.view_groups.is_empty() {
        Some(AccessTier::Member)
    } else {
        None
    };
    let mut group_label = String::new();

    for name in &config.view_groups {
        let group_dn = config.group_dn(name);
        if is_member(client, &record.dn, group_dn.as_str(), config.max_group_depth).await? {
            tier = Some(AccessTier::Member);
            group_label = name.clone();
        }
    }

    for name in &config.admin_groups {
        let group_dn = config.group_dn(name);
        if is_member(client, &record.dn, group_dn.as_str(), config.max_group_depth).await? {
            tier = Some(AccessTier::Admin);
            group_label = name.clone();
        }
    }

    for owner in &config.owners {
        if username == *owner {
            tier = Some(AccessTier::Admin);
            group_label.clear();
        }
    }

    let Some(tier) = tier else {
        debug!(dn = %record.dn, "record matched no view group, rejecting");
        return Ok(None);
    };

    Ok(Some(Principal {
        id: record.dn.clone(),
        username,
        tier,
        group: group_label,
        attributes: record.attributes.clone(),
    }))
}
