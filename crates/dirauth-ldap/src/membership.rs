//! Transitive group-membership resolution.
//!
//! A principal belongs to a group either directly (the group DN appears in
//! its `memberOf` attribute) or through group nesting (one of its groups is
//! itself a member of the target). The directory is walked lazily, one read
//! per node, with a visited set and a depth cap: Active Directory permits
//! circular group nesting, so the walk must terminate regardless of the
//! graph shape.

use crate::client::DirectoryClient;
use dirauth_core::Result;
use std::collections::HashSet;
use tracing::trace;

const MEMBER_OF: &str = "memberof";

/// Returns true if `principal_dn` transitively belongs to `target_group_dn`.
///
/// DN comparison is case-insensitive, matching directory semantics. A node
/// that cannot be read ends its branch; branches deeper than `max_depth`
/// nesting edges are abandoned.
///
/// # Errors
///
/// Propagates [`dirauth_core::Error::Timeout`] from directory reads; every
/// other read failure is treated as "no memberships" for that node.
pub async fn is_member(
    client: &mut DirectoryClient,
    principal_dn: &str,
    target_group_dn: &str,
    max_depth: usize,
) -> Result<bool> {
    let target = target_group_dn.to_ascii_lowercase();
    let attributes = [MEMBER_OF.to_string()];

    let mut visited: HashSet<String> = HashSet::new();
    visited.insert(principal_dn.to_ascii_lowercase());
    let mut pending: Vec<(String, usize)> = vec![(principal_dn.to_string(), 0)];

    while let Some((dn, depth)) = pending.pop() {
        if depth >= max_depth {
            trace!(dn = %dn, depth, "group walk depth cap reached, abandoning branch");
            continue;
        }

        let Some(entry) = client.read_by_dn(&dn, &attributes).await? else {
            continue;
        };
        let Some(groups) = entry.values(MEMBER_OF) else {
            continue;
        };

        for group_dn in groups {
            let normalized = group_dn.to_ascii_lowercase();
            if normalized == target {
                return Ok(true);
            }
            if visited.insert(normalized) {
                pending.push((group_dn.clone(), depth + 1));
            }
        }
    }

    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::{client_with_session, record};
    use crate::client::MockLdapSession;

    const USER: &str = "CN=jsmith,OU=People,DC=corp";
    const STAFF: &str = "CN=Staff,OU=Groups,DC=corp";
    const IT: &str = "CN=IT,OU=Groups,DC=corp";
    const UNREACHABLE: &str = "CN=Nowhere,OU=Groups,DC=corp";

    /// Mock session that serves `memberOf` edges from a static table.
    fn session_with_edges(edges: &'static [(&'static str, &'static [&'static str])]) -> MockLdapSession {
        let mut session = MockLdapSession::new();
        session.expect_search().returning(move |base, _, _, _| {
            let groups = edges
                .iter()
                .find(|(dn, _)| *dn == base)
                .map(|(_, groups)| *groups)
                .unwrap_or(&[]);
            if groups.is_empty() {
                Ok(vec![record(base, &[])])
            } else {
                Ok(vec![record(base, &[(MEMBER_OF, groups)])])
            }
        });
        session
    }

    #[tokio::test]
    async fn direct_membership() {
        let mut client = client_with_session(session_with_edges(&[(USER, &[STAFF])]));
        assert!(is_member(&mut client, USER, STAFF, 25).await.unwrap());
    }

    #[tokio::test]
    async fn schema_cased_member_of_attribute_matches() {
        // Servers answer with the schema casing of the attribute name, not
        // the requested one.
        let mut session = MockLdapSession::new();
        session
            .expect_search()
            .returning(|base, _, _, _| Ok(vec![record(base, &[("memberOf", &[STAFF])])]));
        let mut client = client_with_session(session);
        assert!(is_member(&mut client, USER, STAFF, 25).await.unwrap());
    }

    #[tokio::test]
    async fn membership_is_case_insensitive() {
        let mut client = client_with_session(session_with_edges(&[(USER, &[STAFF])]));
        assert!(
            is_member(&mut client, USER, "cn=staff,ou=groups,dc=corp", 25)
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn nested_membership() {
        // jsmith -> Staff -> IT
        let mut client =
            client_with_session(session_with_edges(&[(USER, &[STAFF]), (STAFF, &[IT])]));
        assert!(is_member(&mut client, USER, IT, 25).await.unwrap());
    }

    #[tokio::test]
    async fn absent_membership() {
        let mut client =
            client_with_session(session_with_edges(&[(USER, &[STAFF]), (STAFF, &[IT])]));
        assert!(!is_member(&mut client, USER, UNREACHABLE, 25).await.unwrap());
    }

    #[tokio::test]
    async fn cyclic_nesting_terminates() {
        // Staff and IT contain each other; the target is reachable from
        // neither. The walk must visit each node once and return false.
        let mut client = client_with_session(session_with_edges(&[
            (USER, &[STAFF]),
            (STAFF, &[IT]),
            (IT, &[STAFF]),
        ]));
        assert!(!is_member(&mut client, USER, UNREACHABLE, 25).await.unwrap());
    }

    #[tokio::test]
    async fn depth_cap_bounds_the_walk() {
        // The nested match sits two edges away; a cap of one edge hides it.
        let mut client =
            client_with_session(session_with_edges(&[(USER, &[STAFF]), (STAFF, &[IT])]));
        assert!(!is_member(&mut client, USER, IT, 1).await.unwrap());

        let mut client =
            client_with_session(session_with_edges(&[(USER, &[STAFF]), (STAFF, &[IT])]));
        assert!(is_member(&mut client, USER, IT, 2).await.unwrap());
    }

    #[tokio::test]
    async fn unreadable_principal_is_not_a_member() {
        let mut session = MockLdapSession::new();
        session.expect_search().returning(|_, _, _, _| Ok(Vec::new()));
        let mut client = client_with_session(session);
        assert!(!is_member(&mut client, USER, STAFF, 25).await.unwrap());
    }
}
