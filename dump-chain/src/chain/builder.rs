//! Chain construction from a flat set of manifests.
//!
//! Manifests are grouped by namespace/database. Each group is anchored on one
//! full dump, and incrementals are linked in start-versionstamp order while
//! each one begins exactly where the previous link ended. The first gap
//! closes the chain: nothing after it is linked, even if it would fit.

use super::Chain;
use crate::config::AnchorPolicy;
use crate::manifest::{can_apply_incremental, Manifest};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Build one chain per namespace/database pair that has a full dump.
///
/// Chains come back sorted by namespace, then database. Groups without a
/// full dump produce no chain.
pub fn build_chains(manifests: Vec<Manifest>, policy: AnchorPolicy) -> Vec<Chain> {
    let mut groups: BTreeMap<(String, String), Vec<Manifest>> = BTreeMap::new();
    for manifest in manifests {
        let key = (manifest.namespace.clone(), manifest.database.clone());
        groups.entry(key).or_default().push(manifest);
    }

    groups
        .into_iter()
        .filter_map(|((namespace, database), group)| {
            build_group_chain(&namespace, &database, group, policy)
        })
        .collect()
}

fn build_group_chain(
    namespace: &str,
    database: &str,
    group: Vec<Manifest>,
    policy: AnchorPolicy,
) -> Option<Chain> {
    let (fulls, mut incrementals): (Vec<Manifest>, Vec<Manifest>) =
        group.into_iter().partition(Manifest::is_full);

    let full_count = fulls.len();
    let Some(anchor) = select_anchor(fulls, policy) else {
        debug!(
            namespace,
            database,
            incrementals = incrementals.len(),
            "[CHAIN] No full dump, group dropped"
        );
        return None;
    };

    if full_count > 1 {
        warn!(
            namespace,
            database,
            full_dumps = full_count,
            anchor = %anchor.filename,
            policy = ?policy,
            "[CHAIN] Multiple full dumps, selected anchor by policy"
        );
    }

    incrementals.sort_by(|a, b| {
        a.start_versionstamp
            .cmp(&b.start_versionstamp)
            .then_with(|| a.end_versionstamp.cmp(&b.end_versionstamp))
            .then_with(|| a.filename.cmp(&b.filename))
    });

    let mut cursor = anchor.end_versionstamp;
    let mut linked = Vec::with_capacity(incrementals.len());
    let total = incrementals.len();

    for inc in incrementals {
        if let Err(e) = can_apply_incremental(cursor, &inc) {
            debug!(
                namespace,
                database,
                error = %e,
                excluded = total - linked.len(),
                "[CHAIN] Continuity gap, chain closed"
            );
            break;
        }
        cursor = inc.end_versionstamp;
        linked.push(inc);
    }

    Some(Chain {
        full_dump: anchor,
        incremental_dumps: linked,
        latest_versionstamp: cursor,
    })
}

fn select_anchor(fulls: Vec<Manifest>, policy: AnchorPolicy) -> Option<Manifest> {
    fulls.into_iter().max_by(|a, b| compare_anchors(a, b, policy))
}

fn compare_anchors(a: &Manifest, b: &Manifest, policy: AnchorPolicy) -> Ordering {
    let primary = match policy {
        AnchorPolicy::LatestCreated => a
            .created_at
            .cmp(&b.created_at)
            .then_with(|| a.end_versionstamp.cmp(&b.end_versionstamp)),
        AnchorPolicy::HighestVersionstamp => a
            .end_versionstamp
            .cmp(&b.end_versionstamp)
            .then_with(|| a.created_at.cmp(&b.created_at)),
    };
    primary.then_with(|| a.filename.cmp(&b.filename))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn full(name: &str, db: &str, end: u64) -> Manifest {
        Manifest::full(name, "app", db, end, 100)
    }

    fn inc(name: &str, db: &str, start: u64, end: u64) -> Manifest {
        Manifest::incremental(name, "app", db, start, end, 10)
    }

    fn names(chain: &Chain) -> Vec<&str> {
        chain.incremental_dumps().iter().map(|m| m.filename.as_str()).collect()
    }

    #[test]
    fn test_links_contiguous_incrementals() {
        let chains = build_chains(
            vec![
                inc("inc2.cbor", "prod", 200, 300),
                full("full.cbor", "prod", 100),
                inc("inc1.cbor", "prod", 100, 200),
            ],
            AnchorPolicy::default(),
        );

        assert_eq!(chains.len(), 1);
        assert_eq!(names(&chains[0]), vec!["inc1.cbor", "inc2.cbor"]);
        assert_eq!(chains[0].latest_versionstamp(), 300);
        assert!(chains[0].validate().is_ok());
    }

    #[test]
    fn test_order_ignores_creation_time() {
        let mut late = inc("a.cbor", "prod", 100, 200);
        late.created_at = Utc::now() + Duration::hours(1);
        let mut early = inc("b.cbor", "prod", 200, 300);
        early.created_at = Utc::now() - Duration::hours(1);

        let chains = build_chains(
            vec![early, late, full("full.cbor", "prod", 100)],
            AnchorPolicy::default(),
        );

        assert_eq!(names(&chains[0]), vec!["a.cbor", "b.cbor"]);
    }

    #[test]
    fn test_gap_truncates_everything_after_it() {
        // inc3 would fit after inc1, but inc2 breaks the walk first
        let chains = build_chains(
            vec![
                full("full.cbor", "prod", 100),
                inc("inc1.cbor", "prod", 100, 200),
                inc("inc2.cbor", "prod", 150, 250),
                inc("inc3.cbor", "prod", 200, 300),
            ],
            AnchorPolicy::default(),
        );

        assert_eq!(names(&chains[0]), vec!["inc1.cbor"]);
        assert_eq!(chains[0].latest_versionstamp(), 200);
    }

    #[test]
    fn test_gap_right_after_full_dump() {
        let chains = build_chains(
            vec![
                full("full.cbor", "prod", 200),
                inc("inc1.cbor", "prod", 300, 400),
                inc("inc2.cbor", "prod", 400, 500),
            ],
            AnchorPolicy::default(),
        );

        assert!(chains[0].incremental_dumps().is_empty());
        assert_eq!(chains[0].latest_versionstamp(), 200);
    }

    #[test]
    fn test_duplicate_start_links_only_one() {
        let chains = build_chains(
            vec![
                full("full.cbor", "prod", 100),
                inc("b.cbor", "prod", 100, 250),
                inc("a.cbor", "prod", 100, 200),
            ],
            AnchorPolicy::default(),
        );

        assert_eq!(names(&chains[0]), vec!["a.cbor"]);
        assert_eq!(chains[0].latest_versionstamp(), 200);
    }

    #[test]
    fn test_group_without_full_dump_is_dropped() {
        let chains = build_chains(
            vec![
                inc("inc1.cbor", "orphaned", 100, 200),
                full("full.cbor", "prod", 100),
            ],
            AnchorPolicy::default(),
        );

        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].database(), "prod");
    }

    #[test]
    fn test_groups_are_never_merged() {
        let mut other_ns = full("other.cbor", "prod", 100);
        other_ns.namespace = "billing".to_string();

        let chains = build_chains(
            vec![
                full("db2.cbor", "db2", 250),
                full("db1.cbor", "db1", 200),
                other_ns,
                // Continues db1's history but belongs to db2
                inc("inc.cbor", "db2", 200, 300),
            ],
            AnchorPolicy::default(),
        );

        let keys: Vec<_> = chains.iter().map(|c| (c.namespace(), c.database())).collect();
        assert_eq!(keys, vec![("app", "db1"), ("app", "db2"), ("billing", "prod")]);
        assert_eq!(chains[0].latest_versionstamp(), 200);
        assert_eq!(chains[1].latest_versionstamp(), 250);
        assert!(chains[1].incremental_dumps().is_empty());
    }

    #[test]
    fn test_anchor_policy_latest_created() {
        let mut older = full("older.cbor", "prod", 500);
        older.created_at = Utc::now() - Duration::days(1);
        let newer = full("newer.cbor", "prod", 300);

        let chains = build_chains(
            vec![older, newer, inc("inc.cbor", "prod", 300, 400)],
            AnchorPolicy::LatestCreated,
        );

        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].full_dump().filename, "newer.cbor");
        assert_eq!(chains[0].latest_versionstamp(), 400);
    }

    #[test]
    fn test_anchor_policy_highest_versionstamp() {
        let mut older = full("older.cbor", "prod", 500);
        older.created_at = Utc::now() - Duration::days(1);
        let newer = full("newer.cbor", "prod", 300);

        let chains = build_chains(
            vec![older, newer, inc("inc.cbor", "prod", 300, 400)],
            AnchorPolicy::HighestVersionstamp,
        );

        assert_eq!(chains[0].full_dump().filename, "older.cbor");
        // inc.cbor starts at 300, not at the anchor's 500
        assert!(chains[0].incremental_dumps().is_empty());
        assert_eq!(chains[0].latest_versionstamp(), 500);
    }

    #[test]
    fn test_older_incremental_truncates_chain() {
        // stale.cbor sorts first and does not start at the cursor, so the
        // walk stops there even though next.cbor would continue the anchor
        let chains = build_chains(
            vec![
                full("full.cbor", "prod", 200),
                inc("stale.cbor", "prod", 100, 200),
                inc("next.cbor", "prod", 200, 300),
            ],
            AnchorPolicy::default(),
        );

        assert_eq!(chains.len(), 1);
        assert!(chains[0].incremental_dumps().is_empty());
        assert_eq!(chains[0].latest_versionstamp(), 200);
    }

    #[test]
    fn test_history_before_newer_full_dump_truncates_chain() {
        let now = Utc::now();
        let mut first = full("full1.cbor", "prod", 100);
        first.created_at = now - Duration::hours(3);
        let mut old_inc = inc("inc1.cbor", "prod", 100, 200);
        old_inc.created_at = now - Duration::hours(2);
        let mut second = full("full2.cbor", "prod", 200);
        second.created_at = now - Duration::hours(1);
        let new_inc = inc("inc2.cbor", "prod", 200, 300);

        let chains = build_chains(
            vec![first, old_inc, second, new_inc],
            AnchorPolicy::LatestCreated,
        );

        assert_eq!(chains[0].full_dump().filename, "full2.cbor");
        assert!(chains[0].incremental_dumps().is_empty());
        assert_eq!(chains[0].latest_versionstamp(), 200);
    }

    #[test]
    fn test_every_chain_satisfies_continuity() {
        let chains = build_chains(
            vec![
                full("a.cbor", "one", 10),
                inc("a1.cbor", "one", 10, 20),
                inc("a2.cbor", "one", 20, 35),
                inc("a3.cbor", "one", 40, 50),
                full("b.cbor", "two", 0),
                inc("b1.cbor", "two", 0, 5),
            ],
            AnchorPolicy::default(),
        );

        for chain in &chains {
            assert!(chain.full_dump().start_versionstamp <= chain.full_dump().end_versionstamp);

            let mut expected = chain.full_dump().end_versionstamp;
            for link in chain.incremental_dumps() {
                assert_eq!(link.start_versionstamp, expected);
                expected = link.end_versionstamp;
            }
            assert_eq!(chain.latest_versionstamp(), expected);
            assert!(chain.validate().is_ok());
        }
    }

    #[test]
    fn test_no_manifests() {
        assert!(build_chains(Vec::new(), AnchorPolicy::default()).is_empty());
    }
}
