//! Catalog Module Tests
//!
//! ## Test Scopes
//! - **Publish semantics**: delete-then-insert per (filename, peer).
//! - **Legacy payloads**: bare name lists map to zero-size, null-hash entries.
//! - **Eviction**: purging a peer removes all of its entries.

#[cfg(test)]
mod tests {
    use crate::catalog::service::Catalog;
    use crate::catalog::types::{FileMeta, FileSet};
    use crate::membership::types::PeerId;
    use std::collections::BTreeMap;

    fn listing(files: &[(&str, u64, &str)]) -> FileSet {
        FileSet::Listing(
            files
                .iter()
                .map(|(name, size, hash)| {
                    (
                        name.to_string(),
                        FileMeta {
                            size: *size,
                            hash: Some(hash.to_string()),
                        },
                    )
                })
                .collect(),
        )
    }

    // ============================================================
    // PUBLISH TESTS
    // ============================================================

    #[test]
    fn test_publish_inserts_entry_per_file() {
        let catalog = Catalog::new();
        let peer = PeerId::from("a");

        let written = catalog.publish(&peer, "10.0.0.1", 9000, listing(&[("a.txt", 3, "h1"), ("b.txt", 4, "h2")]));

        assert_eq!(written, 2);
        assert_eq!(catalog.file_count(), 2);
        let hosts = catalog.lookup("a.txt").unwrap();
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].host, "10.0.0.1");
        assert_eq!(hosts[0].port, 9000);
        assert_eq!(hosts[0].size, 3);
    }

    #[test]
    fn test_republish_replaces_entry_with_latest_hash() {
        let catalog = Catalog::new();
        let peer = PeerId::from("a");

        catalog.publish(&peer, "10.0.0.1", 9000, listing(&[("a.txt", 3, "old")]));
        catalog.publish(&peer, "10.0.0.1", 9000, listing(&[("a.txt", 5, "new")]));

        let hosts = catalog.lookup("a.txt").unwrap();
        assert_eq!(hosts.len(), 1, "One entry per (filename, peer)");
        assert_eq!(hosts[0].hash.as_deref(), Some("new"));
        assert_eq!(hosts[0].size, 5);
    }

    #[test]
    fn test_publish_from_two_peers_keeps_both_in_order() {
        let catalog = Catalog::new();
        let a = PeerId::from("a");
        let b = PeerId::from("b");

        catalog.publish(&a, "10.0.0.1", 9000, listing(&[("shared.bin", 1, "h")]));
        catalog.publish(&b, "10.0.0.2", 9001, listing(&[("shared.bin", 1, "h")]));

        let hosts = catalog.lookup("shared.bin").unwrap();
        assert_eq!(hosts.len(), 2);
        assert_eq!(hosts[0].peer_id, a);
        assert_eq!(hosts[1].peer_id, b);
    }

    #[test]
    fn test_republish_moves_peer_to_most_recent_position() {
        let catalog = Catalog::new();
        let a = PeerId::from("a");
        let b = PeerId::from("b");

        catalog.publish(&a, "10.0.0.1", 9000, listing(&[("f", 1, "h")]));
        catalog.publish(&b, "10.0.0.2", 9001, listing(&[("f", 1, "h")]));
        catalog.publish(&a, "10.0.0.1", 9000, listing(&[("f", 1, "h")]));

        let hosts = catalog.lookup("f").unwrap();
        assert_eq!(hosts.last().unwrap().peer_id, a);
    }

    #[test]
    fn test_publish_leaves_unmentioned_files_alone() {
        let catalog = Catalog::new();
        let peer = PeerId::from("a");

        catalog.publish(&peer, "h", 1, listing(&[("one", 1, "h1")]));
        catalog.publish(&peer, "h", 1, listing(&[("two", 1, "h2")]));

        assert!(catalog.lookup("one").is_some());
        assert!(catalog.lookup("two").is_some());
    }

    // ============================================================
    // LEGACY PAYLOAD TESTS
    // ============================================================

    #[test]
    fn test_name_list_publish_synthesizes_empty_metadata() {
        let catalog = Catalog::new();
        let peer = PeerId::from("old");

        catalog.publish(
            &peer,
            "10.0.0.9",
            7000,
            FileSet::Names(vec!["legacy.txt".to_string()]),
        );

        let hosts = catalog.lookup("legacy.txt").unwrap();
        assert_eq!(hosts[0].size, 0);
        assert!(hosts[0].hash.is_none());
    }

    #[test]
    fn test_file_set_decodes_both_shapes() {
        let map: FileSet = serde_json::from_str(r#"{"a.txt":{"size":3,"hash":"abc"}}"#).unwrap();
        let list: FileSet = serde_json::from_str(r#"["a.txt","b.txt"]"#).unwrap();

        assert!(matches!(map, FileSet::Listing(_)));
        assert_eq!(list, FileSet::Names(vec!["a.txt".into(), "b.txt".into()]));
        assert_eq!(list.into_listing().len(), 2);
    }

    #[test]
    fn test_file_meta_tolerates_missing_fields() {
        let set: FileSet = serde_json::from_str(r#"{"a.txt":{}}"#).unwrap();
        let listing = set.into_listing();
        assert_eq!(listing["a.txt"], FileMeta::default());
    }

    // ============================================================
    // PURGE / SNAPSHOT TESTS
    // ============================================================

    #[test]
    fn test_purge_peer_removes_all_its_entries() {
        let catalog = Catalog::new();
        let dead = PeerId::from("dead");
        let alive = PeerId::from("alive");

        catalog.publish(&dead, "h", 1, listing(&[("only-dead", 1, "x"), ("both", 1, "y")]));
        catalog.publish(&alive, "h", 2, listing(&[("both", 1, "y")]));

        let removed = catalog.purge_peer(&dead);

        assert_eq!(removed, 2);
        assert!(catalog.lookup("only-dead").is_none());
        let both = catalog.lookup("both").unwrap();
        assert_eq!(both.len(), 1);
        assert_eq!(both[0].peer_id, alive);
        assert!(!catalog.snapshot().contains_key("only-dead"));
    }

    #[test]
    fn test_replace_and_clear() {
        let catalog = Catalog::new();
        let peer = PeerId::from("a");
        catalog.publish(&peer, "h", 1, listing(&[("stale", 1, "x")]));

        let other = Catalog::new();
        other.publish(&peer, "h", 1, listing(&[("fresh", 1, "y")]));
        let mut snapshot = other.snapshot();
        snapshot.insert("empty".to_string(), Vec::new());

        catalog.replace(snapshot);
        assert!(catalog.lookup("stale").is_none());
        assert!(catalog.lookup("fresh").is_some());
        assert_eq!(catalog.file_count(), 1, "Empty host lists are not kept");

        catalog.clear();
        assert!(catalog.is_empty());
        assert_eq!(catalog.snapshot(), BTreeMap::new());
    }
}
