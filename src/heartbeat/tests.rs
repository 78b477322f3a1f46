#[cfg(test)]
mod tests {
    use crate::catalog::service::Catalog;
    use crate::catalog::types::FileSet;
    use crate::heartbeat::detector::{LeaderWatch, sweep_dead_peers};
    use crate::membership::directory::PeerDirectory;
    use crate::membership::types::PeerId;
    use std::net::SocketAddr;
    use std::time::{Duration, Instant};

    // ============================================================
    // LEADER WATCH TESTS
    // ============================================================

    #[test]
    fn test_fresh_watch_is_not_expired() {
        let watch = LeaderWatch::default();
        assert!(!watch.is_expired(Instant::now(), Duration::from_secs(10)));
        assert!(watch.age(Instant::now()).is_none());
    }

    #[test]
    fn test_watch_expires_after_timeout() {
        let mut watch = LeaderWatch::default();
        let t0 = Instant::now();
        watch.reset(t0);

        assert!(!watch.is_expired(t0 + Duration::from_secs(10), Duration::from_secs(10)));
        assert!(watch.is_expired(t0 + Duration::from_millis(10_001), Duration::from_secs(10)));
    }

    #[test]
    fn test_observe_ignores_older_stamp() {
        let mut watch = LeaderWatch::default();
        let t0 = Instant::now();
        watch.observe(t0 + Duration::from_secs(4));
        watch.observe(t0);

        assert_eq!(watch.last_heartbeat(), Some(t0 + Duration::from_secs(4)));
    }

    // ============================================================
    // SWEEP TESTS
    // ============================================================

    #[test]
    fn test_sweep_evicts_silent_peer_and_purges_catalog() {
        let directory = PeerDirectory::new();
        let catalog = Catalog::new();
        let me = PeerId::from("leader");
        let silent = PeerId::from("silent");
        let alive = PeerId::from("alive");
        let t0 = Instant::now();
        let addr: SocketAddr = "127.0.0.1:4000".parse().unwrap();

        directory.touch(&silent, addr, t0);
        directory.touch(&alive, addr, t0 + Duration::from_secs(14));
        catalog.publish(&silent, "127.0.0.1", 1, FileSet::Names(vec!["s.txt".into(), "both.txt".into()]));
        catalog.publish(&alive, "127.0.0.1", 2, FileSet::Names(vec!["both.txt".into()]));

        let report = sweep_dead_peers(&directory, &catalog, t0 + Duration::from_secs(16), Duration::from_secs(15), &me);

        assert_eq!(report.evicted.len(), 1);
        assert_eq!(report.evicted[0].0.peer_id, silent);
        assert_eq!(report.evicted[0].1, 2);
        assert!(catalog.lookup("s.txt").is_none());
        assert_eq!(catalog.lookup("both.txt").unwrap().len(), 1);
        assert!(directory.get(&alive).is_some());
    }

    #[test]
    fn test_sweep_with_everyone_alive_is_empty() {
        let directory = PeerDirectory::new();
        let catalog = Catalog::new();
        let t0 = Instant::now();
        directory.touch(&PeerId::from("a"), "127.0.0.1:1".parse().unwrap(), t0);

        let report = sweep_dead_peers(&directory, &catalog, t0 + Duration::from_secs(5), Duration::from_secs(15), &PeerId::from("me"));
        assert!(report.is_empty());
    }
}
