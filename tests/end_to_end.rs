mod common;

use common::Cluster;
use peer_share::files::download::{DownloadRequest, Verification};
use peer_share::files::store::hash_file;
use peer_share::membership::types::Role;
use peer_share::peer::events::EventKind;
use peer_share::peer::types::QueryOutcome;
use std::time::Duration;

#[tokio::test]
async fn test_share_publish_query_download() {
    let mut cluster = Cluster::new(2).await;
    let (a, b) = (cluster.node(0).clone(), cluster.node(1).clone());

    // A is alone: discovery times out and it elects itself.
    cluster.network.take_down(b.advertised_addr());
    a.discover();
    cluster.pump();
    cluster.run_for(Duration::from_secs(9));
    assert_eq!(a.role(), Role::Leader);

    // B joins and finds A.
    cluster.network.bring_up(b.advertised_addr());
    b.discover();
    cluster.pump();
    assert_eq!(b.role(), Role::Follower);
    assert_eq!(b.leader_id().as_ref(), Some(a.id()));

    // A shares x.txt, which republishes to its own catalog.
    let outside = tempfile::tempdir().unwrap();
    let source = outside.path().join("x.txt");
    std::fs::write(&source, b"seventeen bytes!!").unwrap();
    assert_eq!(a.share(&source).await.unwrap(), "x.txt");

    // B asks the leader for the catalog.
    assert_eq!(b.query().unwrap(), QueryOutcome::Requested);
    cluster.pump();
    let catalog = b.catalog_view();
    let hosts = &catalog["x.txt"];
    assert_eq!(hosts.len(), 1);
    assert_eq!(hosts[0].peer_id, *a.id());
    assert_eq!(hosts[0].port, a.tcp_port());
    assert_eq!(hosts[0].size, 17);

    // B downloads straight from A.
    let report = b.download(DownloadRequest::from_catalog("x.txt")).await.unwrap();
    assert_eq!(report.bytes, 17);
    assert_eq!(report.verification, Verification::Verified);
    assert_eq!(std::fs::read(&report.path).unwrap(), b"seventeen bytes!!");
    assert_eq!(
        hash_file(&report.path).await.unwrap(),
        hash_file(&source).await.unwrap()
    );
    assert!(
        b.events_since(0)
            .iter()
            .any(|event| matches!(event.kind, EventKind::DownloadCompleted { bytes: 17, .. }))
    );
}

#[tokio::test]
async fn test_large_download_is_byte_identical() {
    let mut cluster = Cluster::new(2).await;
    cluster.bootstrap();
    let (follower, leader) = (cluster.node(0).clone(), cluster.node(1).clone());
    let content: Vec<u8> = (0..100_000u32).map(|i| (i.wrapping_mul(31) % 256) as u8).collect();
    std::fs::write(cluster.shared_dir(1).join("blob.bin"), &content).unwrap();
    leader.publish().await.unwrap();

    follower.query().unwrap();
    cluster.pump();
    let save_dir = tempfile::tempdir().unwrap();
    let request = DownloadRequest {
        save_dir: Some(save_dir.path().to_path_buf()),
        ..DownloadRequest::from_catalog("blob.bin")
    };
    let report = follower.download(request).await.unwrap();

    assert_eq!(report.bytes, 100_000);
    assert_eq!(report.verification, Verification::Verified);
    assert_eq!(std::fs::read(save_dir.path().join("blob.bin")).unwrap(), content);
}

#[tokio::test]
async fn test_hash_mismatch_keeps_file_and_warns() {
    let mut cluster = Cluster::new(2).await;
    cluster.bootstrap();
    let (follower, leader) = (cluster.node(0).clone(), cluster.node(1).clone());
    std::fs::write(cluster.shared_dir(1).join("doc.txt"), b"original").unwrap();

    let request = DownloadRequest {
        expected_hash: Some("00".repeat(32)),
        ..DownloadRequest::direct("doc.txt", "127.0.0.1", leader.tcp_port())
    };
    let report = follower.download(request).await.unwrap();

    assert!(matches!(report.verification, Verification::Mismatch { .. }));
    assert_eq!(std::fs::read(&report.path).unwrap(), b"original");
    assert!(
        follower
            .events_since(0)
            .iter()
            .any(|event| matches!(event.kind, EventKind::IntegrityWarning { .. }))
    );
}
