//! Integration tests for mirrored writes, verified reads and audits.

use proptest::prelude::*;
use replifile_core::{
    audit, compare, AuditOutcome, Comparator, CoreError, EofState, ErrorFlags, Member, MirrorOp,
    OpenFlags, Query, ReplicaSet, REPLICA_CAPACITY,
};
use replifile_testkit::prelude::*;
use std::io::SeekFrom;

#[test]
fn every_replica_matches_primary_for_all_counts() {
    let payload: Vec<u8> = (0..10_000u32).map(|i| (i * 31 % 251) as u8).collect();

    for count in 0..=REPLICA_CAPACITY {
        let mut fixture = TestReplicaSet::with_replicas(count);
        fixture.write(&payload).unwrap();
        fixture.commit().unwrap();

        for replica in &fixture.replicas {
            assert_eq!(compare(replica, &fixture.primary).unwrap(), 0, "count {count}");
        }
    }
}

#[test]
fn read_back_returns_written_bytes() {
    let mut fixture = scenarios::written(3, b"the quick brown fox");

    let mut buf = vec![0u8; 19];
    fixture.read(&mut buf).unwrap();
    assert_eq!(buf, b"the quick brown fox");
    assert!(fixture.good());
    assert_eq!(fixture.eof(), EofState::AtEnd);
}

#[test]
fn corruption_fails_read_but_returns_primary_bytes() {
    let mut fixture = scenarios::written(4, b"0123456789");
    corrupt_byte(&fixture.replicas[2], 5);

    let mut buf = [0u8; 10];
    let error = fixture.read(&mut buf).unwrap_err();
    assert!(error.is_divergence());
    assert_eq!(&buf, b"0123456789");

    let flags = fixture.error_flags();
    assert!(flags.contains(ErrorFlags::CORRUPT));
    assert_eq!(fixture.member_flags(Member::Replica(2)), Some(ErrorFlags::CORRUPT));

    // Only the offline audit says which replica drifted.
    let entries = audit(
        &Comparator::default(),
        &fixture.primary,
        fixture.replicas.as_slice(),
    );
    let drifted: Vec<usize> = entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| !entry.is_identical())
        .map(|(i, _)| i)
        .collect();
    assert_eq!(drifted, vec![2]);
    assert!(matches!(
        entries[2].outcome,
        AuditOutcome::Diverged { differing: 1 }
    ));
}

#[test]
fn one_disagreeing_replica_makes_length_inconsistent() {
    let mut fixture = scenarios::written(5, b"abcdef");
    assert_eq!(fixture.length().unwrap(), 6);

    append_bytes(&fixture.replicas[4], b"g");
    match fixture.length() {
        Err(CoreError::Inconsistent {
            query,
            observations,
        }) => {
            assert_eq!(query, Query::Length);
            let agreeing = observations.iter().filter(|o| o.value == Some(6)).count();
            assert_eq!(agreeing, 5);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn one_disagreeing_replica_makes_tell_inconsistent() {
    let mut fixture = scenarios::written(3, b"abcdef");
    truncate_file(&fixture.replicas[0], 2);

    assert!(fixture.seek(SeekFrom::End(0)).is_err());
    assert!(matches!(
        fixture.tell(),
        Err(CoreError::Inconsistent {
            query: Query::Position,
            ..
        })
    ));
}

#[test]
fn zero_replicas_always_report_primary() {
    let mut fixture = scenarios::written(0, b"alone");
    assert_eq!(fixture.length().unwrap(), 5);
    assert_eq!(fixture.tell().unwrap(), 0);
    assert_eq!(fixture.seek(SeekFrom::End(-1)).unwrap(), 4);
    assert_eq!(fixture.eof(), EofState::NotAtEnd);
}

#[test]
fn sixth_add_fails_and_keeps_count() {
    let mut fixture = TestReplicaSet::with_replicas(REPLICA_CAPACITY);
    assert_eq!(fixture.replica_count(), 5);

    let sixth = fixture.path("replica5.bin");
    assert!(matches!(
        fixture.add(&sixth),
        Err(CoreError::CapacityExceeded { capacity: 5 })
    ));
    assert_eq!(fixture.replica_count(), 5);
    assert!(fixture.good());
}

#[test]
fn close_leaves_nothing_open() {
    for count in [0, 1, 5] {
        let mut fixture = TestReplicaSet::with_replicas(count);
        fixture.close();
        assert!(!fixture.is_open());
        assert!(fixture.is_closed());
    }
}

#[test]
fn comparator_counts_exact_positions() {
    let fixture = TestReplicaSet::with_replicas(0);
    let a = fixture.path("a.bin");
    let b = fixture.path("b.bin");
    let c = fixture.path("c.bin");
    std::fs::write(&a, b"0123456789").unwrap();
    std::fs::write(&b, b"01#34567#9").unwrap();
    std::fs::write(&c, b"012345678").unwrap();

    assert_eq!(compare(&a, &a).unwrap(), 0);
    assert_eq!(compare(&a, &b).unwrap(), 2);
    assert!(compare(&a, &c).is_err());
    assert!(compare(&a, fixture.path("missing.bin")).is_err());
}

#[test]
fn reopened_set_verifies_existing_contents() {
    let mut fixture = scenarios::written(2, b"durable");
    fixture.reopen();

    let mut buf = [0u8; 7];
    fixture.read(&mut buf).unwrap();
    assert_eq!(&buf, b"durable");
}

#[test]
fn open_without_create_fails_on_missing_primary() {
    let fixture = TestReplicaSet::with_replicas(0);
    let mut set = ReplicaSet::new();
    let result = set.open(fixture.path("absent.bin"), OpenFlags::empty());
    match result {
        Err(CoreError::Storage(replifile_core::StorageError::Open { flags, .. })) => {
            assert!(flags.contains(ErrorFlags::NOT_FOUND));
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(set.bad());
    assert!(!set.is_open());
}

#[cfg(target_os = "linux")]
#[test]
fn write_failing_on_one_of_three_replicas() {
    let full = std::path::Path::new("/dev/full");
    assert!(full.exists(), "/dev/full is required on linux");
    let fixture = TestReplicaSet::with_replicas(0);
    let primary = fixture.path("p.bin");
    let good = [fixture.path("r0.bin"), fixture.path("r2.bin")];

    let mut set = ReplicaSet::new();
    set.create(&primary, OpenFlags::empty()).unwrap();
    set.add(&good[0]).unwrap();
    set.add(full).expect("/dev/full must open read/write");
    set.add(&good[1]).unwrap();

    match set.write(b"mirrored bytes") {
        Err(CoreError::Mirror { op, failures }) => {
            assert_eq!(op, MirrorOp::Write);
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].member, Member::Replica(1));
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(set.fail());
    assert!(set.error_flags().contains(ErrorFlags::WRITE));
    set.close();

    assert_eq!(compare(&good[0], &primary).unwrap(), 0);
    assert_eq!(compare(&good[1], &primary).unwrap(), 0);
}

#[test]
fn commit_fails_only_on_corrupted_replica() {
    let mut fixture = scenarios::written(3, b"0123456789");
    corrupt_byte(&fixture.replicas[1], 0);

    let mut buf = [0u8; 10];
    assert!(fixture.read(&mut buf).is_err());

    match fixture.commit() {
        Err(CoreError::Mirror { op, failures }) => {
            assert_eq!(op, MirrorOp::Commit);
            let members: Vec<Member> = failures.iter().map(|f| f.member).collect();
            assert_eq!(members, vec![Member::Replica(1)]);
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(fixture.member_flags(Member::Primary), Some(ErrorFlags::empty()));
    assert_eq!(fixture.member_flags(Member::Replica(0)), Some(ErrorFlags::empty()));
    assert_eq!(fixture.member_flags(Member::Replica(2)), Some(ErrorFlags::empty()));
}

#[test]
fn resize_reaches_every_member() {
    let mut fixture = scenarios::written(2, b"0123456789");
    fixture.set_len(4).unwrap();
    fixture.commit().unwrap();

    assert_eq!(fixture.length().unwrap(), 4);
    for replica in &fixture.replicas {
        assert_eq!(std::fs::read(replica).unwrap(), b"0123");
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn mirrored_payload_reads_back(payload in payload_strategy(), count in replica_count_strategy()) {
        let mut fixture = scenarios::written(count, &payload);

        let mut buf = vec![0u8; payload.len()];
        prop_assert!(fixture.read(&mut buf).is_ok());
        prop_assert_eq!(&buf, &payload);
        for replica in &fixture.replicas {
            prop_assert_eq!(compare(replica, &fixture.primary).unwrap(), 0);
        }
    }

    #[test]
    fn any_single_corruption_is_detected((payload, offset) in payload_with_offset_strategy()) {
        let mut fixture = scenarios::written(2, &payload);
        corrupt_byte(&fixture.replicas[1], offset);

        let mut buf = vec![0u8; payload.len()];
        let result = fixture.read(&mut buf);
        let is_mismatch = matches!(
            &result,
            Err(CoreError::ReadVerification { mismatched, .. }) if mismatched == &vec![1]
        );
        prop_assert!(is_mismatch);
        prop_assert_eq!(&buf, &payload);
    }

    #[test]
    fn batched_writes_keep_members_identical(batch in write_batch_strategy()) {
        let mut fixture = TestReplicaSet::with_replicas(3);
        let mut expected = Vec::new();
        for chunk in &batch {
            fixture.write(chunk).unwrap();
            expected.extend_from_slice(chunk);
        }
        prop_assert_eq!(fixture.length().unwrap(), expected.len() as u64);
        prop_assert_eq!(fixture.tell().unwrap(), expected.len() as u64);
        fixture.commit().unwrap();

        prop_assert_eq!(std::fs::read(&fixture.primary).unwrap(), expected);
        for replica in &fixture.replicas {
            prop_assert_eq!(compare(replica, &fixture.primary).unwrap(), 0);
        }
    }
}
