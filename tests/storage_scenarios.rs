//! End-to-end scenarios over the public `Table` API, one per named scenario
//! in the row store's concurrency and lifecycle contract.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use rowstore::value::TypeCode;
use rowstore::{ColumnSpec, RowStoreError, Table, TableConfig, Value};

fn config(page_size: usize, max_pages: usize, initial_pages: usize) -> TableConfig {
    TableConfig { page_size, max_pages, initial_pages }
}

fn person_table() -> Table {
    Table::new(
        "Person",
        vec![
            ColumnSpec::new("id", TypeCode::Long).id(),
            ColumnSpec::new("name", TypeCode::String),
            ColumnSpec::new("age", TypeCode::Int),
        ],
        config(32, 4, 1),
    )
}

#[test]
fn s1_insert_scan_lookup() {
    let t = person_table();
    t.insert(&[Value::Long(1), Value::String("Alice".into()), Value::Int(100)]).unwrap();
    let ref_bob = t.insert(&[Value::Long(2), Value::String("Bob".into()), Value::Int(101)]).unwrap();
    t.insert(&[Value::Long(3), Value::String("Charlie".into()), Value::Int(102)]).unwrap();

    assert_eq!(t.scan_equals(1, &Value::String("Bob".into())), vec![1]);
    assert_eq!(t.lookup_by_id(&Value::Long(2)), Some(ref_bob));
    assert_eq!(t.column_count(), 3);
}

#[test]
fn s2_tombstone_hides_row() {
    let t = person_table();
    let ref_alice = t.insert(&[Value::Long(1), Value::String("Alice".into()), Value::Int(100)]).unwrap();
    t.insert(&[Value::Long(2), Value::String("Bob".into()), Value::Int(101)]).unwrap();
    t.insert(&[Value::Long(3), Value::String("Charlie".into()), Value::Int(102)]).unwrap();

    assert!(t.tombstone(ref_alice));

    assert_eq!(t.scan_equals(0, &Value::Long(1)), Vec::<u32>::new());
    assert_eq!(t.scan_all().len(), 2);
    assert_eq!(t.lookup_by_id(&Value::Long(1)), None);
    assert_eq!(t.row_count(), 2);
    assert_eq!(t.allocated_count(), 3);
}

#[test]
fn s3_reuse_with_generation() {
    let t = person_table();
    let ref_alice = t.insert(&[Value::Long(1), Value::String("Alice".into()), Value::Int(100)]).unwrap();
    t.insert(&[Value::Long(2), Value::String("Bob".into()), Value::Int(101)]).unwrap();
    t.insert(&[Value::Long(3), Value::String("Charlie".into()), Value::Int(102)]).unwrap();
    assert!(t.tombstone(ref_alice));

    let ref_dave = t.insert(&[Value::Long(4), Value::String("Dave".into()), Value::Int(200)]).unwrap();

    assert!(!t.is_live(ref_alice));
    assert_eq!(t.lookup_by_id(&Value::Long(4)), Some(ref_dave));
    let row = rowstore::reference::row_index(ref_dave);
    assert_eq!(t.read(1, row), Value::String("Dave".into()));
}

#[test]
fn s4_between_inclusivity() {
    let t = Table::new(
        "Ages",
        vec![ColumnSpec::new("id", TypeCode::Long).id(), ColumnSpec::new("age", TypeCode::Int)],
        config(32, 4, 1),
    );
    t.insert(&[Value::Long(1), Value::Int(100)]).unwrap();
    t.insert(&[Value::Long(2), Value::Int(200)]).unwrap();
    t.insert(&[Value::Long(3), Value::Int(300)]).unwrap();

    assert_eq!(t.scan_between(1, &Value::Int(150), &Value::Int(250)), vec![1]);
    assert_eq!(t.scan_between(1, &Value::Int(100), &Value::Int(300)), vec![0, 1, 2]);
    assert_eq!(t.scan_between(1, &Value::Int(300), &Value::Int(100)), Vec::<u32>::new());
}

#[test]
fn s5_concurrent_writer_reader_snapshot_never_observes_torn_pair() {
    const MAX_ITERATIONS: i32 = 2_000;
    let t = Arc::new(Table::new(
        "Snapshot",
        vec![ColumnSpec::new("id", TypeCode::Long).id(), ColumnSpec::new("name", TypeCode::String), ColumnSpec::new("value", TypeCode::Int)],
        config(32, 1, 1),
    ));
    let writer_id = 7i64;
    let r = t.insert(&[Value::Long(writer_id), Value::String("w7-i0".into()), Value::Int(1000 * writer_id as i32)]).unwrap();

    let done = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let writer = {
        let t = t.clone();
        let done = done.clone();
        thread::spawn(move || {
            for i in 1..MAX_ITERATIONS {
                let existing = t.lookup_by_id(&Value::Long(writer_id)).expect("writer's own row always live");
                assert!(t.tombstone(existing));
                let name = format!("w{writer_id}-i{i}");
                let value = 1000 * writer_id as i32 + i;
                t.insert(&[Value::Long(writer_id), Value::String(name), Value::Int(value)]).unwrap();
            }
            done.store(true, Ordering::Release);
        })
    };

    let mut torn = 0u32;
    while !done.load(Ordering::Acquire) {
        if let Some(row) = t.read_row_consistent(r).or_else(|| t.lookup_by_id(&Value::Long(writer_id)).and_then(|r| t.read_row_consistent(r))) {
            if let (Value::String(name), Value::Int(value)) = (&row[1], &row[2]) {
                if let Some((t_parsed, i_parsed)) = parse_name(name) {
                    let expected_base = 1000 * t_parsed;
                    if *value < expected_base || *value >= expected_base + MAX_ITERATIONS {
                        torn += 1;
                    }
                    let _ = i_parsed;
                }
            }
        }
    }
    writer.join().unwrap();
    assert_eq!(torn, 0);
}

fn parse_name(name: &str) -> Option<(i32, i32)> {
    let rest = name.strip_prefix('w')?;
    let (t, i) = rest.split_once("-i")?;
    Some((t.parse().ok()?, i.parse().ok()?))
}

#[test]
fn s6_concurrent_independent_inserts() {
    const THREADS: i64 = 8;
    const PER_THREAD: i64 = 50;
    let t = Arc::new(Table::new(
        "Bulk",
        vec![ColumnSpec::new("id", TypeCode::Long).id(), ColumnSpec::new("value", TypeCode::Int)],
        config(64, 16, 1),
    ));
    let inserted = Arc::new(AtomicU64::new(0));
    let mut handles = Vec::new();
    for thread_id in 0..THREADS {
        let t = t.clone();
        let inserted = inserted.clone();
        handles.push(thread::spawn(move || {
            let base = thread_id * PER_THREAD;
            for i in 0..PER_THREAD {
                let id = base + i;
                t.insert(&[Value::Long(id), Value::Int(id as i32)]).unwrap();
                inserted.fetch_add(1, Ordering::AcqRel);
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(t.row_count(), (THREADS * PER_THREAD) as u64);
    for thread_id in 0..THREADS {
        for i in 0..PER_THREAD {
            let id = thread_id * PER_THREAD + i;
            let r = t.lookup_by_id(&Value::Long(id)).unwrap_or_else(|| panic!("id {id} not findable"));
            assert!(t.is_live(r));
        }
    }
}

#[test]
fn duplicate_id_is_rejected_without_side_effects() {
    let t = person_table();
    t.insert(&[Value::Long(1), Value::String("Alice".into()), Value::Int(100)]).unwrap();
    let before = t.allocated_count();
    let err = t.insert(&[Value::Long(1), Value::String("Alice2".into()), Value::Int(1)]).unwrap_err();
    assert_eq!(err, RowStoreError::DuplicateId);
    assert_eq!(t.allocated_count(), before);
    assert_eq!(t.row_count(), 1);
}
