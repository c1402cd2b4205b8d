//! Readers never observe a half-applied registry reload

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crate::common::{logging, test_data};
use dart_financials::models::CompanyRecord;
use dart_financials::CompanyRegistry;

const BATCH_SIZE: usize = 50;

fn batch(prefix: &str) -> Vec<CompanyRecord> {
    (0..BATCH_SIZE)
        .map(|i| {
            test_data::company(
                &format!("{}{:06}", &prefix[..2].to_uppercase(), i),
                &format!("{} Co {:02}", prefix, i),
                "",
                None,
            )
        })
        .collect()
}

#[test]
fn test_concurrent_reads_see_whole_snapshots() {
    logging::init_test_logging();
    logging::log_test_step("Alternating reloads under concurrent searches");

    let registry = CompanyRegistry::with_records(batch("Old")).unwrap();
    let done = AtomicBool::new(false);

    thread::scope(|scope| {
        let writer_registry = registry.clone();
        let done = &done;
        scope.spawn(move || {
            for round in 0..200 {
                let prefix = if round % 2 == 0 { "New" } else { "Old" };
                writer_registry.replace_all(batch(prefix)).unwrap();
            }
            done.store(true, Ordering::SeqCst);
        });

        for _ in 0..4 {
            let reader_registry = registry.clone();
            scope.spawn(move || {
                let mut reads = 0;
                while !done.load(Ordering::SeqCst) || reads < 10 {
                    let results = reader_registry.search("co", BATCH_SIZE * 2).unwrap();
                    assert_eq!(results.len(), BATCH_SIZE);

                    let old = results.iter().filter(|c| c.corp_name.starts_with("Old")).count();
                    assert!(old == 0 || old == BATCH_SIZE, "mixed snapshot: {} old of {}", old, results.len());

                    let stats = reader_registry.stats().unwrap();
                    assert_eq!(stats.total_companies, BATCH_SIZE);
                    reads += 1;
                }
            });
        }
    });

    // 200 rounds end on an "Old" batch
    let final_names = registry.search("co", 1).unwrap();
    assert!(final_names[0].corp_name.starts_with("Old"));
}

#[test]
fn test_failed_reload_leaves_readers_on_previous_snapshot() {
    let registry = CompanyRegistry::with_records(batch("Old")).unwrap();

    let mut invalid = batch("New");
    invalid.push(invalid[0].clone());
    assert!(registry.replace_all(invalid).is_err());

    let results = registry.search("co", BATCH_SIZE * 2).unwrap();
    assert_eq!(results.len(), BATCH_SIZE);
    assert!(results.iter().all(|c| c.corp_name.starts_with("Old")));
}
