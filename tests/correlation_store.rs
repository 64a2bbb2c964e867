use oastscan::correlation::CorrelationStore;
use oastscan::models::ProbeId;
use std::collections::HashSet;
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_registers_all_land_in_one_drain() {
    let store: Arc<CorrelationStore<usize>> = Arc::new(CorrelationStore::new());

    let mut tasks = Vec::new();
    for n in 0..1000usize {
        let store = store.clone();
        tasks.push(tokio::spawn(async move {
            store.register(ProbeId::from(format!("id{:02}", n % 50)), n);
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let batch = store.drain_all();
    assert_eq!(batch.len(), 50);
    assert_eq!(batch.values().map(Vec::len).sum::<usize>(), 1000);
    for (id, handles) in &batch {
        assert_eq!(handles.len(), 20);
        for handle in handles {
            assert_eq!(format!("id{:02}", handle % 50), id.as_str());
        }
    }
    assert!(store.is_empty());
}

#[test]
fn register_after_drain_only_seen_by_next_drain() {
    let store: CorrelationStore<&str> = CorrelationStore::new();
    store.register(ProbeId::from("first"), "a");

    let first = store.drain_all();
    store.register(ProbeId::from("second"), "b");

    assert_eq!(first.len(), 1);
    assert!(first.contains_key(&ProbeId::from("first")));
    assert!(!first.contains_key(&ProbeId::from("second")));

    let next = store.drain_all();
    assert_eq!(next.len(), 1);
    assert_eq!(next[&ProbeId::from("second")], vec!["b"]);
    assert!(store.drain_all().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn registrations_racing_drains_are_never_lost_or_doubled() {
    let store: Arc<CorrelationStore<usize>> = Arc::new(CorrelationStore::new());
    const TOTAL: usize = 4000;

    let producers: Vec<_> = (0..4)
        .map(|p| {
            let store = store.clone();
            tokio::spawn(async move {
                for n in (p..TOTAL).step_by(4) {
                    store.register(ProbeId::from(format!("p{}", n % 7)), n);
                    if n % 64 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
            })
        })
        .collect();

    let mut seen = HashSet::new();
    let mut finished = false;
    while !finished {
        finished = producers.iter().all(|p| p.is_finished());
        for handles in store.drain_all().into_values() {
            for handle in handles {
                assert!(seen.insert(handle), "handle {} drained twice", handle);
            }
        }
        tokio::task::yield_now().await;
    }
    for producer in producers {
        producer.await.unwrap();
    }
    for handles in store.drain_all().into_values() {
        seen.extend(handles);
    }
    assert_eq!(seen.len(), TOTAL);
}
