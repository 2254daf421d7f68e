//! Unit tests for the provider slot

use gen_fault_gateway::provider::ProviderSlot;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct Client {
    generation: u32,
}

#[tokio::test]
async fn test_concurrent_first_use_initializes_once() {
    let slot = Arc::new(ProviderSlot::<Client>::new());
    let inits = Arc::new(AtomicU32::new(0));

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let slot = slot.clone();
        let inits = inits.clone();
        tasks.push(tokio::spawn(async move {
            slot.get_or_try_init(|| async {
                let generation = inits.fetch_add(1, Ordering::SeqCst) + 1;
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok::<_, String>(Client { generation })
            })
            .await
            .map(|client| client.generation)
        }));
    }

    for task in tasks {
        assert_eq!(task.await.unwrap().unwrap(), 1);
    }
    assert_eq!(inits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_concurrent_callers_share_a_failure_then_retry() {
    let slot = ProviderSlot::<Client>::new();

    let first = slot
        .get_or_try_init(|| async { Err::<Client, _>("RUNWARE_API_KEY is not configured") })
        .await;
    assert_eq!(first.err(), Some("RUNWARE_API_KEY is not configured"));

    let second = slot
        .get_or_try_init(|| async { Ok::<_, &str>(Client { generation: 2 }) })
        .await
        .unwrap();
    assert_eq!(second.generation, 2);
}

#[tokio::test]
async fn test_reset_builds_a_fresh_client() {
    let slot = ProviderSlot::<Client>::new();
    let first = slot
        .get_or_try_init(|| async { Ok::<_, ()>(Client { generation: 1 }) })
        .await
        .unwrap();

    let previous = slot.reset().unwrap();
    assert!(Arc::ptr_eq(&first, &previous));
    assert!(!slot.is_initialized());

    let second = slot
        .get_or_try_init(|| async { Ok::<_, ()>(Client { generation: 2 }) })
        .await
        .unwrap();
    assert_eq!(second.generation, 2);
    // Holders of the old client are unaffected
    assert_eq!(first.generation, 1);
}
