//! The panic hook is process-global, so it gets a test binary of its own

use gen_fault_gateway::lifecycle::{GuardianConfig, GuardianState, ProcessGuardian, Terminator};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

struct RecordingTerminator {
    codes: Arc<Mutex<Vec<i32>>>,
}

impl Terminator for RecordingTerminator {
    fn terminate(&self, code: i32) {
        self.codes.lock().push(code);
    }
}

#[tokio::test]
async fn test_installed_hook_turns_panics_into_termination() {
    let codes = Arc::new(Mutex::new(Vec::new()));
    let guardian = ProcessGuardian::new(
        GuardianConfig {
            drain_timeout: Duration::from_secs(1),
        },
        Arc::new(RecordingTerminator {
            codes: codes.clone(),
        }),
    );

    guardian.install().unwrap();
    assert!(guardian.install().is_err());

    let task = tokio::spawn(async {
        panic!("request handler exploded");
    });
    assert!(task.await.unwrap_err().is_panic());

    tokio::time::timeout(Duration::from_secs(2), guardian.terminated())
        .await
        .expect("guardian should terminate");
    assert_eq!(guardian.state(), GuardianState::Terminated);
    assert_eq!(*codes.lock(), vec![1]);
}
