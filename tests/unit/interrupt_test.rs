//! Tests for interrupt relaying

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Semaphore};

use headline_scheduler::runtime::relay_interrupts;

type Signal = Pin<Box<dyn Future<Output = bool> + Send>>;

/// Signal source that fires once per permit and ends when closed.
fn signals(sem: &Arc<Semaphore>) -> impl FnMut() -> Signal + Send {
    let sem = Arc::clone(sem);
    move || {
        let sem = Arc::clone(&sem);
        Box::pin(async move { sem.acquire().await.map(|p| p.forget()).is_ok() })
    }
}

#[tokio::test]
async fn test_first_interrupt_requests_shutdown_second_forces() {
    let sem = Arc::new(Semaphore::new(0));
    let (tx, mut rx) = watch::channel(false);
    let forced = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&forced);

    let relay = tokio::spawn(relay_interrupts(signals(&sem), tx, move || {
        flag.store(true, Ordering::SeqCst);
    }));

    sem.add_permits(1);
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|stop| *stop))
        .await
        .unwrap()
        .unwrap();
    assert!(!forced.load(Ordering::SeqCst));
    assert!(!relay.is_finished());

    sem.add_permits(1);
    tokio::time::timeout(Duration::from_secs(5), relay)
        .await
        .unwrap()
        .unwrap();
    assert!(forced.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_closed_signal_source_ends_without_forcing() {
    let sem = Arc::new(Semaphore::new(0));
    let (tx, rx) = watch::channel(false);
    let forced = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&forced);

    let relay = tokio::spawn(relay_interrupts(signals(&sem), tx, move || {
        flag.store(true, Ordering::SeqCst);
    }));

    sem.close();
    tokio::time::timeout(Duration::from_secs(5), relay)
        .await
        .unwrap()
        .unwrap();
    assert!(!forced.load(Ordering::SeqCst));
    assert!(!*rx.borrow());
}
