//! Bounded mailbox behavior under load: senders wait for space, and give up
//! with a backpressure error once the configured timeout elapses.

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{prioritized, wait_until, GatedEffector};
use effector::{EffectorError, MailboxConfig, Priority, SendError};
use futures::future::join_all;

async fn flood(sends: usize) -> Duration {
    let config = MailboxConfig::default()
        .with_capacity(10)
        .with_backpressure_timeout(Duration::from_secs(30));
    let harness = Arc::new(GatedEffector::create_with("flooded", config, |reducer| {
        reducer.with_delay(Duration::from_millis(1))
    }));

    let started = Instant::now();
    let senders = (0..sends).map(|n| {
        let harness = harness.clone();
        tokio::spawn(async move {
            harness
                .service
                .send(&harness.id, harness.record(&format!("r{n}")))
                .await
        })
    });
    for joined in join_all(senders).await {
        joined.expect("sender panicked").expect("send accepted");
    }
    let elapsed = started.elapsed();

    wait_until(|| harness.state().processing.processed == sends as u64).await;
    harness.service.terminate_all().await;
    elapsed
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn saturated_mailbox_slows_senders_to_processing_rate() {
    let light = flood(10).await;
    let heavy = flood(1000).await;

    // 990 records must be processed before the last sender finds room.
    assert!(heavy >= Duration::from_millis(500), "heavy load took {heavy:?}");
    assert!(heavy > light, "heavy {heavy:?} vs light {light:?}");
}

#[tokio::test]
async fn full_mailbox_times_out_with_backpressure() {
    let config = MailboxConfig::default()
        .with_capacity(1)
        .with_backpressure_timeout(Duration::from_millis(50));
    let harness = GatedEffector::create("tight", config);
    harness.park().await;

    harness
        .service
        .send(&harness.id, harness.record("fills"))
        .await
        .unwrap();

    let started = Instant::now();
    let err = harness
        .service
        .send(&harness.id, harness.record("rejected"))
        .await
        .unwrap_err();
    assert!(started.elapsed() >= Duration::from_millis(50));
    assert!(matches!(
        err,
        EffectorError::Send(SendError::Backpressure { ref id, timeout })
            if id.as_str() == "tight" && timeout == Duration::from_millis(50)
    ));
    assert!(harness.service.contains("tight"));

    // The actor keeps working once the consumer catches up.
    harness.release();
    harness
        .service
        .send(&harness.id, harness.record("after"))
        .await
        .unwrap();
    wait_until(|| harness.state().processing.processed == 3).await;
    assert_eq!(harness.state().state, vec!["BLOCK", "fills", "after"]);

    harness.service.terminate_all().await;
}

#[tokio::test]
async fn try_send_fails_fast_when_full() {
    let harness = GatedEffector::create("fast", MailboxConfig::default().with_capacity(1));
    harness.park().await;

    harness.service.try_send(&harness.id, harness.record("fills")).unwrap();
    let err = harness
        .service
        .try_send(&harness.id, harness.record("rejected"))
        .unwrap_err();
    assert!(matches!(err, EffectorError::Send(ref e) if e.is_backpressure()));

    harness.release();
    harness.service.terminate_all().await;
}

#[tokio::test]
async fn high_lane_has_its_own_capacity() {
    let config = prioritized(1).with_backpressure_timeout(Duration::from_millis(20));
    let harness = GatedEffector::create("lanes", config);
    harness.park().await;

    harness
        .service
        .send(&harness.id, harness.record("normal"))
        .await
        .unwrap();
    harness
        .service
        .send(&harness.id, harness.record("urgent").with_priority(Priority::High))
        .await
        .expect("high lane is separate");

    let err = harness
        .service
        .send(&harness.id, harness.record("urgent-2").with_priority(Priority::High))
        .await
        .unwrap_err();
    assert!(matches!(err, EffectorError::Send(ref e) if e.is_backpressure()));

    harness.release();
    wait_until(|| harness.state().processing.processed == 3).await;
    assert_eq!(harness.state().state, vec!["BLOCK", "urgent", "normal"]);
    harness.service.terminate_all().await;
}

#[tokio::test]
async fn parked_sender_fails_when_effector_terminates() {
    let config = MailboxConfig::default()
        .with_capacity(1)
        .with_backpressure_timeout(Duration::from_secs(10));
    let harness = Arc::new(GatedEffector::create("closing", config));
    harness.park().await;
    harness
        .service
        .send(&harness.id, harness.record("fills"))
        .await
        .unwrap();

    let effector = harness.service.get(&harness.id).unwrap();
    let parked = {
        let record = harness.record("parked");
        tokio::spawn(async move { effector.send(record).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    harness.service.terminate(&harness.id).await.unwrap();
    let result = parked.await.expect("sender task panicked");
    assert!(result.unwrap_err().is_terminated());
}
