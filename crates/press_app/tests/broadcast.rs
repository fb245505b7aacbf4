use press_app::Broadcaster;
use press_proto::{SnapshotData, Update};

fn update(id: &str, status: &str) -> Update {
    Update {
        id: id.to_string(),
        data: SnapshotData {
            filename: "paper.pdf".to_string(),
            status: status.to_string(),
            progress: 10.0,
            output_filename: "paper_converted.pdf".to_string(),
            compress: 0.0,
            file_size: String::new(),
        },
    }
}

#[tokio::test]
async fn every_live_observer_receives_each_update() {
    let mut broadcaster = Broadcaster::new();
    let (_first, mut first_rx) = broadcaster.subscribe();
    let (_second, mut second_rx) = broadcaster.subscribe();

    broadcaster.publish(&update("j-1", "Downloading..."));

    let frame = first_rx.recv().await.unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(parsed["updates"][0]["id"], "j-1");
    assert_eq!(parsed["updates"][0]["data"]["status"], "Downloading...");
    assert!(second_rx.try_recv().is_ok());
}

#[tokio::test]
async fn a_dead_observer_is_pruned_and_never_blocks_the_rest() {
    let mut broadcaster = Broadcaster::new();
    let (_dead, dead_rx) = broadcaster.subscribe();
    let (_live, mut live_rx) = broadcaster.subscribe();
    drop(dead_rx);

    broadcaster.publish(&update("j-1", "done"));

    assert_eq!(broadcaster.observer_count(), 1);
    assert!(live_rx.try_recv().is_ok());

    // Publishing again still reaches the survivor.
    broadcaster.publish(&update("j-2", "Idle"));
    assert!(live_rx.try_recv().is_ok());
}

#[tokio::test]
async fn unsubscribe_is_an_explicit_removal() {
    let mut broadcaster = Broadcaster::new();
    let (id, mut rx) = broadcaster.subscribe();
    broadcaster.unsubscribe(id);

    broadcaster.publish(&update("j-1", "Idle"));
    assert_eq!(broadcaster.observer_count(), 0);
    assert!(rx.try_recv().is_err());
}
