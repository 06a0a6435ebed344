//! # Outbound Packet Queue
//!
//! Frames built by game logic wait here until the writer task drains them.
//! Producers never block; the queue is unbounded and the writer is woken
//! through a [`Notify`].

use eoclient_protocol::PacketFrame;
use parking_lot::Mutex;
use std::collections::VecDeque;
use tokio::sync::Notify;

/// FIFO of frames waiting to be sent
#[derive(Debug, Default)]
pub struct PacketQueue {
    frames: Mutex<VecDeque<PacketFrame>>,
    notify: Notify,
}

impl PacketQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a frame and wake the writer
    pub fn enqueue(&self, frame: PacketFrame) {
        self.frames.lock().push_back(frame);
        self.notify.notify_one();
    }

    /// Take every queued frame in FIFO order
    pub fn dequeue_all(&self) -> Vec<PacketFrame> {
        self.frames.lock().drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.lock().len()
    }

    /// Drop all queued frames
    pub fn clear(&self) {
        let dropped = {
            let mut frames = self.frames.lock();
            let count = frames.len();
            frames.clear();
            count
        };
        if dropped > 0 {
            tracing::warn!("Dropped {} queued frame(s)", dropped);
        }
    }

    /// Wait until something is enqueued
    ///
    /// A permit stored by an earlier `enqueue` completes this immediately,
    /// so frames enqueued between a drain and the next wait are not missed.
    pub async fn wait(&self) {
        self.notify.notified().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eoclient_protocol::{PacketAction, PacketFamily};
    use std::sync::Arc;
    use std::time::Duration;

    fn frame(action: PacketAction) -> PacketFrame {
        PacketFrame::new(PacketFamily::Locker, action)
    }

    #[test]
    fn test_fifo_order() {
        let queue = PacketQueue::new();
        queue.enqueue(frame(PacketAction::Open));
        queue.enqueue(frame(PacketAction::Add));
        queue.enqueue(frame(PacketAction::Take));
        assert_eq!(queue.len(), 3);

        let actions: Vec<_> = queue.dequeue_all().iter().map(PacketFrame::action).collect();
        assert_eq!(actions, vec![PacketAction::Open, PacketAction::Add, PacketAction::Take]);
        assert!(queue.is_empty());
        assert!(queue.dequeue_all().is_empty());
    }

    #[test]
    fn test_clear() {
        let queue = PacketQueue::new();
        queue.enqueue(frame(PacketAction::Buy));
        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
    }

    #[tokio::test]
    async fn test_wait_wakes_on_enqueue() {
        let queue = Arc::new(PacketQueue::new());
        let waiter = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move {
                queue.wait().await;
                queue.dequeue_all().len()
            })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        queue.enqueue(frame(PacketAction::Open));

        let drained = tokio::time::timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap();
        assert_eq!(drained, 1);
    }

    #[tokio::test]
    async fn test_permit_survives_until_wait() {
        let queue = PacketQueue::new();
        queue.enqueue(frame(PacketAction::Open));
        tokio::time::timeout(Duration::from_secs(1), queue.wait()).await.unwrap();
    }
}
