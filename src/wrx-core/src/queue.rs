// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Bounded single-producer/single-consumer hand-off queues.
//!
//! Both halves are move-only, so a queue has exactly one writer and one
//! reader for its whole life. Neither side ever blocks: a full queue hands
//! the item back to the producer and an empty queue yields `None`.
//! The halves work from plain OS threads; no runtime is required.

use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};

/// Create a queue holding at most `capacity` items.
pub fn spsc<T>(capacity: usize) -> (Producer<T>, Consumer<T>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (Producer { tx }, Consumer { rx })
}

#[derive(Debug)]
pub struct Producer<T> {
    tx: mpsc::Sender<T>,
}

impl<T> Producer<T> {
    /// Push without waiting. Returns the item when the queue is full or
    /// the consumer is gone.
    pub fn try_push(&self, item: T) -> Result<(), T> {
        self.tx.try_send(item).map_err(|e| match e {
            TrySendError::Full(item) | TrySendError::Closed(item) => item,
        })
    }

    /// True once the consumer half has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[derive(Debug)]
pub struct Consumer<T> {
    rx: mpsc::Receiver<T>,
}

impl<T> Consumer<T> {
    pub fn try_pop(&mut self) -> Option<T> {
        match self.rx.try_recv() {
            Ok(item) => Some(item),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let (tx, mut rx) = spsc(4);
        for i in 0..4 {
            assert!(tx.try_push(i).is_ok());
        }
        let drained: Vec<i32> = std::iter::from_fn(|| rx.try_pop()).collect();
        assert_eq!(drained, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_full_queue_returns_item() {
        let (tx, mut rx) = spsc(2);
        tx.try_push("a").unwrap();
        tx.try_push("b").unwrap();
        assert_eq!(tx.try_push("c"), Err("c"));
        assert_eq!(rx.try_pop(), Some("a"));
        assert!(tx.try_push("c").is_ok());
    }

    #[test]
    fn test_empty_queue_pops_none() {
        let (_tx, mut rx) = spsc::<u8>(1);
        assert_eq!(rx.try_pop(), None);
        assert!(rx.is_empty());
    }

    #[test]
    fn test_dropped_consumer_rejects_push() {
        let (tx, rx) = spsc(1);
        drop(rx);
        assert!(tx.is_closed());
        assert_eq!(tx.try_push(7), Err(7));
    }

    #[test]
    fn test_cross_thread_hand_off() {
        let (tx, mut rx) = spsc(16);
        let producer = std::thread::spawn(move || {
            let mut sent = 0;
            while sent < 100 {
                if tx.try_push(sent).is_ok() {
                    sent += 1;
                } else {
                    std::thread::yield_now();
                }
            }
        });
        let mut received = Vec::new();
        while received.len() < 100 {
            match rx.try_pop() {
                Some(v) => received.push(v),
                None => std::thread::yield_now(),
            }
        }
        producer.join().unwrap();
        assert_eq!(received, (0..100).collect::<Vec<_>>());
    }
}
