use std::collections::VecDeque;
use std::sync::Mutex;

use crate::{Envelope, Message};

/// A plain FIFO backing an actor's mailbox. Synchronous on purpose:
/// enqueue/dequeue never suspend, matching the rest of the runtime's
/// no-suspension-inside-a-behavior-invocation design.
pub fn queue<Msg: Message>(capacity: Option<usize>) -> (QueueWriter<Msg>, QueueReader<Msg>) {
    let inner = std::sync::Arc::new(Mutex::new(VecDeque::new()));
    (
        QueueWriter {
            inner: inner.clone(),
            capacity,
        },
        QueueReader { inner },
    )
}

#[derive(Clone)]
pub struct QueueWriter<Msg: Message> {
    inner: std::sync::Arc<Mutex<VecDeque<Envelope<Msg>>>>,
    capacity: Option<usize>,
}

impl<Msg: Message> QueueWriter<Msg> {
    pub fn try_enqueue(&self, msg: Envelope<Msg>) -> EnqueueResult<Msg> {
        let mut q = self.inner.lock().unwrap();
        if let Some(cap) = self.capacity {
            if q.len() >= cap {
                return Err(EnqueueError { msg: msg.msg });
            }
        }
        q.push_back(msg);
        Ok(())
    }
}

pub struct QueueReader<Msg: Message> {
    inner: std::sync::Arc<Mutex<VecDeque<Envelope<Msg>>>>,
}

impl<Msg: Message> QueueReader<Msg> {
    pub fn try_dequeue(&self) -> DequeueResult<Envelope<Msg>> {
        self.inner.lock().unwrap().pop_front().ok_or(QueueEmpty)
    }

    pub fn has_msgs(&self) -> bool {
        !self.inner.lock().unwrap().is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct EnqueueError<T> {
    pub msg: T,
}

pub type EnqueueResult<Msg> = Result<(), EnqueueError<Msg>>;

pub struct QueueEmpty;
pub type DequeueResult<Msg> = Result<Msg, QueueEmpty>;

#[cfg(test)]
mod tests {
    use super::*;

    fn env(n: u32) -> Envelope<u32> {
        Envelope {
            sender: None,
            msg: n,
        }
    }

    #[test]
    fn dequeues_in_fifo_order() {
        let (w, r) = queue::<u32>(None);
        w.try_enqueue(env(1)).unwrap();
        w.try_enqueue(env(2)).unwrap();
        w.try_enqueue(env(3)).unwrap();

        assert_eq!(r.try_dequeue().ok().map(|e| e.msg), Some(1));
        assert_eq!(r.try_dequeue().ok().map(|e| e.msg), Some(2));
        assert_eq!(r.try_dequeue().ok().map(|e| e.msg), Some(3));
    }

    #[test]
    fn dequeue_on_empty_queue_fails() {
        let (_w, r) = queue::<u32>(None);
        assert!(r.try_dequeue().is_err());
    }

    #[test]
    fn enqueue_past_capacity_is_rejected() {
        let (w, _r) = queue::<u32>(Some(2));
        w.try_enqueue(env(1)).unwrap();
        w.try_enqueue(env(2)).unwrap();
        assert!(w.try_enqueue(env(3)).is_err());
    }

    #[test]
    fn has_msgs_reflects_queue_state() {
        let (w, r) = queue::<u32>(None);
        assert!(!r.has_msgs());
        w.try_enqueue(env(1)).unwrap();
        assert!(r.has_msgs());
        r.try_dequeue().unwrap();
        assert!(!r.has_msgs());
    }
}
