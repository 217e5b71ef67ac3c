//! Message-queue protocol.
//!
//! Unbounded FIFO with a single consumer, built on a lock-free
//! `crossbeam_channel`. Every enqueue that has returned is visible to the
//! consumer's next call, no matter what the producer is doing meanwhile.
//! The consumer drains the channel into a local deque so `front` can hand
//! out a reference.

use core::fmt;
use std::collections::VecDeque;

use crossbeam_channel::{Receiver, Sender, unbounded};

use super::{Protocol, ProtocolKind};
use crate::error::ProtocolError;
use crate::parameter::ParameterValue;

/// Marker type for the message-queue protocol.
#[derive(Clone, Copy, Debug, Default)]
pub struct MessageQueue;

/// Producer endpoint of a message queue.
pub struct MessageQueueOutput<T> {
    sender: Sender<T>,
    /// Held until a consumer connects.
    unclaimed: Option<Receiver<T>>,
}

impl<T: ParameterValue> MessageQueueOutput<T> {
    /// Appends `value` to the queue.
    ///
    /// Values sent while no consumer is attached are discarded.
    pub fn enqueue(&mut self, value: T) {
        if self.unclaimed.is_none() {
            // The consumer owns the only receiver; once it is gone there is
            // nobody left to deliver to.
            let _ = self.sender.send(value);
        }
    }

    /// Whether a consumer is attached.
    pub fn is_connected(&self) -> bool {
        self.unclaimed.is_none()
    }
}

impl<T> fmt::Debug for MessageQueueOutput<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageQueueOutput")
            .field("connected", &self.unclaimed.is_none())
            .field("in_flight", &self.sender.len())
            .finish()
    }
}

/// Consumer endpoint of a message queue.
pub struct MessageQueueInput<T> {
    receiver: Receiver<T>,
    local: VecDeque<T>,
}

impl<T: ParameterValue> MessageQueueInput<T> {
    fn fetch(&mut self) {
        self.local.extend(self.receiver.try_iter());
    }

    /// Whether no message is waiting.
    pub fn is_empty(&mut self) -> bool {
        self.fetch();
        self.local.is_empty()
    }

    /// Number of waiting messages.
    pub fn len(&mut self) -> usize {
        self.fetch();
        self.local.len()
    }

    /// Oldest waiting message.
    pub fn front(&mut self) -> Result<&T, ProtocolError> {
        self.fetch();
        self.local.front().ok_or(ProtocolError::EmptyQueue)
    }

    /// Removes and returns the oldest waiting message.
    pub fn pop(&mut self) -> Result<T, ProtocolError> {
        self.fetch();
        self.local.pop_front().ok_or(ProtocolError::EmptyQueue)
    }

    /// Drops every waiting message.
    pub fn clear(&mut self) {
        self.fetch();
        self.local.clear();
    }
}

impl<T> fmt::Debug for MessageQueueInput<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageQueueInput")
            .field("local", &self.local.len())
            .field("in_flight", &self.receiver.len())
            .finish()
    }
}

impl Protocol for MessageQueue {
    const KIND: ProtocolKind = ProtocolKind::MessageQueue;

    type Output<T: ParameterValue> = MessageQueueOutput<T>;
    type Input<T: ParameterValue> = MessageQueueInput<T>;

    fn create<T: ParameterValue>(_initial: T) -> MessageQueueOutput<T> {
        let (sender, receiver) = unbounded();
        MessageQueueOutput {
            sender,
            unclaimed: Some(receiver),
        }
    }

    fn connect<T: ParameterValue>(
        output: &mut MessageQueueOutput<T>,
    ) -> Result<MessageQueueInput<T>, ProtocolError> {
        let receiver = output
            .unclaimed
            .take()
            .ok_or(ProtocolError::FanOutUnsupported(ProtocolKind::MessageQueue))?;
        Ok(MessageQueueInput {
            receiver,
            local: VecDeque::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::{ScalarParameter, StringParameter};

    fn queue() -> (MessageQueueOutput<ScalarParameter<i32>>, MessageQueueInput<ScalarParameter<i32>>) {
        let mut output = MessageQueue::create(ScalarParameter::default());
        let input = MessageQueue::connect(&mut output).unwrap();
        (output, input)
    }

    #[test]
    fn test_fifo_order() {
        let (mut output, mut input) = queue();
        assert!(input.is_empty());
        for v in [1, 2, 3] {
            output.enqueue(ScalarParameter::new(v));
        }
        assert!(!input.is_empty());
        assert_eq!(input.len(), 3);
        assert_eq!(input.front().unwrap().value(), 1);
        assert_eq!(input.pop().unwrap().value(), 1);
        assert_eq!(input.pop().unwrap().value(), 2);
        assert_eq!(input.pop().unwrap().value(), 3);
        assert!(input.is_empty());
    }

    #[test]
    fn test_order_preserved_across_fetches() {
        let (mut output, mut input) = queue();
        output.enqueue(ScalarParameter::new(1));
        output.enqueue(ScalarParameter::new(2));
        assert_eq!(input.pop().unwrap().value(), 1);
        output.enqueue(ScalarParameter::new(3));
        assert_eq!(input.pop().unwrap().value(), 2);
        assert_eq!(input.pop().unwrap().value(), 3);
    }

    #[test]
    fn test_empty_queue_errors() {
        let (_output, mut input) = queue();
        assert_eq!(input.pop().unwrap_err(), ProtocolError::EmptyQueue);
        assert_eq!(input.front().unwrap_err(), ProtocolError::EmptyQueue);
    }

    #[test]
    fn test_clear_drops_pending() {
        let (mut output, mut input) = queue();
        output.enqueue(ScalarParameter::new(1));
        output.enqueue(ScalarParameter::new(2));
        input.clear();
        assert!(input.is_empty());
        output.enqueue(ScalarParameter::new(3));
        assert_eq!(input.pop().unwrap().value(), 3);
    }

    #[test]
    fn test_single_consumer() {
        let (mut output, _input) = queue();
        assert!(matches!(
            MessageQueue::connect(&mut output),
            Err(ProtocolError::FanOutUnsupported(ProtocolKind::MessageQueue))
        ));
    }

    #[test]
    fn test_unconnected_output_discards() {
        let mut output = MessageQueue::create(StringParameter::default());
        assert!(!output.is_connected());
        output.enqueue(StringParameter::new("lost"));
        let mut input = MessageQueue::connect(&mut output).unwrap();
        assert!(input.is_empty());
        output.enqueue(StringParameter::new("kept"));
        assert_eq!(input.pop().unwrap().as_str(), "kept");
    }

    #[test]
    fn test_cross_thread_producer() {
        let (mut output, mut input) = queue();
        let producer = std::thread::spawn(move || {
            for v in 0..1000 {
                output.enqueue(ScalarParameter::new(v));
            }
        });
        producer.join().unwrap();

        let mut expected = 0;
        while let Ok(value) = input.pop() {
            assert_eq!(value.value(), expected);
            expected += 1;
        }
        assert_eq!(expected, 1000);
    }

    #[test]
    fn test_completed_enqueue_visible_while_producer_busy() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::{Arc, Barrier};

        let (mut output, mut input) = queue();
        let first_sent = Arc::new(Barrier::new(2));
        let stop = Arc::new(AtomicBool::new(false));
        let producer = {
            let first_sent = Arc::clone(&first_sent);
            let stop = Arc::clone(&stop);
            std::thread::spawn(move || {
                output.enqueue(ScalarParameter::new(1));
                first_sent.wait();
                let mut next = 2;
                while !stop.load(Ordering::Relaxed) {
                    output.enqueue(ScalarParameter::new(next));
                    next += 1;
                }
            })
        };

        first_sent.wait();
        // The producer keeps sending while the consumer looks.
        for _ in 0..100 {
            assert!(!input.is_empty());
            assert!(input.len() >= 1);
            assert_eq!(input.front().unwrap().value(), 1);
        }
        stop.store(true, Ordering::Relaxed);
        producer.join().unwrap();

        let mut expected = 1;
        while let Ok(value) = input.pop() {
            assert_eq!(value.value(), expected);
            expected += 1;
        }
        assert!(expected > 1);
    }
}
