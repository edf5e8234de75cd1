#![cfg(any(test, feature = "testing"))]

//! A chain which is driven by the test.

use std::{collections::HashMap, sync::Arc};

use futures::{
    channel::mpsc::{self, UnboundedSender},
    stream::{BoxStream, StreamExt},
};
use parking_lot::Mutex;

use super::{ChainClient, Input, Topic};
use crate::{Error, Result};

#[derive(Debug, Default)]
struct Inner {
    /// The latest value of each topic, sent first to every new subscriber.
    values: HashMap<Topic, Input>,

    /// Open and closed subscriptions, in the order they were made.
    subscribers: Vec<(Topic, UnboundedSender<Result<Input>>)>,
}

/// Chain client whose subscriptions yield whatever the test publishes.
#[derive(Clone, Debug, Default)]
pub struct MockChainClient {
    inner: Arc<Mutex<Inner>>,
}

impl MockChainClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a new value for `topic`.
    ///
    /// The value is delivered to every open subscription of `topic`, and to subscriptions made
    /// later as their initial value.
    pub fn set(&self, topic: Topic, input: Input) {
        assert_eq!(topic.kind(), input.kind(), "input does not match topic");
        let mut inner = self.inner.lock();
        for (_, tx) in inner.subscribers.iter().filter(|(t, _)| *t == topic) {
            // Closed subscriptions are kept around for counting.
            tx.unbounded_send(Ok(input.clone())).ok();
        }
        inner.values.insert(topic, input);
    }

    /// Make every open subscription of `topic` yield an error.
    pub fn fail(&self, topic: Topic, err: Error) {
        let inner = self.inner.lock();
        for (_, tx) in inner.subscribers.iter().filter(|(t, _)| *t == topic) {
            tx.unbounded_send(Err(err.clone())).ok();
        }
    }

    /// The number of subscriptions to `topic` which have not been dropped.
    pub fn open_subscriptions(&self, topic: Topic) -> usize {
        self.inner
            .lock()
            .subscribers
            .iter()
            .filter(|(t, tx)| *t == topic && !tx.is_closed())
            .count()
    }

    /// The number of subscriptions to any topic which have not been dropped.
    pub fn total_open_subscriptions(&self) -> usize {
        self.inner
            .lock()
            .subscribers
            .iter()
            .filter(|(_, tx)| !tx.is_closed())
            .count()
    }

    /// The number of subscriptions ever made to `topic`.
    pub fn subscription_count(&self, topic: Topic) -> usize {
        self.inner
            .lock()
            .subscribers
            .iter()
            .filter(|(t, _)| *t == topic)
            .count()
    }
}

impl ChainClient for MockChainClient {
    fn subscribe(&self, topic: Topic) -> BoxStream<'static, Result<Input>> {
        let (tx, rx) = mpsc::unbounded();
        let mut inner = self.inner.lock();
        if let Some(value) = inner.values.get(&topic) {
            tx.unbounded_send(Ok(value.clone())).ok();
        }
        inner.subscribers.push((topic, tx));
        rx.boxed()
    }
}
