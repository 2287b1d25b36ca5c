/// Result Streaming Module
///
/// A query's results travel from the producer thread to the REPL through a
/// bounded single-producer/single-consumer channel. The producer half is a
/// [`ResultSink`]; dropping it closes the stream, so the consumer can never
/// wait on a producer that has already gone away.
use serde_json::Value;
use std::sync::mpsc::{self, Receiver, SyncSender};

/// Number of results the producer may run ahead of the consumer.
pub const RESULT_BUFFER: usize = 5;

/// Maximum number of results a single query may deliver.
pub const RESULT_LIMIT: usize = 100;

/// Producer half of a result stream.
///
/// The sink enforces the result limit itself: once `limit` values have been
/// accepted every further push is discarded.
#[derive(Debug)]
pub struct ResultSink {
    tx: SyncSender<Value>,
    limit: usize,
    sent: usize,
}

/// Consumer half of a result stream. Iterating blocks until the next value
/// arrives and ends once the sink is dropped.
#[derive(Debug)]
pub struct ResultStream {
    rx: Receiver<Value>,
}

/// Opens a stream holding at most `capacity` undelivered values and
/// accepting at most `limit` values overall.
pub fn result_channel(capacity: usize, limit: usize) -> (ResultSink, ResultStream) {
    let (tx, rx) = mpsc::sync_channel(capacity);
    (ResultSink { tx, limit, sent: 0 }, ResultStream { rx })
}

impl ResultSink {
    /// Pushes a result, blocking while the stream is full.
    ///
    /// Returns `true` if the producer may keep going. Returns `false` once the
    /// limit has been reached or the consumer has hung up; producers should
    /// stop as soon as they see `false`.
    pub fn push(&mut self, value: Value) -> bool {
        if self.sent >= self.limit {
            return false;
        }
        if self.tx.send(value).is_err() {
            return false;
        }
        self.sent += 1;
        self.sent < self.limit
    }

    /// Number of results accepted so far
    pub fn sent(&self) -> usize {
        self.sent
    }

    /// Whether no further results will be accepted
    pub fn is_full(&self) -> bool {
        self.sent >= self.limit
    }
}

impl Iterator for ResultStream {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        self.rx.recv().ok()
    }
}
