use tokio::sync::mpsc::Sender;

use crate::gtfs::{
    self, BatchSink, FeedTables,
    models::{StopTime, Trip},
};

pub(super) enum Message {
    Progress {
        current: usize,
        total: usize,
        message: String,
    },
    ReferenceTables(Box<FeedTables>),
    Trips(Vec<Trip>),
    StopTimes(Vec<StopTime>),
}

/// Forwards parsed batches from the blocking parse worker to the async writer.
/// Sends block while the channel is full, so the parser never runs more than
/// a few batches ahead of the store.
pub(super) struct ChannelSink {
    tx: Sender<Message>,
}

impl ChannelSink {
    pub(super) fn new(tx: Sender<Message>) -> Self {
        Self { tx }
    }

    fn send(&self, message: Message) -> Result<(), gtfs::Error> {
        self.tx
            .blocking_send(message)
            .map_err(|_| gtfs::Error::SinkClosed)
    }
}

impl BatchSink for ChannelSink {
    fn reference_tables(&mut self, tables: &FeedTables) -> Result<(), gtfs::Error> {
        self.send(Message::ReferenceTables(Box::new(tables.clone())))
    }

    fn trips(&mut self, batch: Vec<Trip>) -> Result<(), gtfs::Error> {
        self.send(Message::Trips(batch))
    }

    fn stop_times(&mut self, batch: Vec<StopTime>) -> Result<(), gtfs::Error> {
        self.send(Message::StopTimes(batch))
    }
}
