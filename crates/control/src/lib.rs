#![deny(missing_docs)]
#![doc = include_str!("../README.md")]

pub mod automation;
pub mod device;
pub mod gesture;
pub mod manager;

use crate::gesture::{GestureConfig, GestureStream};
use futures::{Stream, StreamExt};
use std::future::ready;
use thiserror::Error;

pub use gesture::{Gesture, GestureEvent};

/// Sensor is an entity which streams data to the controller eg: a contact
/// sensor
pub trait Sensor {
    /// Item is the type of the data streamed from this sensor
    type Item;
    /// subscribe returns a stream of data, it should be read from regularly
    /// to prevent the lagging receiver from slowing down other receivers,
    /// this stream can be safely dropped if it is no longer needed
    fn subscribe(&self) -> Box<dyn Stream<Item = Self::Item> + Unpin + Send + '_>;
}

impl<T> dyn Sensor<Item = T> {}

/// ContactState represents a door/window contact which can be open or closed
#[derive(Debug, Clone, PartialEq, Eq, Copy, derive_more::Display)]
pub enum ContactState {
    /// the contact is separated from its magnet
    #[display("open")]
    Open,
    /// the contact is against its magnet
    #[display("closed")]
    Closed,
}

impl ContactState {
    /// true for [`ContactState::Open`]
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

/// some helpers provided as extensions to stream since streams are quite
/// useful as input for automations
pub trait StreamCustomExt: Stream + Sized {
    /// filter out any values not equal to the given value, eg: keeping only
    /// the `Held` gestures from a switch
    fn filter_eq(self, value: Self::Item) -> impl Stream<Item = Self::Item>
    where
        Self::Item: PartialEq + 'static,
    {
        self.filter(move |v| ready(value.eq(v)))
    }

    /// next_eq waits for the next value in the stream which equals the given
    /// value, eg: waiting for a door to open
    fn next_eq(&mut self, value: Self::Item) -> impl Future<Output = Option<Self::Item>>
    where
        Self::Item: PartialEq,
        Self: Unpin,
    {
        async move {
            loop {
                let v = self.next().await?;
                if value == v {
                    return Some(v);
                }
            }
        }
    }

    /// Classifies a stream of raw switch attribute codes into gestures,
    /// disambiguating held keys from short presses with a confirmation
    /// timer, see [`GestureStream`] for the exact rules.
    ///
    /// Every call creates an independent classifier, state is never shared
    /// between devices
    fn classify_gestures(self, config: GestureConfig) -> GestureStream<Self>
    where
        Self: Stream<Item = u8> + Unpin,
    {
        GestureStream::new(self, config)
    }
}

impl<S: Stream> StreamCustomExt for S {}

/// An error enum for integrations to use
#[derive(Debug, Error)]
pub enum Error {
    /// This error can be returned from any function reading a stream from a
    /// device, and indicates that the stream closed
    #[error("Input stream closed")]
    InputStreamClosed,
    /// This indicates that there was an error while communicating with a
    /// device
    #[error("Communication error: {0}")]
    Communication(String),
}
