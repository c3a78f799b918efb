use crate::Updates;
use crate::report::AttributeValue;
use control::Sensor;
use futures::Stream;
use tokio_stream::StreamExt;

/// A subscription to one attribute binding, mapping raw reported values into
/// a device-level item type
#[derive(Clone)]
pub struct SubscribeAttr<Item> {
    updates: Updates,
    func: fn(AttributeValue) -> Option<Item>,
}

impl<Item> SubscribeAttr<Item> {
    pub(crate) fn new(updates: Updates, func: fn(AttributeValue) -> Option<Item>) -> Self {
        Self { updates, func }
    }
}

impl<Item: Send + 'static> SubscribeAttr<Item> {
    /// The same stream as [Sensor::subscribe] but untied from this binding's
    /// lifetime, the stream stays alive for as long as the routing task does
    pub(crate) fn stream(&self) -> impl Stream<Item = Item> + Unpin + Send + use<Item> {
        self.updates.subscribe().filter_map(self.func)
    }
}

impl<Item> Sensor for SubscribeAttr<Item>
where
    Item: Send + Sync + 'static,
{
    type Item = Item;

    fn subscribe(&self) -> Box<dyn Stream<Item = Self::Item> + Unpin + Send + '_> {
        Box::new(self.stream())
    }
}
