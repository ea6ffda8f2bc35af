use super::{target_of, DownstreamAsset, Executor, FromPayload};
use crate::context::RequestContext;
use crate::error::DownstreamError;
use crate::payload::Payload;
use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

/// Message handed to a broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqMessage {
    /// Broker the message is addressed to, `host[:port][/path]`
    pub broker: String,
    pub topic: String,
    /// Trace id, used as the message key
    pub key: String,
    pub body: Bytes,
}

/// Publishing side of a message broker client.
#[async_trait]
pub trait MessagePublisher: Send + Sync + 'static {
    async fn publish(&self, message: MqMessage) -> Result<(), DownstreamError>;
}

/// In-process publisher backed by a bounded Tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    tx: mpsc::Sender<MqMessage>,
}

impl ChannelPublisher {
    /// Create a publisher and the receiver its messages arrive on.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<MqMessage>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

#[async_trait]
impl MessagePublisher for ChannelPublisher {
    async fn publish(&self, message: MqMessage) -> Result<(), DownstreamError> {
        let broker = message.broker.clone();
        self.tx
            .send(message)
            .await
            .map_err(|_| DownstreamError::connection(broker, "message channel closed"))
    }
}

/// Topic and body of one publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqPublish {
    pub topic: String,
    pub body: Bytes,
}

impl FromPayload for MqPublish {
    fn from_payload(ctx: &RequestContext, payload: Payload) -> Result<Self, DownstreamError> {
        let topic = ctx
            .method()
            .ok_or_else(|| DownstreamError::InvalidInput("MQ publish needs a 'method' topic".into()))?;
        Ok(Self {
            topic: topic.to_string(),
            body: payload.to_bytes(),
        })
    }
}

/// Publishes the request body to the topic named by the `method` parameter.
pub struct MqExecutor<P> {
    asset: DownstreamAsset,
    publisher: P,
}

impl<P: MessagePublisher> MqExecutor<P> {
    pub fn new(asset: DownstreamAsset, publisher: P) -> Self {
        Self { asset, publisher }
    }
}

#[async_trait]
impl<P: MessagePublisher> Executor for MqExecutor<P> {
    type Input = MqPublish;
    type Output = ();

    fn asset(&self) -> &DownstreamAsset {
        &self.asset
    }

    async fn execute(&self, ctx: &RequestContext, input: MqPublish) -> Result<(), DownstreamError> {
        let target = target_of(ctx)?;
        self.publisher
            .publish(MqMessage {
                broker: target.to_string(),
                topic: input.topic,
                key: ctx.trace_id().to_string(),
                body: input.body,
            })
            .await
    }
}
