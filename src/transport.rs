// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The notification transport boundary.
//!
//! The link is assumed pre-configured: discovering endpoints on the peer
//! and enabling the underlying radio are out of scope. This module only
//! defines the capability surface the client consumes.

use std::{fmt, io, sync::Arc, time::Duration};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

/// Identifier of a write or notify endpoint on the connected peer,
/// e.g. a GATT characteristic UUID.
pub type EndpointId = String;

/// Per-deployment link parameters consumed by the transport client.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Endpoint request frames are written to.
    pub write_endpoint: EndpointId,

    /// Endpoint response notifications arrive on.
    pub read_endpoint: EndpointId,

    /// Deadline for the response to a single request.
    pub response_timeout: Duration,

    /// Device settle time awaited before each write.
    pub pre_send_delay: Duration,

    /// Extra leading byte some deployments require on the wire.
    ///
    /// Prepended at send time only and excluded from the CRC.
    pub frame_prefix: Option<u8>,

    /// Whether responses arrive as notifications.
    ///
    /// Only the notification-based path is implemented; requests fail
    /// fast when this is disabled.
    pub use_notifications: bool,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            write_endpoint: EndpointId::default(),
            read_endpoint: EndpointId::default(),
            response_timeout: Duration::from_millis(3000),
            pre_send_delay: Duration::ZERO,
            frame_prefix: None,
            use_notifications: true,
        }
    }
}

/// Notification stream of one endpoint registration.
///
/// Dropping the subscription *is* the unsubscribe operation: the sending
/// side observes the closed channel and releases the registration. This
/// guarantees that whichever of timeout and notification loses the race
/// is positively cancelled.
#[derive(Debug)]
pub struct Subscription {
    notifications: mpsc::UnboundedReceiver<Bytes>,
}

impl Subscription {
    /// Wrap the receiving half of a notification channel.
    #[must_use]
    pub fn new(notifications: mpsc::UnboundedReceiver<Bytes>) -> Self {
        Self { notifications }
    }

    /// The next notification payload, or `None` once the transport side
    /// has gone away.
    pub async fn next(&mut self) -> Option<Bytes> {
        self.notifications.recv().await
    }
}

/// A connected peer that accepts writes and pushes notifications.
///
/// Implemented over the vendor link (BLE GATT or similar) in production
/// and by in-memory doubles in tests. One transport handle represents
/// one connected peer; after a reconnect a new handle (and a new client
/// wrapping it) must be constructed.
#[async_trait]
pub trait NotificationTransport: Send + Sync + fmt::Debug {
    /// Write a raw buffer to the given endpoint.
    async fn write(&self, endpoint: &EndpointId, bytes: &[u8]) -> io::Result<()>;

    /// Register for notifications from the given endpoint.
    async fn subscribe(&self, endpoint: &EndpointId) -> io::Result<Subscription>;

    /// Tear down the connection to the peer.
    async fn disconnect(&self) -> io::Result<()>;
}

#[async_trait]
impl<T> NotificationTransport for Arc<T>
where
    T: NotificationTransport + ?Sized,
{
    async fn write(&self, endpoint: &EndpointId, bytes: &[u8]) -> io::Result<()> {
        (**self).write(endpoint, bytes).await
    }

    async fn subscribe(&self, endpoint: &EndpointId) -> io::Result<Subscription> {
        (**self).subscribe(endpoint).await
    }

    async fn disconnect(&self) -> io::Result<()> {
        (**self).disconnect().await
    }
}
