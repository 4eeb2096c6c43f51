// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted in-memory transport for exercising the notification client.

use std::{
    fmt, io,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use modbus_notify::{crc16, EndpointId, NotificationTransport, Subscription};

type Responder = dyn Fn(&[u8]) -> Vec<Vec<u8>> + Send + Sync;

/// Transport double that answers every write with scripted notifications.
///
/// Tracks all writes and the maximum number of concurrently outstanding
/// writes, so tests can assert the one-request-at-a-time discipline.
pub struct MockTransport {
    responder: Box<Responder>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<Bytes>>>,
    writes: Mutex<Vec<(EndpointId, Vec<u8>)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    fail_writes: bool,
    hang_writes: bool,
    closed_subscriptions: bool,
    disconnects: AtomicUsize,
}

impl MockTransport {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&[u8]) -> Vec<Vec<u8>> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            subscribers: Mutex::new(Vec::new()),
            writes: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            fail_writes: false,
            hang_writes: false,
            closed_subscriptions: false,
            disconnects: AtomicUsize::new(0),
        }
    }

    /// A transport whose writes always fail.
    pub fn failing() -> Self {
        let mut transport = Self::new(|_| Vec::new());
        transport.fail_writes = true;
        transport
    }

    /// A transport whose writes never complete.
    pub fn hanging() -> Self {
        let mut transport = Self::new(|_| Vec::new());
        transport.hang_writes = true;
        transport
    }

    /// A transport whose notification streams end immediately.
    pub fn with_closed_subscriptions() -> Self {
        let mut transport = Self::new(|_| Vec::new());
        transport.closed_subscriptions = true;
        transport
    }

    /// All writes performed so far, in order.
    pub fn writes(&self) -> Vec<(EndpointId, Vec<u8>)> {
        self.writes.lock().unwrap().clone()
    }

    /// Highest number of writes that were ever outstanding at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Number of subscriptions whose receiving side is still alive.
    pub fn open_subscriptions(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap()
            .iter()
            .filter(|sender| !sender.is_closed())
            .count()
    }

    pub fn disconnect_count(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockTransport")
            .field("fail_writes", &self.fail_writes)
            .field("disconnects", &self.disconnects)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl NotificationTransport for MockTransport {
    async fn write(&self, endpoint: &EndpointId, bytes: &[u8]) -> io::Result<()> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::Other, "write rejected"));
        }
        if self.hang_writes {
            std::future::pending::<()>().await;
        }
        let outstanding = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(outstanding, Ordering::SeqCst);

        self.writes
            .lock()
            .unwrap()
            .push((endpoint.clone(), bytes.to_vec()));
        let responses = (self.responder)(bytes);

        // Model the round trip to the device.
        tokio::time::sleep(Duration::from_millis(1)).await;

        let subscribers = self.subscribers.lock().unwrap();
        for response in responses {
            for sender in subscribers.iter() {
                let _ = sender.send(Bytes::from(response.clone()));
            }
        }
        drop(subscribers);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }

    async fn subscribe(&self, _endpoint: &EndpointId) -> io::Result<Subscription> {
        let (sender, receiver) = mpsc::unbounded_channel();
        if !self.closed_subscriptions {
            self.subscribers.lock().unwrap().push(sender);
        }
        Ok(Subscription::new(receiver))
    }

    async fn disconnect(&self) -> io::Result<()> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn with_crc(body: &[u8]) -> Vec<u8> {
    let mut frame = body.to_vec();
    frame.extend_from_slice(&crc16(body).to_le_bytes());
    frame
}

/// A valid read response frame carrying `data`.
pub fn read_response(unit_id: u8, data: &[u8]) -> Vec<u8> {
    let mut body = vec![unit_id, 0x03, data.len() as u8];
    body.extend_from_slice(data);
    with_crc(&body)
}

/// A valid write echo frame.
pub fn write_echo(unit_id: u8, address: u16, quantity: u16) -> Vec<u8> {
    let mut body = vec![unit_id, 0x10];
    body.extend_from_slice(&address.to_be_bytes());
    body.extend_from_slice(&quantity.to_be_bytes());
    with_crc(&body)
}

/// A valid exception response frame.
pub fn exception_response(unit_id: u8, function: u8, code: u8) -> Vec<u8> {
    with_crc(&[unit_id, function | 0x80, code])
}

/// The big-endian start address of a request frame.
pub fn request_address(frame: &[u8]) -> u16 {
    u16::from_be_bytes([frame[2], frame[3]])
}

/// The big-endian register count of a request frame.
pub fn request_quantity(frame: &[u8]) -> u16 {
    u16::from_be_bytes([frame[4], frame[5]])
}
