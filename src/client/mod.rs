// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Modbus clients

use std::{
    fmt, io,
    sync::{Arc, PoisonError, RwLock},
};

use async_trait::async_trait;
use bytes::Bytes;

use crate::{
    frame::{Address, Quantity, UnitId, WriteConfirmation},
    Error, Result,
};

pub mod notify;

pub mod sim;

/// A successfully read and decoded register range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterReading {
    /// Device the registers were read from.
    pub unit_id: UnitId,
    /// Start address of the read register range.
    pub address: Address,
    /// Raw register bytes as transmitted.
    pub raw: Bytes,
    /// Decimal or hex rendition of `raw`.
    pub value: String,
}

/// Transport independent asynchronous client trait.
///
/// Implemented by [`notify::NotifyClient`] for real links and by
/// [`sim::SimulatedClient`] for offline development. The two are
/// substitutable behind `Arc<dyn Client>`; callers observe no difference
/// beyond timing and the absence of wire errors in simulation.
///
/// Methods take `&self`: a client instance is shared by concurrent
/// callers and serializes its requests internally.
#[async_trait]
pub trait Client: Send + Sync + fmt::Debug {
    /// Read holding registers (0x03) and decode them into a string value.
    async fn read_holding_registers(
        &self,
        unit_id: UnitId,
        address: Address,
        quantity: Quantity,
        as_hex: bool,
    ) -> Result<RegisterReading>;

    /// Write multiple registers (0x10) from a decimal string value.
    ///
    /// Empty, zero, or non-numeric input produces a zero-length write,
    /// which is an accepted edge case rather than an error.
    async fn write_multiple_registers(
        &self,
        unit_id: UnitId,
        address: Address,
        value: &str,
    ) -> Result<WriteConfirmation>;

    /// Disconnects the client.
    ///
    /// Permanently disconnects the client by tearing down the underlying
    /// transport in a graceful manner.
    ///
    /// Dropping the client without explicitly disconnecting it
    /// beforehand should also work and free all resources. The actual
    /// behavior depends on the underlying transport.
    async fn disconnect(&self) -> io::Result<()>;
}

/// Shared cell holding the client for the currently connected peer.
///
/// A client's identity is tied to one peer. When the peer changes, the
/// old client is replaced wholesale by a freshly constructed one; no
/// pending state migrates across peers. The monitor clears the slot as
/// part of failure escalation.
#[derive(Debug, Clone, Default)]
pub struct ClientSlot {
    inner: Arc<RwLock<Option<Arc<dyn Client>>>>,
}

impl ClientSlot {
    /// Create an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the client for a newly connected peer.
    pub fn install(&self, client: Arc<dyn Client>) {
        *self
            .inner
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(client);
    }

    /// Remove the current client, e.g. after a disconnect.
    pub fn clear(&self) {
        *self
            .inner
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// The current client.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::NoClientAvailable`] while no peer is
    /// connected.
    pub fn get(&self) -> Result<Arc<dyn Client>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(Error::NoClientAvailable)
    }
}
