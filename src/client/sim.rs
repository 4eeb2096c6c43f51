// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Simulated client backed by an in-memory register store.

use std::{collections::HashMap, io, sync::Arc, time::Duration};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::{sync::Mutex, time::sleep};

use crate::{
    codec,
    frame::{Address, Quantity, UnitId, WriteConfirmation},
    value, Error, Result,
};

use super::{Client, RegisterReading};

/// Register values shared by the simulated clients of one session.
///
/// Owned explicitly and injected into each [`SimulatedClient`], so
/// parallel test runs never share state. All access goes through the
/// store's own lock.
#[derive(Debug, Default)]
pub struct SimulatedStore {
    registers: Mutex<HashMap<Address, String>>,
}

impl SimulatedStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a start address with an initial value.
    ///
    /// Keeps any value that is already present.
    pub async fn seed(&self, address: Address, value: impl Into<String> + Send) {
        self.registers
            .lock()
            .await
            .entry(address)
            .or_insert_with(|| value.into());
    }

    /// Drop all stored values.
    pub async fn reset(&self) {
        self.registers.lock().await.clear();
    }

    /// The value stored at `address`, if any.
    pub async fn get(&self, address: Address) -> Option<String> {
        self.registers.lock().await.get(&address).cloned()
    }

    async fn insert(&self, address: Address, value: String) {
        self.registers.lock().await.insert(address, value);
    }
}

/// Drop-in replacement for a wire client, for development and testing
/// without real hardware.
///
/// Shares the [`Client`] contract and the one-request-at-a-time
/// serialization of the transport client, but reads and writes go to the
/// injected store. Two artificial delays model request latency and
/// device processing time. Wire-level failures (CRC mismatches,
/// exception responses) never occur here.
#[derive(Debug)]
pub struct SimulatedClient {
    store: Arc<SimulatedStore>,
    exchange: Mutex<()>,
    request_delay: Duration,
    processing_delay: Duration,
}

impl SimulatedClient {
    /// Create a client over `store` with the default latency model.
    #[must_use]
    pub fn new(store: Arc<SimulatedStore>) -> Self {
        Self::with_delays(
            store,
            Duration::from_millis(100),
            Duration::from_millis(150),
        )
    }

    /// Create a client with explicit request and processing delays.
    #[must_use]
    pub fn with_delays(
        store: Arc<SimulatedStore>,
        request_delay: Duration,
        processing_delay: Duration,
    ) -> Self {
        Self {
            store,
            exchange: Mutex::new(()),
            request_delay,
            processing_delay,
        }
    }
}

#[async_trait]
impl Client for SimulatedClient {
    async fn read_holding_registers(
        &self,
        unit_id: UnitId,
        address: Address,
        _quantity: Quantity,
        as_hex: bool,
    ) -> Result<RegisterReading> {
        let _exchange = self.exchange.lock().await;
        sleep(self.request_delay).await;
        let stored = self
            .store
            .get(address)
            .await
            .ok_or(Error::NoSimulatedValue(address))?;
        sleep(self.processing_delay).await;
        // Run the stored value through the same codec as the wire client
        // so hex mode behaves identically.
        let raw = Bytes::from(value::string_to_registers(&stored));
        let value = value::registers_to_string(&raw, as_hex)?;
        Ok(RegisterReading {
            unit_id,
            address,
            raw,
            value,
        })
    }

    async fn write_multiple_registers(
        &self,
        unit_id: UnitId,
        address: Address,
        value: &str,
    ) -> Result<WriteConfirmation> {
        let _exchange = self.exchange.lock().await;
        sleep(self.request_delay).await;
        let quantity = codec::u16_len(value::string_to_registers(value).len() / 2);
        self.store.insert(address, value.trim().to_owned()).await;
        sleep(self.processing_delay).await;
        Ok(WriteConfirmation {
            unit_id,
            address,
            quantity,
        })
    }

    async fn disconnect(&self) -> io::Result<()> {
        Ok(())
    }
}
