// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Periodic link-health polling with escalating failure handling.
//!
//! A [`LinkMonitor`] reads one designated register on a timer. Failures
//! shorten the poll interval; once enough failures accumulate, the
//! monitor disconnects the peer, clears the shared client slot, and
//! signals the driving layer to enter its recovery flow. The hand-off
//! fires exactly once per failure episode.

use std::time::Duration;

use tokio::{sync::mpsc, time::sleep};

use crate::{
    client::ClientSlot,
    frame::{Address, Quantity, UnitId},
    Error,
};

/// Parameters for one monitored register.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Device the monitored register lives on.
    pub unit_id: UnitId,
    /// Address of the monitored register.
    pub address: Address,
    /// Number of registers to read per poll.
    pub quantity: Quantity,
    /// Interval between polls while the link is healthy.
    pub poll_interval: Duration,
    /// Shortened interval once a poll has failed.
    pub retry_interval: Duration,
    /// Number of consecutive failures that triggers recovery.
    pub failure_threshold: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            unit_id: 1,
            address: 0,
            quantity: 1,
            poll_interval: Duration::from_secs(10),
            retry_interval: Duration::from_secs(1),
            failure_threshold: 3,
        }
    }
}

/// Outcome of a poll, delivered to the driving layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorEvent {
    /// The register was read successfully.
    Reading {
        /// Decoded register value.
        value: String,
    },

    /// The poll failed.
    ReadFailed {
        /// Human readable failure classification, see [`classify`].
        reason: String,
    },

    /// The failure threshold was reached: the peer has been disconnected
    /// and the driver should transition to its recovery flow.
    RecoveryRequired,
}

/// Polls one register through the shared client slot and escalates after
/// repeated failures.
///
/// The failure counter and the escalation latch are owned by this
/// instance; one monitor drives one register.
#[derive(Debug)]
pub struct LinkMonitor {
    slot: ClientSlot,
    config: MonitorConfig,
    failures: u32,
    escalated: bool,
    events: mpsc::UnboundedSender<MonitorEvent>,
}

impl LinkMonitor {
    /// Create a monitor and the receiving end of its event stream.
    #[must_use]
    pub fn new(
        slot: ClientSlot,
        config: MonitorConfig,
    ) -> (Self, mpsc::UnboundedReceiver<MonitorEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let monitor = Self {
            slot,
            config,
            failures: 0,
            escalated: false,
            events,
        };
        (monitor, receiver)
    }

    /// Number of consecutive failed polls.
    #[must_use]
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Whether the recovery hand-off has fired for the current episode.
    #[must_use]
    pub fn has_escalated(&self) -> bool {
        self.escalated
    }

    /// Forget the failure history, e.g. after connecting to a new peer.
    ///
    /// Re-arms the escalation latch.
    pub fn restart(&mut self) {
        self.failures = 0;
        self.escalated = false;
    }

    /// Perform one poll and return the delay until the next one.
    pub async fn poll_once(&mut self) -> Duration {
        let outcome = self.read_monitored().await;
        match outcome {
            Ok(reading) if !reading.is_empty() => {
                self.failures = 0;
                self.emit(MonitorEvent::Reading { value: reading });
                self.config.poll_interval
            }
            Ok(_) => self.fail("no data".to_owned()).await,
            Err(err) => self.fail(classify(&err)).await,
        }
    }

    /// Timer loop around [`Self::poll_once`].
    ///
    /// Ends once the event receiver has been dropped.
    pub async fn run(mut self) {
        loop {
            let delay = self.poll_once().await;
            if self.events.is_closed() {
                break;
            }
            sleep(delay).await;
        }
    }

    async fn read_monitored(&self) -> crate::Result<String> {
        let client = self.slot.get()?;
        let reading = client
            .read_holding_registers(
                self.config.unit_id,
                self.config.address,
                self.config.quantity,
                false,
            )
            .await?;
        if reading.raw.is_empty() {
            // The "no data" sentinel: the device answered, but with an
            // empty payload.
            return Ok(String::new());
        }
        Ok(reading.value)
    }

    async fn fail(&mut self, reason: String) -> Duration {
        self.failures += 1;
        log::debug!(
            "poll of register 0x{:04X} failed ({}/{}): {reason}",
            self.config.address,
            self.failures,
            self.config.failure_threshold
        );
        self.emit(MonitorEvent::ReadFailed { reason });
        if self.failures >= self.config.failure_threshold && !self.escalated {
            self.escalate().await;
        }
        self.config.retry_interval
    }

    async fn escalate(&mut self) {
        self.escalated = true;
        if let Ok(client) = self.slot.get() {
            if let Err(err) = client.disconnect().await {
                log::warn!("disconnect during recovery failed: {err}");
            }
        }
        self.slot.clear();
        self.emit(MonitorEvent::RecoveryRequired);
    }

    fn emit(&self, event: MonitorEvent) {
        if self.events.send(event).is_err() {
            log::debug!("monitor event dropped: receiver gone");
        }
    }
}

/// Human readable classification of a failed operation.
///
/// Produces the messages the driving layer shows to users; the error
/// kinds themselves stay available for programmatic handling.
#[must_use]
pub fn classify(error: &Error) -> String {
    match error {
        Error::Timeout => "device not responding".to_owned(),
        Error::Exception(exception) => format!("device error: {exception}"),
        Error::CrcMismatch { .. } => "communication error (corrupted data)".to_owned(),
        Error::WriteConfirmationMismatch { .. } => "write operation failed".to_owned(),
        _ => "communication failed".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use crate::frame::{ExceptionCode, ExceptionResponse, WriteConfirmation};

    use super::*;

    #[test]
    fn classification_messages() {
        assert_eq!(classify(&Error::Timeout), "device not responding");
        assert_eq!(
            classify(&Error::Exception(ExceptionResponse {
                function: 3,
                exception: ExceptionCode::IllegalDataAddress,
            })),
            "device error: Modbus function 3: Illegal data address"
        );
        assert_eq!(
            classify(&Error::CrcMismatch {
                expected: 0x1234,
                received: 0x4321,
            }),
            "communication error (corrupted data)"
        );
        let confirmation = WriteConfirmation {
            unit_id: 1,
            address: 0,
            quantity: 1,
        };
        assert_eq!(
            classify(&Error::WriteConfirmationMismatch {
                request: confirmation,
                response: WriteConfirmation {
                    quantity: 2,
                    ..confirmation
                },
            }),
            "write operation failed"
        );
        assert_eq!(
            classify(&Error::Send(io::Error::from(io::ErrorKind::BrokenPipe))),
            "communication failed"
        );
        assert_eq!(classify(&Error::NoClientAvailable), "communication failed");
    }
}
