// SPDX-FileCopyrightText: Copyright (c) 2017-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types and traits

///////////////////////////////////////////////////////////////////
/// Modules
///////////////////////////////////////////////////////////////////
pub use crate::client;

///////////////////////////////////////////////////////////////////
/// Types
///////////////////////////////////////////////////////////////////
pub use crate::client::notify::NotifyClient;
pub use crate::client::sim::{SimulatedClient, SimulatedStore};
pub use crate::client::{ClientSlot, RegisterReading};
pub use crate::monitor::{LinkMonitor, MonitorConfig, MonitorEvent};
pub use crate::{EndpointId, LinkConfig, Subscription};
pub use crate::{Error, Result};
pub use crate::{Request, Response, WriteConfirmation};

///////////////////////////////////////////////////////////////////
/// Traits
///////////////////////////////////////////////////////////////////
pub use crate::client::Client;
pub use crate::NotificationTransport;
