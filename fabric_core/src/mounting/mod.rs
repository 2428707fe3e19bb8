// Copyright 2026 the Fabric Core Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Handing committed changes to the mounting layer.

mod controller;
mod coordinator;
mod telemetry;
mod transaction;

pub use controller::TelemetryController;
pub use coordinator::{MountingConfig, MountingConsumer, MountingCoordinator};
pub use telemetry::TransactionTelemetry;
pub use transaction::MountingTransaction;
