//! Stable release management
//!
//! This module discovers stable BlueOS releases, decides which of them may be
//! offered for the running version, and drives the version chooser through
//! installing one of them.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Gateway   │────▶│   Catalog   │◀────│  Installer  │
//! │ (feed, BOS) │     │ (cache/sync)│     │(pull/switch)│
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │                   │                   │
//!        ▼                   ▼                   ▼
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Gateways   │     │    Store    │     │   Compat    │
//! │   (HTTP)    │     │(flat files) │     │ (semver cmp)│
//! └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`catalog`]: Stable release catalog with cache-or-refresh semantics
//! - [`compat`]: Which stable versions may be offered for the running version
//! - [`installer`]: Pull, switch and verify workflow
//! - [`gateway`]: Gateway trait for the release feed and the version chooser
//! - [`gateways`]: Concrete gateway implementations
//! - [`stable`]: Stable tag detection and filtering
//! - [`store`]: Flat-file persistence for the catalog
//! - [`error`]: Error types for each layer
//! - [`types`]: Releases, install requests and outcomes

pub mod catalog;
pub mod compat;
pub mod error;
pub mod gateway;
pub mod gateways;
pub mod installer;
pub mod stable;
pub mod store;
pub mod types;
