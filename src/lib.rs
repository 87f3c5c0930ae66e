//! Discovery and normalization client for hierarchical asset-management web
//! APIs.
//!
//! A run resolves a reachable API endpoint, walks server, database and
//! element path to a parent node, keeps the children matching a template,
//! maps canonical attribute keys to the site's display names and aggregates
//! the result into one group record. Any failure on that path yields
//! synthetic data of the same shape, tagged with its provenance and cause.

pub mod client;
pub mod collector;
pub mod config;
pub mod error;
pub mod formatter;
pub mod synthetic;

pub use client::{ApiSession, HttpTransport, Transport};
pub use collector::{Collector, GroupRecord, LoadResult, Provenance, UnitRecord};
pub use config::{AppConfig, AttributeMapping, ServerConfig, Settings};
pub use error::{DiscoveryError, TransportError};
