//! Oremus payments - payment lifecycle reconciliation service.
//!
//! Receives signed Stripe webhooks, applies idempotent status transitions
//! to payment records and their order mirrors, and dispatches best-effort
//! email notifications to payers.
//!
//! Structured as a hexagonal architecture:
//! - `domain` - pure business logic (verification, classification, state machine)
//! - `ports` - trait interfaces the application depends on
//! - `application` - use-case handlers orchestrating domain and ports
//! - `adapters` - Postgres, Resend, and HTTP implementations of the ports
//! - `config` - typed environment configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
