//! Fulfillment Hub - Order fulfillment state machine with realtime rooms.
//!
//! Orders and shipment tracks move through explicit transition tables;
//! every accepted change is persisted with a version-checked write and
//! fanned out to topic-scoped WebSocket rooms. Tracks reaching a
//! pickup-eligible status receive a short-lived six-digit pickup code.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod state;
