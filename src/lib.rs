/*!
# calcweb

A calculator front end and its companion HTTP service, built in Rust.

## Overview

The calculator collects operands, sends one request per calculation to a
stateless backend, renders the result and keeps a bounded history of what was
computed. Results can be chained: leaving out the first operand continues from
the previous result.

## Architecture

### Controller
- **input**: operand and matrix parsing, number formatting
- **session**: the continuation state machine (fresh or chained) and dispatch
- **history**: newest-first log with a fixed capacity
- **modes**: calculation modes, requests and the response envelope
- **command**: the terminal command language

### Transport
- **client**: the `Backend` seam and its reqwest implementation
- **app**: axum service answering `/add` and `/api/add`, serving `/static`

### Persistence
- **saving**: gzip-compressed bincode snapshots of the history

## REST API Endpoints

- `GET /api/add?num1=..&num2=..` - Integer addition
- `POST /api/calculate` - Arithmetic on two operands
- `POST /api/calculate/complex` - Expression evaluation
- `POST /api/calculate/scientific` - Single-argument functions
- `POST /api/calculate/matrix` - Matrix operations

Only `/api/add` is served by this crate; the other endpoints belong to an
external backend and are reached through [`client::HttpBackend`].
*/

pub mod client;
pub mod command;
pub mod config;
pub mod error;
pub mod history;
pub mod input;
pub mod modes;
pub mod saving;
pub mod session;

#[cfg(feature = "web")]
pub mod app;

/// Re-export the pieces most callers need
pub use client::Backend;
#[cfg(feature = "web")]
pub use client::HttpBackend;
pub use config::Config;
pub use error::CalcError;
pub use history::{History, HistoryEntry};
pub use modes::{CalcOutcome, CalcRequest, MatrixOperation, Mode, Operation, ScientificFunction};
pub use session::{Calculator, Continuation};
