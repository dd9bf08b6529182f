//! Beta signup relay: accepts an email (plus a honeypot field) from a landing
//! page form, and posts a notification to a team chat webhook. Nothing is
//! stored.
//!
//! API endpoints:
//! - `POST /api/signup`
//! - `OPTIONS /api/signup` (CORS preflight)
//! - `GET /health_check`

pub mod configuration;
pub mod domain;
pub mod notification;
pub mod routes;
pub mod startup;
pub mod telemetry;
pub mod webhook_client;
