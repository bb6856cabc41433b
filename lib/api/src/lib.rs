//! # Cropwise API
//!
//! HTTP surface for the recommendation engine.
//!
//! - `POST /predict` - JSON object payload in, ranked recommendations out
//! - `GET /health` - engine state
//! - `GET /classes` - class labels the model ranks

pub mod rest;

pub use rest::RestApi;
