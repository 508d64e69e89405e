//! Gateways over external collaborators.
//!
//! - `patient_data_service`: patient record and child documents.
//! - `auth_service`: signup/login/logout and patient lifecycle.
//! - `identity`: identity-provider seam used by the auth gateway.
//! - `gateway`: shared error and retry types.

pub mod auth_service;
pub mod gateway;
pub mod identity;
pub mod patient_data_service;
