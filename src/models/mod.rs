//! Request and Response models for the host API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

pub use requests::{LoginRequest, QueryRequest};
pub use responses::{
    ErrorResponse, HealthResponse, LoginResponse, MessageResponse, QueryResponse,
    SessionCreatedResponse, StatsResponse,
};
