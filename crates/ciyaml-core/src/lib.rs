//! Core types and definitions for CI pipeline configuration analysis.
//!
//! This crate provides the foundational types shared by the parser and the
//! validation engine. It includes:
//!
//! - **Ranges**: Line/column positions and half-open source ranges ([`range`] module)
//! - **Semantic**: The typed configuration model ([`semantic`] module)
//! - **Parameters**: The `<< parameters.x >>` substitution micro-language ([`params`] module)
//! - **Docker images**: `namespace/name:tag` decomposition ([`docker_image`] module)
//! - **Scalars**: YAML 1.1 boolean literals ([`scalar`] module)
//! - **Catalog**: Built-in step names, job types and executor whitelists ([`catalog`] module)

pub mod catalog;
pub mod docker_image;
pub mod params;
pub mod range;
pub mod scalar;
pub mod semantic;
