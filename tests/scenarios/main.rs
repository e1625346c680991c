//! Scenario-based tests for volter pipelines

mod helpers;

mod error_routing;
mod resolver_auth;
mod short_circuit;
