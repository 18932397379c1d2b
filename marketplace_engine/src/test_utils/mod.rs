//! Helpers for integration tests: throwaway databases and fixture data.
pub mod prepare_env;
pub mod fixtures;
