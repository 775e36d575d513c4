//! Integration tests: SDK sidecars driven by the manager over real sockets.

mod helpers;

mod chain_test;
mod discovery_test;
mod shutdown_test;
