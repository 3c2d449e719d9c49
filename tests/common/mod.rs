//! Shared helpers for the API integration tests.

#![allow(dead_code)]

use builtio::client::Client;
use builtio::config::Config;
use wiremock::MockServer;

pub const API_KEY: &str = "blt_test_api_key";
pub const MASTER_KEY: &str = "blt_test_master_key";

/// Configuration pointing at the mock server.
pub fn config_for(server: &MockServer) -> Config {
    Config {
        host: server.uri(),
        ..Config::with_api_key(API_KEY)
    }
}

/// A client talking to the mock server.
pub fn client_for(server: &MockServer) -> Client {
    Client::new(config_for(server)).unwrap()
}

/// A client with the master key, talking to the mock server.
pub fn master_client_for(server: &MockServer) -> Client {
    Client::new(Config {
        master_key: Some(MASTER_KEY.to_string()),
        ..config_for(server)
    })
    .unwrap()
}

/// A client resuming the session of `authtoken`.
pub fn session_client_for(server: &MockServer, authtoken: &str) -> Client {
    Client::new(Config {
        authtoken: Some(authtoken.to_string()),
        ..config_for(server)
    })
    .unwrap()
}
