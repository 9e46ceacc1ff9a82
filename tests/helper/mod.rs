#![allow(dead_code)]

pub mod gateway;
pub mod http;

pub use gateway::FakeGateway;
pub use http::{create_test_state, get_json};
