pub mod benning;
pub mod heartbeat;
