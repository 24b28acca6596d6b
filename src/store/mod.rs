pub mod ack_store;
pub mod kv_store;
