pub mod field_key;
pub mod object_id;
