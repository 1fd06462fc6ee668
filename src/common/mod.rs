pub mod events;
pub mod json_guard;
