pub mod compositor;
pub mod editor_service;
pub mod error;
