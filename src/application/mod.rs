pub mod alert;
pub mod blob_registry;
pub mod capability;
pub mod controller;
pub mod dto;
pub mod ports;
pub mod scheduler;
pub mod services;
