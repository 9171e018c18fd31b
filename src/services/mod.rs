//! Domain services used by the HTTP and websocket routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own the workspace rules and the broadcast lifecycle so
//! route handlers stay focused on protocol translation.

pub mod broadcast;
pub mod drop;
pub mod settings;
pub mod store;
pub mod workspace;
