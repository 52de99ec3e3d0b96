pub mod event;
pub mod game;
pub mod task;
pub mod team;
pub mod venue;

// Re-export all models for easy importing
pub use event::*;
pub use game::*;
pub use task::*;
pub use team::*;
pub use venue::*;
