pub mod event;
pub mod game;
pub mod participation;
pub mod quizmaster;
pub mod task;
pub mod team;
pub mod venue;

// Re-export all repositories for easy importing
pub use event::EventRepository;
pub use game::GameRepository;
pub use participation::ParticipationRepository;
pub use quizmaster::QuizmasterRepository;
pub use task::TaskRepository;
pub use team::TeamRepository;
pub use venue::VenueRepository;
