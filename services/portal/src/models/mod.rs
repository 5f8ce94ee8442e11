//! Portal data models

pub mod account;
pub mod session;
pub mod student;

// Re-export for convenience
pub use account::{Account, Identity, StudentProfile};
pub use session::AuthenticatedSession;
pub use student::{
    LearningStyle, NewStudent, PersonalityType, ProfileChanges, ProfileUpdate,
    RegistrationRequest,
};
