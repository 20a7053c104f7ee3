pub mod directory;
pub mod parking_session;
pub mod transaction;
pub mod user;

pub use directory::{ParkingDirectory, ParkingDirectoryTrait};
pub use parking_session::{ParkingSessionRepository, ParkingSessionRepositoryTrait};
pub use transaction::*;
pub use user::{UserRepository, UserRepositoryTrait};
