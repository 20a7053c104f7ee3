pub mod billing;
pub mod directory;
pub mod navigation;
pub mod parking_session;

pub use directory::DirectoryService;
pub use navigation::NavigationSettings;
pub use parking_session::{HistoryPage, ParkingSessionService, SessionDetails};
