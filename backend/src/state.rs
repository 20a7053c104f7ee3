use std::sync::Arc;

use crate::{
    config::Config,
    db::connection::DbPool,
    repositories::{
        ParkingDirectory, ParkingDirectoryTrait, ParkingSessionRepository,
        ParkingSessionRepositoryTrait, UserRepository, UserRepositoryTrait,
    },
    services::{DirectoryService, NavigationSettings, ParkingSessionService},
};

/// Shared handler state. Built once at startup; stores are injected so tests
/// can swap in their own implementations.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub users: Arc<dyn UserRepositoryTrait>,
    pub parking_sessions: ParkingSessionService,
    pub directory: DirectoryService,
}

impl AppState {
    pub fn new(
        config: Config,
        users: Arc<dyn UserRepositoryTrait>,
        sessions: Arc<dyn ParkingSessionRepositoryTrait>,
        directory: Arc<dyn ParkingDirectoryTrait>,
    ) -> Self {
        let navigation =
            NavigationSettings::new(config.navigation_total_distance_m, config.navigation_step_m);
        Self {
            directory: DirectoryService::new(directory.clone(), sessions.clone()),
            parking_sessions: ParkingSessionService::new(sessions, directory, navigation),
            users,
            config,
        }
    }

    /// Wires the Postgres-backed stores.
    pub fn from_pool(pool: DbPool, config: Config) -> Self {
        Self::new(
            config,
            Arc::new(UserRepository::new(pool.clone())),
            Arc::new(ParkingSessionRepository::new(pool.clone())),
            Arc::new(ParkingDirectory::new(pool)),
        )
    }
}
