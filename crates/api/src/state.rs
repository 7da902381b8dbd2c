use std::sync::Arc;

use crate::{
    config::Config,
    engine::{LeaderboardEngine, OtpGuard, RankPresenter, SessionTracker},
    repos::Repos,
    services::{NotificationSender, UserDirectory},
    stores::Stores,
};

#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Database repositories.
    pub repos: Repos,
    /// Ephemeral stores (Redis).
    pub stores: Stores,
    /// Player notifications (email).
    pub email: Arc<dyn NotificationSender>,
    /// Player display lookup.
    pub directory: Arc<dyn UserDirectory>,
    /// Ranking boards.
    pub leaderboard: LeaderboardEngine,
    /// Login codes.
    pub otp: OtpGuard,
    /// Play sessions.
    pub sessions: SessionTracker,
    /// Leaderboard display entries.
    pub presenter: RankPresenter,
}

impl AppState {
    /// Wire the engine on top of the given stores and collaborators.
    pub fn new(
        config: Config,
        repos: Repos,
        stores: Stores,
        email: Arc<dyn NotificationSender>,
        directory: Arc<dyn UserDirectory>,
    ) -> Self {
        let leaderboard = LeaderboardEngine::new(stores.boards.clone());
        let otp = OtpGuard::new(
            stores.otp.clone(),
            email.clone(),
            config.otp_length,
            config.otp_ttl_secs,
        );
        let sessions = SessionTracker::new(
            stores.sessions.clone(),
            stores.history.clone(),
            repos.matches.clone(),
        );
        let presenter = RankPresenter::new(directory.clone());

        Self {
            config,
            repos,
            stores,
            email,
            directory,
            leaderboard,
            otp,
            sessions,
            presenter,
        }
    }
}
