use tracing::info;

use crate::auth::application::services::SessionContext;

/// Ends the session locally. The backend keeps no server-side session, so
/// there is nothing to revoke remotely.
pub trait ILogoutUseCase: Send + Sync {
    fn execute(&self);
}

pub struct LogoutUseCase {
    session: SessionContext,
}

impl LogoutUseCase {
    pub fn new(session: SessionContext) -> Self {
        Self { session }
    }
}

impl ILogoutUseCase for LogoutUseCase {
    fn execute(&self) {
        if let Some(user_id) = self.session.user_id() {
            info!("User {} logging out", user_id);
        }
        self.session.teardown("user logged out");
    }
}
