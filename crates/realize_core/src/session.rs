use crate::error::AppError;
use crate::identity::IdentityProvider;
use crate::model::AuthenticatedUser;
use crate::storage::{Codec, JsonCodec, SharedStore, USER_KEY};

/// The signed-in user for this process.
///
/// Created once at startup from the stored profile, replaced on sign-in and
/// cleared on sign-out. Callers receive it explicitly; there is no global.
pub struct Session {
    store: SharedStore,
    user: Option<AuthenticatedUser>,
}

impl Session {
    pub fn load(store: SharedStore) -> Self {
        let user = match store.get(USER_KEY) {
            Ok(Some(blob)) => match JsonCodec::<AuthenticatedUser>::new().decode(&blob) {
                Ok(user) => Some(user),
                Err(err) => {
                    tracing::warn!(key = USER_KEY, error = %err, "discarding unreadable stored user");
                    if let Err(err) = store.remove(USER_KEY) {
                        tracing::warn!(key = USER_KEY, error = %err, "failed to remove stored user");
                    }
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                tracing::warn!(key = USER_KEY, error = %err, "failed to read stored user");
                None
            }
        };

        Self { store, user }
    }

    pub fn user(&self) -> Option<&AuthenticatedUser> {
        self.user.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn require_user(&self) -> Result<&AuthenticatedUser, AppError> {
        self.user
            .as_ref()
            .ok_or_else(|| AppError::unauthorized("not signed in"))
    }

    pub async fn sign_in<P: IdentityProvider>(
        &mut self,
        provider: &P,
    ) -> Result<&AuthenticatedUser, AppError> {
        let user = provider.begin_sign_in().await?;
        let blob = JsonCodec::<AuthenticatedUser>::new().encode(&user)?;
        self.store.set(USER_KEY, &blob)?;
        tracing::info!(email = %user.email, "signed in");
        Ok(self.user.insert(user))
    }

    pub fn sign_out<P: IdentityProvider>(&mut self, provider: &P) -> Result<(), AppError> {
        self.user = None;
        self.store.remove(USER_KEY)?;
        provider.end_session();
        Ok(())
    }
}
