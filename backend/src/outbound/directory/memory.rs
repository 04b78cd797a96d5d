//! In-process user directory.
//!
//! Records live in a `HashMap` behind a mutex, so each operation is atomic
//! per record. Passwords are hashed with Argon2id on the blocking pool
//! before the lock is taken.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use argon2::Argon2;
use async_trait::async_trait;
use mockable::{Clock, DefaultClock};
use password_hash::{PasswordHasher, SaltString};
use tracing::info;
use zeroize::Zeroizing;

use crate::domain::ports::{UserDirectory, UserDirectoryError};
use crate::domain::{NewUser, Role, User, UserId, UserPatch, UserRecord, Username};

/// Salt length in bytes before base64 encoding.
const SALT_LEN: usize = 16;

struct HashedSecret {
    password_hash: String,
    salt: String,
}

async fn hash_password(password: Zeroizing<String>) -> Result<HashedSecret, UserDirectoryError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::encode_b64(&rand::random::<[u8; SALT_LEN]>())
            .map_err(|err| UserDirectoryError::storage(format!("salt encoding failed: {err}")))?;
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|err| UserDirectoryError::storage(format!("password hashing failed: {err}")))?
            .to_string();
        Ok(HashedSecret {
            password_hash,
            salt: salt.as_str().to_owned(),
        })
    })
    .await
    .map_err(|err| UserDirectoryError::storage(format!("password hashing task failed: {err}")))?
}

/// [`UserDirectory`] backed by process memory.
pub struct InMemoryUserDirectory {
    users: Mutex<HashMap<UserId, UserRecord>>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryUserDirectory {
    fn default() -> Self {
        Self::new(Arc::new(DefaultClock))
    }
}

impl InMemoryUserDirectory {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
            clock,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<UserId, UserRecord>>, UserDirectoryError> {
        self.users
            .lock()
            .map_err(|_| UserDirectoryError::storage("user table lock poisoned"))
    }

    /// Create an administrator account, or promote the existing user with
    /// that username.
    pub async fn seed_admin(&self, admin: NewUser) -> Result<User, UserDirectoryError> {
        let existing = self
            .lock()?
            .values_mut()
            .find(|record| record.profile.username() == admin.username())
            .map(|record| {
                record.profile = record.profile.clone().with_role(Role::Admin);
                record.profile.clone()
            });
        if let Some(user) = existing {
            info!(user_id = %user.id(), "existing user promoted to admin");
            return Ok(user);
        }

        let record = self.create_user(admin).await?;
        let id = record.profile.id().clone();
        let mut users = self.lock()?;
        let stored = users
            .get_mut(&id)
            .ok_or_else(|| UserDirectoryError::not_found(id.to_string()))?;
        stored.profile = stored.profile.clone().with_role(Role::Admin);
        info!(user_id = %id, "admin user seeded");
        Ok(stored.profile.clone())
    }
}

fn ensure_username_free(
    users: &HashMap<UserId, UserRecord>,
    username: &Username,
    except: Option<&UserId>,
) -> Result<(), UserDirectoryError> {
    let taken = users
        .values()
        .any(|record| record.profile.username() == username && Some(record.profile.id()) != except);
    if taken {
        return Err(UserDirectoryError::username_taken(username.as_ref()));
    }
    Ok(())
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn create_user(&self, new_user: NewUser) -> Result<UserRecord, UserDirectoryError> {
        ensure_username_free(&*self.lock()?, new_user.username(), None)?;
        let secret = hash_password(Zeroizing::new(new_user.password().to_owned())).await?;

        let profile = User::new(
            UserId::random(),
            new_user.username().clone(),
            Role::User,
            self.clock.utc(),
        )
        .with_email(new_user.email().map(str::to_owned))
        .with_name(new_user.name().map(str::to_owned));
        let record = UserRecord {
            profile,
            password_hash: secret.password_hash,
            salt: secret.salt,
        };

        let mut users = self.lock()?;
        // Re-check: another create may have claimed the name while hashing.
        ensure_username_free(&users, new_user.username(), None)?;
        users.insert(record.profile.id().clone(), record.clone());
        Ok(record)
    }

    async fn get_all_users(&self) -> Result<Vec<UserRecord>, UserDirectoryError> {
        let mut records: Vec<UserRecord> = self.lock()?.values().cloned().collect();
        records.sort_by(|a, b| {
            a.profile
                .created_at()
                .cmp(&b.profile.created_at())
                .then_with(|| a.profile.username().as_ref().cmp(b.profile.username().as_ref()))
        });
        Ok(records)
    }

    async fn get_user(&self, id: &UserId) -> Result<UserRecord, UserDirectoryError> {
        self.lock()?
            .get(id)
            .cloned()
            .ok_or_else(|| UserDirectoryError::not_found(id.to_string()))
    }

    async fn update_user(
        &self,
        id: &UserId,
        mut patch: UserPatch,
    ) -> Result<UserRecord, UserDirectoryError> {
        {
            let users = self.lock()?;
            if !users.contains_key(id) {
                return Err(UserDirectoryError::not_found(id.to_string()));
            }
            if let Some(username) = &patch.username {
                ensure_username_free(&users, username, Some(id))?;
            }
        }
        let secret = match patch.password.take() {
            Some(password) => Some(hash_password(password).await?),
            None => None,
        };

        let mut users = self.lock()?;
        if let Some(username) = &patch.username {
            ensure_username_free(&users, username, Some(id))?;
        }
        let record = users
            .get_mut(id)
            .ok_or_else(|| UserDirectoryError::not_found(id.to_string()))?;
        record.profile.apply_patch(&patch, self.clock.utc());
        if let Some(secret) = secret {
            record.password_hash = secret.password_hash;
            record.salt = secret.salt;
        }
        Ok(record.clone())
    }

    async fn delete_user(&self, id: &UserId) -> Result<(), UserDirectoryError> {
        self.lock()?
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| UserDirectoryError::not_found(id.to_string()))
    }
}
