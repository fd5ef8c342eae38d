//! Account signup and login over the user collection.
//!
//! Passwords are stored and compared as plain text.

use animalandia_common::user::{
    next_user_id, normalize_email, LoginRequest, LoginUser, PublicUser, SignupRequest, User,
};
use chrono::Utc;
use tracing::info;

use crate::error::{ServiceError, ServiceResult};
use crate::store::CollectionStore;
use crate::write_gate::{WriteGate, WriteMode};

/// The distinguished administrator account created at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl Default for AdminSeed {
    fn default() -> Self {
        Self {
            name: "Admin".to_string(),
            email: "admin@animalandia.com".to_string(),
            password: "Admin123".to_string(),
        }
    }
}

pub struct UserService {
    store: Box<dyn CollectionStore<User>>,
    gate: WriteGate,
    admin_email: String,
}

impl UserService {
    pub fn new(store: Box<dyn CollectionStore<User>>, mode: WriteMode, admin: &AdminSeed) -> Self {
        Self {
            store,
            gate: WriteGate::new(mode),
            admin_email: normalize_email(&admin.email),
        }
    }

    /// Insert the admin record unless an account with its email exists.
    /// Returns whether a record was written.
    pub fn ensure_admin(&self, admin: &AdminSeed) -> ServiceResult<bool> {
        let email = normalize_email(&admin.email);
        let _guard = self.gate.enter();
        let mut users = self.store.try_load()?;
        if users.iter().any(|u| normalize_email(&u.email) == email) {
            return Ok(false);
        }
        users.push(User {
            id: None,
            name: admin.name.clone(),
            email: email.clone(),
            password: admin.password.clone(),
        });
        self.store.save(&users)?;
        info!(%email, "Seeded admin account");
        Ok(true)
    }

    pub fn signup(&self, req: SignupRequest) -> ServiceResult<PublicUser> {
        let name = req.name.map(|n| n.trim().to_string()).unwrap_or_default();
        let email = req.email.as_deref().map(normalize_email).unwrap_or_default();
        let password = req.password.unwrap_or_default();
        if name.is_empty() || email.is_empty() || password.is_empty() {
            return Err(ServiceError::Validation(
                "Name, email and password are required".to_string(),
            ));
        }

        let _guard = self.gate.enter();
        let mut users = self.store.try_load()?;
        if users.iter().any(|u| normalize_email(&u.email) == email) {
            return Err(ServiceError::DuplicateEmail);
        }
        let user = User {
            id: Some(next_user_id(&users, Utc::now())),
            name,
            email,
            password,
        };
        users.push(user.clone());
        self.store.save(&users)?;

        info!(email = %user.email, "Registered user");
        Ok(PublicUser::from(&user))
    }

    pub fn login(&self, req: LoginRequest) -> ServiceResult<LoginUser> {
        let email = req.email.as_deref().map(normalize_email).unwrap_or_default();
        let password = req.password.unwrap_or_default();
        if email.is_empty() || password.is_empty() {
            return Err(ServiceError::Validation(
                "Email and password are required".to_string(),
            ));
        }

        let user = self
            .store
            .load()
            .into_iter()
            .find(|u| normalize_email(&u.email) == email && u.password == password)
            .ok_or(ServiceError::InvalidCredentials)?;

        Ok(LoginUser {
            is_admin: email == self.admin_email,
            name: user.name,
            email,
        })
    }

    /// Number of stored accounts, reading leniently.
    pub fn count(&self) -> usize {
        self.store.load().len()
    }
}
