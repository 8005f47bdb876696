//! Account flows: signup, login, password reset and password change.
//!
//! Every flow that ends with a usable session returns an [`AuthResponse`]
//! carrying a freshly issued token.

use std::sync::Arc;

use chrono::Duration;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::{CanigoError, ErrorKind};
use crate::password::{digest_reset_token, PasswordHasher, ResetToken};
use crate::ports::{Clock, Email, EmailSender, Stores};
use crate::proto::{
    AuthResponse, CreateUserRequest, LoginRequest, ResetPasswordRequest, SignupRequest,
    UpdatePasswordRequest,
};
use crate::token::TokenService;
use crate::types::{Role, User};

pub type Result<T> = std::result::Result<T, CanigoError>;

/// Path the emailed reset link points at; the raw token is appended.
pub const RESET_PATH: &str = "/api/v1/users/reset-password";

pub struct AccountService {
    stores: Stores,
    tokens: Arc<TokenService>,
    hasher: PasswordHasher,
    mailer: Arc<dyn EmailSender>,
    clock: Arc<dyn Clock>,
    reset_ttl: Duration,
    public_url: String,
}

impl AccountService {
    pub fn new(
        config: &AuthConfig,
        stores: Stores,
        tokens: Arc<TokenService>,
        mailer: Arc<dyn EmailSender>,
        clock: Arc<dyn Clock>,
        public_url: impl Into<String>,
    ) -> Self {
        Self {
            stores,
            tokens,
            hasher: PasswordHasher::new(config.bcrypt_cost),
            mailer,
            clock,
            reset_ttl: Duration::from_std(config.reset_token_ttl)
                .unwrap_or_else(|_| Duration::minutes(10)),
            public_url: public_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Self-service registration. The new account always gets the `user`
    /// role.
    pub async fn signup(&self, req: SignupRequest) -> Result<AuthResponse> {
        let user = self.build_user(req, Role::User).await?;
        self.stores.users.insert(&user).await?;
        tracing::info!(user_id = %user.id, "account created");
        self.session(user)
    }

    /// Administrative creation; no session is issued.
    pub async fn create_user(&self, req: CreateUserRequest) -> Result<User> {
        let role = req.role.unwrap_or_default();
        let user = self.build_user(req.account, role).await?;
        self.stores.users.insert(&user).await?;
        tracing::info!(user_id = %user.id, %role, "account created by admin");
        Ok(user)
    }

    pub async fn login(&self, req: LoginRequest) -> Result<AuthResponse> {
        let (Some(email), Some(password)) = (req.email, req.password) else {
            return Err(CanigoError::invalid_input("Email and password are required"));
        };

        let wrong = || CanigoError::unauthenticated("Email or password is incorrect");
        let user = self
            .stores
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(wrong)?;
        if !self.hasher.verify(&password, &user.password_hash).await? {
            return Err(wrong());
        }
        self.session(user)
    }

    /// Store a reset digest on the account and email the raw token. When
    /// the email cannot be sent the digest is cleared again.
    pub async fn forgot_password(&self, email: &str) -> Result<()> {
        let mut user = self
            .stores
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(|| CanigoError::not_found("No user found"))?;

        let expires = self
            .clock
            .now()
            .checked_add_signed(self.reset_ttl)
            .ok_or_else(|| CanigoError::new(ErrorKind::Internal, "reset expiry out of range"))?;
        let token = ResetToken::generate();
        user.password_reset_token = Some(token.digest);
        user.password_reset_expires = Some(expires);
        self.stores.users.update(&user).await?;

        let link = format!("{}{RESET_PATH}/{}", self.public_url, token.raw);
        let email = Email {
            to: user.email.clone(),
            subject: format!(
                "Your password reset link (valid for {} min)",
                self.reset_ttl.num_minutes()
            ),
            body: format!(
                "Forgot your password? Follow this link to choose a new one: {link}\n\
                 If you did not ask for a reset, ignore this email."
            ),
        };

        if let Err(err) = self.mailer.send(email).await {
            tracing::warn!(user_id = %user.id, error = %err, "reset email not delivered");
            user.password_reset_token = None;
            user.password_reset_expires = None;
            self.stores.users.update(&user).await?;
            return Err(
                CanigoError::delivery("Could not send the email. Try again later").with_cause(err),
            );
        }
        Ok(())
    }

    pub async fn reset_password(&self, raw_token: &str, req: ResetPasswordRequest) -> Result<AuthResponse> {
        req.validate()?;
        let now = self.clock.now();
        let mut user = self
            .stores
            .users
            .find_by_reset_token(&digest_reset_token(raw_token), now)
            .await?
            .ok_or_else(|| {
                CanigoError::invalid_input("Reset link is invalid or has expired. Ask for a new one")
            })?;

        user.password_reset_token = None;
        user.password_reset_expires = None;
        self.set_password(&mut user, &req.password).await?;
        self.stores.users.update(&user).await?;
        tracing::info!(user_id = %user.id, "password reset");
        self.session(user)
    }

    /// Change the password of an already authenticated user. Tokens issued
    /// before the change stop working.
    pub async fn update_password(&self, user: &User, req: UpdatePasswordRequest) -> Result<AuthResponse> {
        req.validate()?;
        let mut user = self
            .stores
            .users
            .find_by_id(user.id)
            .await?
            .ok_or_else(|| CanigoError::unauthenticated("You are not logged in"))?;

        if !self
            .hasher
            .verify(&req.current_password, &user.password_hash)
            .await?
        {
            return Err(CanigoError::unauthenticated("Wrong password"));
        }
        self.set_password(&mut user, &req.new_password).await?;
        self.stores.users.update(&user).await?;
        tracing::info!(user_id = %user.id, "password updated");
        self.session(user)
    }

    // Stamped one second in the past so the token issued right after the
    // change is not itself considered stale.
    async fn set_password(&self, user: &mut User, password: &str) -> Result<()> {
        user.password_hash = self.hasher.hash(password).await?;
        user.password_changed_at = Some(self.clock.now() - Duration::seconds(1));
        Ok(())
    }

    async fn build_user(&self, req: SignupRequest, role: Role) -> Result<User> {
        req.validate()?;
        if self
            .stores
            .pass_levels
            .find_by_id(req.pass_level_id)
            .await?
            .is_none()
        {
            return Err(CanigoError::invalid_input(format!(
                "pass level {} does not exist",
                req.pass_level_id
            )));
        }

        Ok(User {
            id: Uuid::new_v4(),
            first_name: req.first_name,
            last_name: req.last_name,
            age: req.age,
            phone_number: req.phone_number,
            address: req.address,
            email: req.email,
            password_hash: self.hasher.hash(&req.password).await?,
            role,
            pass_level_id: req.pass_level_id,
            password_changed_at: None,
            password_reset_token: None,
            password_reset_expires: None,
        })
    }

    fn session(&self, user: User) -> Result<AuthResponse> {
        let issued = self.tokens.issue(user.id)?;
        Ok(AuthResponse {
            token: issued.token,
            expires_at: issued.expires_at,
            user,
        })
    }
}
