use crate::auth::password::{self, PLACEHOLDER_HASH};
use crate::auth::policy::{AccessPolicy, Actor};
use crate::auth::token::TokenService;
use crate::config::AuthConfig;
use crate::db::models::{NewUser, User};
use crate::db::operations::DbOperations;
use crate::error::{AppError, AuthError, DatabaseError};
use tracing::{info, warn};

/// Reserved identity every request runs as when authentication is disabled.
pub const ANONYMOUS_EMAIL: &str = "anonymous@localhost";
/// Token handed out by the auth endpoints when authentication is disabled.
pub const PLACEHOLDER_TOKEN: &str = "auth-disabled";

enum AuthMode {
    Required(TokenService),
    Disabled { anonymous_id: i64 },
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: &'static str,
}

#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub is_agent: bool,
}

pub struct AuthService {
    db: DbOperations,
    mode: AuthMode,
    policy: AccessPolicy,
    bcrypt_cost: u32,
    allow_agent_registration: bool,
}

impl AuthService {
    /// Builds the service for the configured mode. With auth required a missing
    /// signing secret is an error; with auth disabled the anonymous user row is
    /// created if needed.
    pub async fn new(db: DbOperations, config: &AuthConfig) -> Result<Self, AppError> {
        let mode = if config.required {
            AuthMode::Required(TokenService::new(config)?)
        } else {
            let (anonymous, _) = db
                .get_or_create_user(&NewUser {
                    email: ANONYMOUS_EMAIL.to_string(),
                    hashed_password: PLACEHOLDER_HASH.to_string(),
                    full_name: Some("Anonymous".to_string()),
                    is_agent: true,
                })
                .await?;
            warn!("Authentication is disabled; all requests run as {}", ANONYMOUS_EMAIL);
            AuthMode::Disabled {
                anonymous_id: anonymous.id,
            }
        };

        Ok(Self {
            db,
            mode,
            policy: AccessPolicy::new(config.required),
            bcrypt_cost: config.bcrypt_cost,
            allow_agent_registration: config.agent_registration_allowed(),
        })
    }

    pub fn auth_required(&self) -> bool {
        matches!(self.mode, AuthMode::Required(_))
    }

    pub fn policy(&self) -> AccessPolicy {
        self.policy
    }

    /// Hashes on the blocking pool so the calling worker keeps serving requests.
    pub async fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let password = password.to_owned();
        let cost = self.bcrypt_cost;
        tokio::task::spawn_blocking(move || password::hash_password(&password, cost))
            .await
            .map_err(|e| AppError::InternalError(format!("Password hashing task failed: {}", e)))?
    }

    async fn verify_password(&self, plain: &str, hashed: &str) -> Result<bool, AppError> {
        let plain = plain.to_owned();
        let hashed = hashed.to_owned();
        tokio::task::spawn_blocking(move || password::verify_password(&plain, &hashed))
            .await
            .map_err(|e| AppError::InternalError(format!("Password check task failed: {}", e)))
    }

    /// Creates a user. Returns the user and whether it was newly created.
    ///
    /// With auth required a second registration of the same email fails as a
    /// duplicate; with auth disabled it returns the existing user.
    pub async fn register(&self, registration: Registration) -> Result<(User, bool), AppError> {
        let email = normalize_email(&registration.email)?;

        if registration.is_agent && !self.allow_agent_registration {
            return Err(AppError::forbidden("Agent self-registration is disabled"));
        }

        match &self.mode {
            AuthMode::Required(_) => {
                let password = registration
                    .password
                    .as_deref()
                    .ok_or_else(|| AppError::validation("Password required"))?;

                if self.db.get_user_by_email(&email).await?.is_some() {
                    return Err(DatabaseError::Duplicate.into());
                }

                let hashed_password = self.hash_password(password).await?;
                let user = self
                    .db
                    .create_user(&NewUser {
                        email,
                        hashed_password,
                        full_name: registration.full_name,
                        is_agent: registration.is_agent,
                    })
                    .await?;
                info!("Registered user {} (agent: {})", user.id, user.is_agent);
                Ok((user, true))
            }
            AuthMode::Disabled { .. } => {
                self.db
                    .get_or_create_user(&NewUser {
                        email,
                        hashed_password: PLACEHOLDER_HASH.to_string(),
                        full_name: registration.full_name,
                        is_agent: registration.is_agent,
                    })
                    .await
            }
        }
    }

    /// Checks credentials and returns the user they belong to.
    ///
    /// With auth disabled the password is ignored and unknown emails are
    /// registered as customers on the fly.
    pub async fn authenticate(&self, email: &str, password: Option<&str>) -> Result<User, AppError> {
        let email = normalize_email(email)?;

        match &self.mode {
            AuthMode::Required(_) => {
                let user = self
                    .db
                    .get_user_by_email(&email)
                    .await?
                    .ok_or(AuthError::InvalidCredentials)?;

                let password = password.unwrap_or_default();
                if !self.verify_password(password, &user.hashed_password).await? {
                    return Err(AuthError::InvalidCredentials.into());
                }
                if !user.is_active {
                    return Err(AuthError::InactiveUser.into());
                }
                Ok(user)
            }
            AuthMode::Disabled { .. } => {
                let (user, created) = self
                    .db
                    .get_or_create_user(&NewUser {
                        email,
                        hashed_password: PLACEHOLDER_HASH.to_string(),
                        full_name: None,
                        is_agent: false,
                    })
                    .await?;
                if created {
                    info!("Created user {} on login", user.id);
                }
                Ok(user)
            }
        }
    }

    pub fn issue_token(&self, user: &User) -> Result<IssuedToken, AppError> {
        match &self.mode {
            AuthMode::Required(tokens) => Ok(IssuedToken {
                access_token: tokens.issue_for(user)?,
                token_type: "bearer",
            }),
            AuthMode::Disabled { .. } => Ok(IssuedToken {
                access_token: PLACEHOLDER_TOKEN.to_string(),
                token_type: "none",
            }),
        }
    }

    /// Resolves the caller from the raw `Authorization` header value.
    pub async fn resolve_actor(&self, authorization: Option<&str>) -> Result<Actor, AppError> {
        let tokens = match &self.mode {
            AuthMode::Required(tokens) => tokens,
            AuthMode::Disabled { anonymous_id } => {
                return Ok(Actor::Anonymous { id: *anonymous_id })
            }
        };

        let token = bearer_token(authorization.ok_or(AuthError::MissingToken)?)
            .ok_or(AuthError::InvalidToken)?;

        let claims = tokens.verify(token)?;

        let user = self
            .db
            .get_user_by_id(claims.user_id)
            .await?
            .filter(|u| u.email == claims.sub && u.is_active)
            .ok_or(AuthError::InactiveUser)?;

        Ok(Actor::from_user(&user))
    }
}

fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Trims and lowercases an email, rejecting anything without a local part and a domain.
pub fn normalize_email(email: &str) -> Result<String, AppError> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
        {
            Ok(email)
        }
        _ => Err(AppError::validation("A valid email address is required")),
    }
}
