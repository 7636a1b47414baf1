//! User service for registration, e-mail verification and authentication

use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::user::{
    validate_email, validate_name, validate_password, User, UserId, UserRepository,
    VerificationCode,
};
use crate::domain::DomainError;
use crate::infrastructure::crypto::{constant_time_eq, random_code};
use crate::infrastructure::email::{verification_email, Mailer};

use super::password::PasswordHasher;

pub const DEFAULT_CODE_LENGTH: usize = 6;
pub const DEFAULT_CODE_TTL_MINUTES: i64 = 10;

/// Verification code shape and lifetime
#[derive(Debug, Clone)]
pub struct VerificationSettings {
    pub code_length: usize,
    pub code_ttl_minutes: i64,
}

impl Default for VerificationSettings {
    fn default() -> Self {
        Self {
            code_length: DEFAULT_CODE_LENGTH,
            code_ttl_minutes: DEFAULT_CODE_TTL_MINUTES,
        }
    }
}

/// Request for registering a new account
#[derive(Debug, Clone)]
pub struct RegisterUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Request for updating a user's password
#[derive(Debug, Clone)]
pub struct UpdatePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// User service for authentication and management
#[derive(Debug)]
pub struct UserService<R: UserRepository, H: PasswordHasher> {
    repository: Arc<R>,
    hasher: Arc<H>,
    mailer: Arc<dyn Mailer>,
    verification: VerificationSettings,
}

impl<R: UserRepository, H: PasswordHasher> UserService<R, H> {
    pub fn new(repository: Arc<R>, hasher: Arc<H>, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            repository,
            hasher,
            mailer,
            verification: VerificationSettings::default(),
        }
    }

    pub fn with_verification(mut self, verification: VerificationSettings) -> Self {
        self.verification = verification;
        self
    }

    /// Create an unverified account and e-mail its verification code
    pub async fn register(&self, request: RegisterUserRequest) -> Result<User, DomainError> {
        validate_name(&request.name)?;
        validate_email(&request.email)?;
        validate_password(&request.password)?;

        if self.repository.email_exists(&request.email).await? {
            return Err(DomainError::conflict(
                "An account with this email already exists",
            ));
        }

        let password_hash = self.hasher.hash(&request.password)?;
        let mut user = User::new(
            UserId::generate(),
            &request.name,
            &request.email,
            password_hash,
        );
        user.set_verification(self.new_code());

        let user = self.repository.create(user).await?;
        info!(user_id = %user.id(), "User registered");

        self.send_code(&user).await;
        Ok(user)
    }

    /// Confirm an e-mail address with the pending code
    pub async fn verify(&self, email: &str, code: &str) -> Result<User, DomainError> {
        let mut user = self.require_by_email(email).await?;

        if user.is_verified() {
            return Err(DomainError::validation("Email address is already verified"));
        }

        let pending = user
            .verification()
            .ok_or_else(|| DomainError::validation_field("code", "Invalid verification code"))?;

        let submitted = code.trim().to_uppercase();
        if !constant_time_eq(&submitted, &pending.code().to_uppercase()) {
            return Err(DomainError::validation_field(
                "code",
                "Invalid verification code",
            ));
        }

        if pending.is_expired_at(Utc::now()) {
            return Err(DomainError::validation_field(
                "code",
                "Verification code has expired",
            ));
        }

        user.mark_verified();
        let user = self.repository.update(&user).await?;
        info!(user_id = %user.id(), "Email address verified");
        Ok(user)
    }

    /// Replace the pending code with a fresh one and send it
    pub async fn resend_code(&self, email: &str) -> Result<(), DomainError> {
        let mut user = self.require_by_email(email).await?;

        if user.is_verified() {
            return Err(DomainError::validation("Email address is already verified"));
        }

        user.set_verification(self.new_code());
        let user = self.repository.update(&user).await?;

        self.send_code(&user).await;
        Ok(())
    }

    /// `Ok(None)` for unknown e-mail, wrong password or suspended account
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, DomainError> {
        let Some(mut user) = self.repository.get_by_email(email).await? else {
            return Ok(None);
        };

        if !user.is_active() || !self.hasher.verify(password, user.password_hash()) {
            return Ok(None);
        }

        if !user.is_verified() {
            return Err(DomainError::forbidden("Email address not verified"));
        }

        user.record_login();
        self.repository.update(&user).await.map(Some)
    }

    pub async fn get(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        self.repository.get(id).await
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        self.repository.get_by_email(email).await
    }

    pub async fn update_profile(&self, id: &UserId, name: &str) -> Result<User, DomainError> {
        validate_name(name)?;

        let mut user = self.require(id).await?;
        user.set_name(name);
        self.repository.update(&user).await
    }

    pub async fn change_password(
        &self,
        id: &UserId,
        request: UpdatePasswordRequest,
    ) -> Result<User, DomainError> {
        let mut user = self.require(id).await?;

        if !self.hasher.verify(&request.current_password, user.password_hash()) {
            return Err(DomainError::validation_field(
                "current_password",
                "Current password is incorrect",
            ));
        }

        validate_password(&request.new_password)?;

        let new_hash = self.hasher.hash(&request.new_password)?;
        user.set_password_hash(new_hash);

        self.repository.update(&user).await
    }

    fn new_code(&self) -> VerificationCode {
        VerificationCode::new(
            random_code(self.verification.code_length),
            Utc::now() + Duration::minutes(self.verification.code_ttl_minutes),
        )
    }

    /// Delivery failures are logged; the user can request a new code
    async fn send_code(&self, user: &User) {
        let Some(pending) = user.verification() else {
            return;
        };

        let email = verification_email(
            user.name(),
            pending.code(),
            self.verification.code_ttl_minutes,
        );

        if let Err(e) = self
            .mailer
            .send(user.email(), &email.subject, &email.body)
            .await
        {
            warn!(user_id = %user.id(), error = %e, "Failed to send verification e-mail");
        }
    }

    async fn require(&self, id: &UserId) -> Result<User, DomainError> {
        self.repository
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("User '{}' not found", id)))
    }

    async fn require_by_email(&self, email: &str) -> Result<User, DomainError> {
        self.repository
            .get_by_email(email)
            .await?
            .ok_or_else(|| DomainError::not_found("No account found for this email"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::storage::Storage;
    use crate::infrastructure::email::MockMailer;
    use crate::infrastructure::storage::InMemoryStorage;
    use crate::infrastructure::user::{Argon2Hasher, StorageUserRepository};

    type TestService = UserService<StorageUserRepository, Argon2Hasher>;

    fn service_with(mailer: MockMailer) -> (TestService, Arc<InMemoryStorage<User>>) {
        let storage = Arc::new(InMemoryStorage::<User>::new());
        let repo = Arc::new(StorageUserRepository::new(storage.clone()));
        let service = UserService::new(repo, Arc::new(Argon2Hasher::new()), Arc::new(mailer));
        (service, storage)
    }

    fn quiet_mailer() -> MockMailer {
        let mut mailer = MockMailer::new();
        mailer.expect_send().returning(|_, _, _| Ok(()));
        mailer
    }

    fn request(email: &str) -> RegisterUserRequest {
        RegisterUserRequest {
            name: "Ada Lovelace".to_string(),
            email: email.to_string(),
            password: "password123".to_string(),
        }
    }

    async fn pending_code(storage: &InMemoryStorage<User>, id: &UserId) -> String {
        storage
            .get(id)
            .await
            .unwrap()
            .unwrap()
            .verification()
            .unwrap()
            .code()
            .to_string()
    }

    #[tokio::test]
    async fn test_register_sends_code() {
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .withf(|to, subject, body| {
                to == "ada@example.com"
                    && subject == "Verify your e-mail address"
                    && body.contains("Your verification code is:")
            })
            .times(1)
            .returning(|_, _, _| Ok(()));
        let (service, storage) = service_with(mailer);

        let user = service.register(request(" Ada@Example.com")).await.unwrap();

        assert_eq!(user.email(), "ada@example.com");
        assert!(!user.is_verified());
        let code = pending_code(&storage, user.id()).await;
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn test_register_validation() {
        let (service, _) = service_with(quiet_mailer());

        let mut bad = request("ada@example.com");
        bad.password = "short".to_string();
        assert!(matches!(
            service.register(bad).await,
            Err(DomainError::Validation { .. })
        ));

        assert!(matches!(
            service.register(request("not-an-email")).await,
            Err(DomainError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let (service, _) = service_with(quiet_mailer());
        service.register(request("ada@example.com")).await.unwrap();

        let result = service.register(request("ADA@example.com")).await;
        assert!(matches!(result, Err(DomainError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_register_survives_mail_failure() {
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .returning(|_, _, _| Err(DomainError::notification("email", "smtp down")));
        let (service, _) = service_with(mailer);

        assert!(service.register(request("ada@example.com")).await.is_ok());
    }

    #[tokio::test]
    async fn test_verify_flow() {
        let (service, storage) = service_with(quiet_mailer());
        let user = service.register(request("ada@example.com")).await.unwrap();
        let code = pending_code(&storage, user.id()).await;

        let wrong = service.verify("ada@example.com", "000000").await;
        match wrong {
            Err(DomainError::Validation { message, .. }) => {
                assert_eq!(message, "Invalid verification code")
            }
            other => panic!("unexpected: {other:?}"),
        }

        // Lowercase with surrounding whitespace is accepted
        let verified = service
            .verify("ada@example.com", &format!(" {} ", code.to_lowercase()))
            .await
            .unwrap();
        assert!(verified.is_verified());
        assert!(verified.verification().is_none());

        let again = service.verify("ada@example.com", &code).await;
        assert!(matches!(again, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_verify_unknown_email() {
        let (service, _) = service_with(quiet_mailer());

        let result = service.verify("ghost@example.com", "ABC123").await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_verify_expired_code() {
        let (service, storage) = service_with(quiet_mailer());
        let service = service.with_verification(VerificationSettings {
            code_length: 6,
            code_ttl_minutes: 0,
        });
        let user = service.register(request("ada@example.com")).await.unwrap();
        let code = pending_code(&storage, user.id()).await;

        match service.verify("ada@example.com", &code).await {
            Err(DomainError::Validation { message, .. }) => {
                assert_eq!(message, "Verification code has expired")
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_resend_code_replaces_pending_code() {
        let mut mailer = MockMailer::new();
        mailer.expect_send().times(2).returning(|_, _, _| Ok(()));
        let (service, storage) = service_with(mailer);
        let user = service.register(request("ada@example.com")).await.unwrap();
        let before = storage.get(user.id()).await.unwrap().unwrap();

        service.resend_code("ada@example.com").await.unwrap();

        let after = storage.get(user.id()).await.unwrap().unwrap();
        assert!(after.verification().unwrap().expires_at() >= before.verification().unwrap().expires_at());
    }

    #[tokio::test]
    async fn test_resend_code_errors() {
        let (service, storage) = service_with(quiet_mailer());

        assert!(matches!(
            service.resend_code("ghost@example.com").await,
            Err(DomainError::NotFound { .. })
        ));

        let user = service.register(request("ada@example.com")).await.unwrap();
        let code = pending_code(&storage, user.id()).await;
        service.verify("ada@example.com", &code).await.unwrap();

        assert!(matches!(
            service.resend_code("ada@example.com").await,
            Err(DomainError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_authenticate() {
        let (service, storage) = service_with(quiet_mailer());
        let user = service.register(request("ada@example.com")).await.unwrap();

        let unverified = service.authenticate("ada@example.com", "password123").await;
        assert!(matches!(unverified, Err(DomainError::Forbidden { .. })));

        let code = pending_code(&storage, user.id()).await;
        service.verify("ada@example.com", &code).await.unwrap();

        assert!(service
            .authenticate("ada@example.com", "wrong-password")
            .await
            .unwrap()
            .is_none());
        assert!(service
            .authenticate("ghost@example.com", "password123")
            .await
            .unwrap()
            .is_none());

        let logged_in = service
            .authenticate("ADA@example.com", "password123")
            .await
            .unwrap()
            .unwrap();
        assert!(logged_in.last_login_at().is_some());
    }

    #[tokio::test]
    async fn test_suspended_user_cannot_authenticate() {
        let (service, storage) = service_with(quiet_mailer());
        let user = service.register(request("ada@example.com")).await.unwrap();
        let mut stored = storage.get(user.id()).await.unwrap().unwrap();
        stored.mark_verified();
        stored.suspend();
        storage.update(stored).await.unwrap();

        let result = service.authenticate("ada@example.com", "password123").await;
        assert!(result.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_profile_and_password() {
        let (service, _) = service_with(quiet_mailer());
        let user = service.register(request("ada@example.com")).await.unwrap();

        let renamed = service.update_profile(user.id(), "Countess").await.unwrap();
        assert_eq!(renamed.name(), "Countess");
        assert!(service.update_profile(user.id(), " ").await.is_err());

        let wrong = service
            .change_password(
                user.id(),
                UpdatePasswordRequest {
                    current_password: "nope-nope".to_string(),
                    new_password: "new-password".to_string(),
                },
            )
            .await;
        assert!(matches!(wrong, Err(DomainError::Validation { .. })));

        let changed = service
            .change_password(
                user.id(),
                UpdatePasswordRequest {
                    current_password: "password123".to_string(),
                    new_password: "new-password".to_string(),
                },
            )
            .await
            .unwrap();
        assert!(Argon2Hasher::new().verify("new-password", changed.password_hash()));
    }
}
