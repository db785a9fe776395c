//! User service for registration, authentication and account mutations

use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::domain::user::{
    validate_address, validate_email, validate_name, validate_password, Role, Roles, User, UserId,
    UserRepository,
};
use crate::domain::DomainError;

use super::password::PasswordHasher;

/// Request for registering a new account
#[derive(Debug, Clone)]
pub struct RegisterUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub address: Option<String>,
}

/// Partial profile update; `None` leaves a field as it is
#[derive(Debug, Clone, Default)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

/// Hashed once and verified against when an email lookup misses
const DUMMY_PASSWORD: &str = "account-service-dummy-password";

/// User service for authentication and management
#[derive(Debug)]
pub struct UserService<R: UserRepository, H: PasswordHasher> {
    repository: Arc<R>,
    hasher: Arc<H>,
    dummy_hash: OnceCell<String>,
}

impl<R: UserRepository, H: PasswordHasher> UserService<R, H> {
    /// Create a new user service
    pub fn new(repository: Arc<R>, hasher: Arc<H>) -> Self {
        Self {
            repository,
            hasher,
            dummy_hash: OnceCell::new(),
        }
    }

    /// Register a customer account with the default roles
    pub async fn register(&self, request: RegisterUserRequest) -> Result<User, DomainError> {
        self.create_with_roles(request, Roles::customer_default())
            .await
    }

    /// Create an account holding the given roles
    pub async fn create_with_roles(
        &self,
        request: RegisterUserRequest,
        roles: Roles,
    ) -> Result<User, DomainError> {
        validate_name(&request.name).map_err(|e| DomainError::validation(e.to_string()))?;
        validate_email(&request.email).map_err(|e| DomainError::validation(e.to_string()))?;
        validate_password(&request.password)
            .map_err(|e| DomainError::validation(e.to_string()))?;
        if let Some(address) = &request.address {
            validate_address(address).map_err(|e| DomainError::validation(e.to_string()))?;
        }

        if self.repository.email_exists(&request.email).await? {
            return Err(DomainError::conflict("Email already in use."));
        }

        let password_hash = self.hasher.hash(&request.password)?;

        let user = User::new(
            UserId::generate(),
            request.name,
            request.email,
            password_hash,
            request.address,
            roles,
        );

        self.repository.create(user).await
    }

    /// Authenticate with email and password
    ///
    /// Unknown email and wrong password both come back as `None`.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, DomainError> {
        let user = match self.repository.get_by_email(email).await? {
            Some(u) => u,
            None => {
                self.verify_against_dummy(password);
                return Ok(None);
            }
        };

        if !self.hasher.verify(password, user.password_hash()) {
            return Ok(None);
        }

        Ok(Some(user))
    }

    fn verify_against_dummy(&self, password: &str) {
        if let Ok(hash) = self
            .dummy_hash
            .get_or_try_init(|| self.hasher.hash(DUMMY_PASSWORD))
        {
            let _ = self.hasher.verify(password, hash);
        }
    }

    /// Get a user by ID
    pub async fn get(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        self.repository.get(id).await
    }

    /// List users holding a role
    pub async fn list_by_role(&self, role: Role) -> Result<Vec<User>, DomainError> {
        self.repository.list_by_role(role).await
    }

    /// Count all users
    pub async fn count(&self) -> Result<usize, DomainError> {
        self.repository.count().await
    }

    /// Apply a partial profile update to a user read earlier
    pub async fn update_profile(
        &self,
        mut user: User,
        request: UpdateProfileRequest,
    ) -> Result<User, DomainError> {
        if let Some(name) = request.name {
            validate_name(&name).map_err(|e| DomainError::validation(e.to_string()))?;
            user.set_name(name);
        }

        if let Some(address) = request.address {
            validate_address(&address).map_err(|e| DomainError::validation(e.to_string()))?;
            user.set_address(Some(address));
        }

        if let Some(email) = request.email {
            if email != user.email() {
                validate_email(&email).map_err(|e| DomainError::validation(e.to_string()))?;

                if self.repository.email_exists(&email).await? {
                    return Err(DomainError::conflict("Email already in use."));
                }

                user.set_email(email);
            }
        }

        self.repository.update(&user).await
    }

    /// Flip buy approval on a user read earlier
    pub async fn toggle_buy(&self, mut user: User) -> Result<User, DomainError> {
        user.toggle_buy();
        self.repository.update(&user).await
    }

    /// Replace the editable permissions of a user read earlier
    pub async fn edit_permissions(
        &self,
        mut user: User,
        requested: Vec<Role>,
    ) -> Result<User, DomainError> {
        user.edit_permissions(requested);
        self.repository.update(&user).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::MockUserRepository;
    use crate::infrastructure::user::password::Argon2Hasher;
    use crate::infrastructure::user::repository::InMemoryUserRepository;

    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct CountingHasher {
        inner: Argon2Hasher,
        verifies: AtomicUsize,
    }

    impl PasswordHasher for CountingHasher {
        fn hash(&self, password: &str) -> Result<String, DomainError> {
            self.inner.hash(password)
        }

        fn verify(&self, password: &str, hash: &str) -> bool {
            self.verifies.fetch_add(1, Ordering::SeqCst);
            self.inner.verify(password, hash)
        }
    }

    fn create_service() -> UserService<InMemoryUserRepository, Argon2Hasher> {
        let repository = Arc::new(InMemoryUserRepository::new());
        let hasher = Arc::new(Argon2Hasher::new());
        UserService::new(repository, hasher)
    }

    fn make_request(email: &str, password: &str) -> RegisterUserRequest {
        RegisterUserRequest {
            name: "Test User".to_string(),
            email: email.to_string(),
            password: password.to_string(),
            address: Some("1 Test Road".to_string()),
        }
    }

    #[tokio::test]
    async fn test_register_user() {
        let service = create_service();

        let user = service
            .register(make_request("test@email.com", "password"))
            .await
            .unwrap();

        assert_eq!(user.email(), "test@email.com");
        assert_eq!(user.roles().as_slice(), &[Role::Customer, Role::NotApproved]);
        assert_ne!(user.password_hash(), "password");
    }

    #[tokio::test]
    async fn test_register_invalid_email() {
        let service = create_service();

        let result = service.register(make_request("not-an-email", "password")).await;
        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_register_empty_password() {
        let service = create_service();

        let result = service.register(make_request("test@email.com", "")).await;
        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let service = create_service();

        service
            .register(make_request("test@email.com", "password"))
            .await
            .unwrap();

        let result = service
            .register(make_request("test@email.com", "other_password"))
            .await;
        assert!(matches!(result, Err(DomainError::Conflict { .. })));
        assert_eq!(service.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        let service = create_service();
        let registered = service
            .register(make_request("test@email.com", "password"))
            .await
            .unwrap();

        let user = service
            .authenticate("test@email.com", "password")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(user.id(), registered.id());
    }

    #[tokio::test]
    async fn test_authenticate_wrong_password() {
        let service = create_service();
        service
            .register(make_request("test@email.com", "password"))
            .await
            .unwrap();

        let user = service
            .authenticate("test@email.com", "wrong_password")
            .await
            .unwrap();

        assert!(user.is_none());
    }

    #[tokio::test]
    async fn test_authenticate_unknown_email() {
        let service = create_service();

        let user = service.authenticate("nobody@email.com", "password").await.unwrap();
        assert!(user.is_none());
    }

    #[tokio::test]
    async fn test_unknown_email_still_verifies_a_hash() {
        let hasher = Arc::new(CountingHasher::default());
        let service = UserService::new(Arc::new(InMemoryUserRepository::new()), hasher.clone());
        service
            .register(make_request("test@email.com", "password"))
            .await
            .unwrap();

        let unknown = service.authenticate("nobody@email.com", "password").await.unwrap();
        assert!(unknown.is_none());
        assert_eq!(hasher.verifies.load(Ordering::SeqCst), 1);

        let wrong = service.authenticate("test@email.com", "wrong").await.unwrap();
        assert!(wrong.is_none());
        assert_eq!(hasher.verifies.load(Ordering::SeqCst), 2);

        let again = service.authenticate("nobody@email.com", DUMMY_PASSWORD).await.unwrap();
        assert!(again.is_none());
        assert_eq!(hasher.verifies.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_update_profile_partial() {
        let service = create_service();
        let user = service
            .register(make_request("test@email.com", "password"))
            .await
            .unwrap();

        let updated = service
            .update_profile(
                user,
                UpdateProfileRequest {
                    name: Some("Renamed".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name(), "Renamed");
        assert_eq!(updated.email(), "test@email.com");
        assert_eq!(updated.address(), Some("1 Test Road"));
        assert_eq!(updated.version(), 1);
    }

    #[tokio::test]
    async fn test_update_profile_changes_email() {
        let service = create_service();
        let user = service
            .register(make_request("old@email.com", "password"))
            .await
            .unwrap();

        service
            .update_profile(
                user,
                UpdateProfileRequest {
                    email: Some("new@email.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(service.authenticate("new@email.com", "password").await.unwrap().is_some());
        assert!(service.authenticate("old@email.com", "password").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_profile_taken_email() {
        let service = create_service();
        service
            .register(make_request("taken@email.com", "password"))
            .await
            .unwrap();
        let user = service
            .register(make_request("mine@email.com", "password"))
            .await
            .unwrap();

        let result = service
            .update_profile(
                user,
                UpdateProfileRequest {
                    email: Some("taken@email.com".to_string()),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(DomainError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_update_profile_invalid_email() {
        let service = create_service();
        let user = service
            .register(make_request("test@email.com", "password"))
            .await
            .unwrap();

        let result = service
            .update_profile(
                user,
                UpdateProfileRequest {
                    email: Some("broken".to_string()),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_toggle_buy_round_trip() {
        let service = create_service();
        let user = service
            .register(make_request("test@email.com", "password"))
            .await
            .unwrap();

        let approved = service.toggle_buy(user).await.unwrap();
        assert_eq!(approved.roles().as_slice(), &[Role::Customer]);

        let revoked = service.toggle_buy(approved).await.unwrap();
        assert_eq!(revoked.roles().as_slice(), &[Role::Customer, Role::NotApproved]);
    }

    #[tokio::test]
    async fn test_toggle_buy_stale_read() {
        let service = create_service();
        let user = service
            .register(make_request("test@email.com", "password"))
            .await
            .unwrap();

        service.toggle_buy(user.clone()).await.unwrap();
        let result = service.toggle_buy(user.clone()).await;

        assert!(matches!(result, Err(DomainError::Conflict { .. })));
        let stored = service.get(user.id()).await.unwrap().unwrap();
        assert!(!stored.has_role(Role::NotApproved));
    }

    #[tokio::test]
    async fn test_edit_permissions() {
        let service = create_service();
        let staff = service
            .create_with_roles(
                make_request("staff@email.com", "password"),
                Roles::from([Role::Staff, Role::CanMessage]),
            )
            .await
            .unwrap();

        let updated = service
            .edit_permissions(staff, vec![Role::CanBuy, Role::Management])
            .await
            .unwrap();

        assert_eq!(updated.roles().as_slice(), &[Role::Staff, Role::CanBuy]);
    }

    #[tokio::test]
    async fn test_list_by_role() {
        let service = create_service();
        service
            .register(make_request("c@email.com", "password"))
            .await
            .unwrap();
        service
            .create_with_roles(make_request("s@email.com", "password"), Roles::from([Role::Staff]))
            .await
            .unwrap();

        assert_eq!(service.list_by_role(Role::Customer).await.unwrap().len(), 1);
        assert_eq!(service.list_by_role(Role::Staff).await.unwrap().len(), 1);
        assert!(service.list_by_role(Role::Management).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_storage_failure_propagates() {
        let repository = Arc::new(MockUserRepository::new());
        let service = UserService::new(repository.clone(), Arc::new(Argon2Hasher::new()));
        repository.set_should_fail(true).await;

        let result = service.authenticate("test@email.com", "password").await;
        assert!(matches!(result, Err(DomainError::Storage { .. })));
    }
}
