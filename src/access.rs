use crate::error::ServiceError;
use crate::models::{Account, Role};
use crate::password::verify_password;
use crate::store::Store;
use serde::Serialize;

/// Who is making a request. Anonymous callers are guests.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Caller {
    pub account: Option<Account>,
    pub role: Role,
}

impl Caller {
    pub fn guest() -> Self {
        Self {
            account: None,
            role: Role::Guest,
        }
    }
}

/// Catalog changes are for admins.
pub fn require_admin(role: Role) -> Result<(), ServiceError> {
    if role.is_admin() {
        Ok(())
    } else {
        Err(ServiceError::Forbidden)
    }
}

/// Order lists and catalog search are for managers and admins.
pub fn require_staff(role: Role) -> Result<(), ServiceError> {
    if role.is_staff() {
        Ok(())
    } else {
        Err(ServiceError::Forbidden)
    }
}

/// Checks a username/password pair. Accounts without a stored credential
/// cannot sign in; an account without a profile acts as a guest.
pub fn authenticate<S: Store>(
    store: &mut S,
    username: &str,
    password: &str,
) -> Result<Caller, ServiceError> {
    let account = store
        .account_by_username(username)?
        .ok_or(ServiceError::Unauthorized)?;
    let hash = account
        .password_hash
        .as_deref()
        .ok_or(ServiceError::Unauthorized)?;
    if !verify_password(hash, password)? {
        return Err(ServiceError::Unauthorized);
    }
    let role = store
        .profile(account.id)?
        .map(|profile| profile.role())
        .unwrap_or(Role::Guest);
    Ok(Caller {
        account: Some(account),
        role,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insertables::{NewAccount, NewProfile};
    use crate::password::hash_password;
    use crate::store::MemoryStore;

    fn store_with(username: &str, password: Option<&str>, role: Option<Role>) -> MemoryStore {
        let mut store = MemoryStore::new();
        let mut account = NewAccount::bare(username.to_string());
        account.password_hash = password.map(|p| hash_password(p).unwrap());
        let account = store.create_account(&account).unwrap();
        if let Some(role) = role {
            store
                .get_or_create_profile(&NewProfile::new(account.id, role, "Test User"))
                .unwrap();
        }
        store
    }

    #[test]
    fn role_comes_from_profile() {
        let mut store = store_with("manager", Some("secret"), Some(Role::Manager));
        let caller = authenticate(&mut store, "manager", "secret").unwrap();
        assert_eq!(caller.role, Role::Manager);
        assert!(require_staff(caller.role).is_ok());
        assert!(matches!(require_admin(caller.role), Err(ServiceError::Forbidden)));
        assert!(matches!(require_staff(Caller::guest().role), Err(ServiceError::Forbidden)));
    }

    #[test]
    fn missing_profile_means_guest() {
        let mut store = store_with("nobody", Some("secret"), None);
        assert_eq!(authenticate(&mut store, "nobody", "secret").unwrap().role, Role::Guest);
    }

    #[test]
    fn wrong_or_absent_credentials_are_rejected() {
        let mut store = store_with("client", Some("secret"), Some(Role::Client));
        assert!(matches!(
            authenticate(&mut store, "client", "guess"),
            Err(ServiceError::Unauthorized)
        ));
        assert!(matches!(
            authenticate(&mut store, "ghost", "secret"),
            Err(ServiceError::Unauthorized)
        ));
        let mut bare = store_with("imported", None, Some(Role::Client));
        assert!(matches!(
            authenticate(&mut bare, "imported", ""),
            Err(ServiceError::Unauthorized)
        ));
    }
}
