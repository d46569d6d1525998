//! The stores a command works with, plus the role gates the front end owns.

use sweet_shop_client::{
    ApiClient, CatalogGateway, ClientConfig, FilePersistence, HttpCatalogGateway,
    HttpIdentityGateway, IdentityGateway, InventoryStore, SessionPersistence, SessionStore,
};
use sweet_shop_core::SessionIdentity;

use crate::error::CliError;

/// Session and inventory stores, injected into every command.
pub struct Shop<C, I, P> {
    pub session: SessionStore<I, P>,
    pub inventory: InventoryStore<C>,
}

/// The stores wired to the remote service.
pub type HttpShop = Shop<HttpCatalogGateway, HttpIdentityGateway, FilePersistence>;

impl HttpShop {
    /// Wire both stores to the configured service and session file.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Client` if the HTTP client cannot be built.
    pub fn connect(config: &ClientConfig) -> Result<Self, CliError> {
        let api = ApiClient::new(config)?;
        let session = SessionStore::new(
            HttpIdentityGateway::new(api.clone()),
            FilePersistence::new(&config.session_file),
        );
        let inventory = InventoryStore::new(HttpCatalogGateway::new(api, session.token_source()));

        Ok(Self { session, inventory })
    }
}

impl<C, I, P> Shop<C, I, P>
where
    C: CatalogGateway,
    I: IdentityGateway,
    P: SessionPersistence,
{
    /// The signed-in identity.
    ///
    /// # Errors
    ///
    /// Returns `CliError::NotAuthenticated` for anonymous sessions.
    pub fn require_authenticated(&self) -> Result<SessionIdentity, CliError> {
        self.session.identity().ok_or(CliError::NotAuthenticated)
    }

    /// The signed-in admin identity.
    ///
    /// This only decides what the terminal offers; the service enforces
    /// authorization on every request.
    ///
    /// # Errors
    ///
    /// Returns `CliError::NotAuthenticated` or `CliError::Forbidden`.
    pub fn require_admin(&self) -> Result<SessionIdentity, CliError> {
        let identity = self.require_authenticated()?;
        if identity.is_admin() {
            Ok(identity)
        } else {
            Err(CliError::Forbidden)
        }
    }

    /// The signed-in customer identity.
    ///
    /// # Errors
    ///
    /// Returns `CliError::NotAuthenticated` or `CliError::AdminPurchase`.
    pub fn require_customer(&self) -> Result<SessionIdentity, CliError> {
        let identity = self.require_authenticated()?;
        if identity.is_admin() {
            Err(CliError::AdminPurchase)
        } else {
            Ok(identity)
        }
    }

    /// Fail if someone is already signed in.
    ///
    /// # Errors
    ///
    /// Returns `CliError::AlreadySignedIn`.
    pub fn require_anonymous(&self) -> Result<(), CliError> {
        match self.session.identity() {
            Some(identity) => Err(CliError::AlreadySignedIn(identity.username)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use secrecy::SecretString;
    use sweet_shop_client::MemoryPersistence;
    use sweet_shop_core::Role;
    use url::Url;

    use super::*;

    type TestShop = Shop<HttpCatalogGateway, HttpIdentityGateway, Arc<MemoryPersistence>>;

    fn shop(role: Option<Role>) -> TestShop {
        let storage = Arc::new(MemoryPersistence::new());
        if let Some(role) = role {
            storage
                .save(&SessionIdentity {
                    username: "pat".to_owned(),
                    email: None,
                    role,
                    token: SecretString::from("token"),
                    expires_in_ms: None,
                })
                .unwrap();
        }

        // Nothing listens here; gates never reach the network
        let config = ClientConfig::new(Url::parse("http://127.0.0.1:9/api").unwrap());
        let api = ApiClient::new(&config).unwrap();
        let session = SessionStore::new(HttpIdentityGateway::new(api.clone()), storage);
        let inventory = InventoryStore::new(HttpCatalogGateway::new(api, session.token_source()));
        Shop { session, inventory }
    }

    #[test]
    fn test_anonymous_gates() {
        let shop = shop(None);
        assert!(shop.require_anonymous().is_ok());
        assert!(matches!(
            shop.require_authenticated(),
            Err(CliError::NotAuthenticated)
        ));
        assert!(matches!(shop.require_admin(), Err(CliError::NotAuthenticated)));
    }

    #[test]
    fn test_customer_gates() {
        let shop = shop(Some(Role::Customer));
        assert_eq!(shop.require_customer().unwrap().username, "pat");
        assert!(matches!(shop.require_admin(), Err(CliError::Forbidden)));
        assert!(matches!(
            shop.require_anonymous(),
            Err(CliError::AlreadySignedIn(name)) if name == "pat"
        ));
    }

    #[test]
    fn test_admin_gates() {
        let shop = shop(Some(Role::Admin));
        assert!(shop.require_admin().is_ok());
        assert!(matches!(shop.require_customer(), Err(CliError::AdminPurchase)));
    }
}
