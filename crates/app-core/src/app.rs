//! The CampusGuide application service
//!
//! [`CampusGuide`] is built once at startup and shared by reference with every
//! screen. It owns the storage backend and keeps the favourites list attached
//! to whoever is signed in.

use crate::config::{AppConfig, StorageBackend};
use crate::logging;
use crate::Result;
use app_state::account::Result as AuthResult;
use app_state::{
    AccountStore, FavouriteItem, FavouritesStore, Palette, SessionState, ThemeStore, User,
};
use catalog_client::{CatalogClient, CatalogEntry, CoverSize, SearchState, WorkDetails};
use std::sync::Arc;
use storage::{FileKvStore, FileStoreConfig, KeyValueStore, KvError, MemoryKvStore, SledKvStore};

/// Application service
pub struct CampusGuide {
    accounts: AccountStore,
    favourites: FavouritesStore,
    theme: ThemeStore,
    catalog: CatalogClient,
}

impl CampusGuide {
    /// Open the configured backend and restore persisted state
    ///
    /// Also installs the tracing subscriber if none is set yet.
    pub async fn open(config: AppConfig) -> Result<Self> {
        logging::init_tracing(&config.log_directive);

        let kv = open_backend(&config).await?;
        Self::with_store(kv, &config).await
    }

    /// Build the service over an already opened backend
    pub async fn with_store(kv: Arc<dyn KeyValueStore>, config: &AppConfig) -> Result<Self> {
        let accounts = AccountStore::new(kv.clone(), config.hashing)?;
        let favourites = FavouritesStore::new(kv.clone());
        let theme = ThemeStore::new(kv);
        let catalog = CatalogClient::new(config.catalog.clone())?;

        let app = Self {
            accounts,
            favourites,
            theme,
            catalog,
        };

        if let Some(user) = app.accounts.load_session().await {
            app.favourites.attach(&user.email).await;
        }
        app.theme.load().await;

        Ok(app)
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Register a new account and sign in as it
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        avatar: Option<&str>,
    ) -> AuthResult<User> {
        let user = self.accounts.register(name, email, password, avatar).await?;
        self.favourites.attach(&user.email).await;
        Ok(user)
    }

    /// Sign in with an existing account
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<User> {
        let user = self.accounts.login(email, password).await?;
        self.favourites.attach(&user.email).await;
        Ok(user)
    }

    /// Sign out
    pub async fn logout(&self) {
        self.accounts.logout().await;
        self.favourites.detach();
    }

    /// Signed-in user
    pub fn current_user(&self) -> Option<User> {
        self.accounts.current_user()
    }

    /// Current session state
    pub fn session(&self) -> SessionState {
        self.accounts.session()
    }

    /// Account store
    pub fn accounts(&self) -> &AccountStore {
        &self.accounts
    }

    // =========================================================================
    // Favourites
    // =========================================================================

    /// Add a favourite; returns `false` if it was already there
    pub async fn add_favourite(&self, item: FavouriteItem) -> bool {
        let added = self.favourites.add(item);
        if added {
            self.persist_favourites().await;
        }
        added
    }

    /// Remove a favourite; returns `false` if it was not there
    pub async fn remove_favourite(&self, key: &str) -> bool {
        let removed = self.favourites.remove(key);
        if removed {
            self.persist_favourites().await;
        }
        removed
    }

    /// Toggle a favourite; returns whether it is now a favourite
    pub async fn toggle_favourite(&self, item: FavouriteItem) -> bool {
        let now_favourite = self.favourites.toggle(item);
        self.persist_favourites().await;
        now_favourite
    }

    /// Favourites in insertion order
    pub fn favourite_list(&self) -> Vec<FavouriteItem> {
        self.favourites.list()
    }

    /// Favourites store
    pub fn favourites(&self) -> &FavouritesStore {
        &self.favourites
    }

    async fn persist_favourites(&self) {
        if let Err(e) = self.favourites.persist().await {
            tracing::error!("Failed to save favourites: {}", e);
        }
    }

    // =========================================================================
    // Theme
    // =========================================================================

    /// Dark mode enabled
    pub fn dark_mode(&self) -> bool {
        self.theme.dark_mode()
    }

    /// Flip dark mode, returning the new value
    pub async fn toggle_dark_mode(&self) -> bool {
        self.theme.toggle_dark_mode().await
    }

    /// Palette for the current mode
    pub fn palette(&self) -> Palette {
        self.theme.palette()
    }

    /// Theme store
    pub fn theme(&self) -> &ThemeStore {
        &self.theme
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Search the catalog for display
    pub async fn search(&self, query: &str) -> SearchState {
        self.catalog.search_state(query).await
    }

    /// Fetch a single work
    pub async fn work_details(&self, id: &str) -> Result<WorkDetails> {
        Ok(self.catalog.work_details(id).await?)
    }

    /// Cover image URL
    pub fn cover_url(&self, cover_id: Option<u64>, size: CoverSize) -> String {
        self.catalog.cover_url(cover_id, size)
    }

    /// Catalog client
    pub fn catalog(&self) -> &CatalogClient {
        &self.catalog
    }
}

/// Favourite record for a catalog entry
///
/// Entries without a catalog key have nothing stable to be stored under and
/// cannot be favourited.
pub fn favourite_from_entry(entry: &CatalogEntry) -> Option<FavouriteItem> {
    let key = entry.key.clone()?;
    Some(FavouriteItem::new(key, entry.title.clone(), entry.cover_i))
}

async fn open_backend(config: &AppConfig) -> Result<Arc<dyn KeyValueStore>> {
    let kv: Arc<dyn KeyValueStore> = match config.storage {
        StorageBackend::Sled => {
            tokio::fs::create_dir_all(&config.data_dir).await?;
            Arc::new(SledKvStore::open(&config.kv_config())?)
        }
        StorageBackend::File => {
            tokio::fs::create_dir_all(&config.data_dir).await?;
            Arc::new(open_file_store(config.file_store_config()).await?)
        }
        StorageBackend::Memory => Arc::new(MemoryKvStore::new()),
    };

    tracing::info!(backend = ?config.storage, "Opened storage");
    Ok(kv)
}

/// Open the JSON document store, setting an unreadable document aside
///
/// A document that fails to parse, fails its checksum or carries another
/// version is renamed to `<name>.corrupt` and the app starts from an empty
/// store. IO errors other than a missing file still fail the open.
async fn open_file_store(config: FileStoreConfig) -> Result<FileKvStore> {
    match FileKvStore::open(config.clone()).await {
        Ok(store) => Ok(store),
        Err(
            e @ (KvError::Serialization(_)
            | KvError::Corruption(_)
            | KvError::VersionMismatch { .. }),
        ) => {
            let aside = config.path.with_extension("corrupt");
            tracing::warn!(
                path = %config.path.display(),
                moved_to = %aside.display(),
                "Unreadable store document, starting empty: {}",
                e
            );
            tokio::fs::rename(&config.path, &aside).await?;
            Ok(FileKvStore::open(config).await?)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_client::CatalogClientConfig;

    fn test_config() -> AppConfig {
        AppConfig::in_memory().with_catalog(CatalogClientConfig::new("http://127.0.0.1:1"))
    }

    fn item(key: &str) -> FavouriteItem {
        FavouriteItem::new(key, format!("Title {}", key), None)
    }

    #[tokio::test]
    async fn test_open_in_memory() {
        let app = CampusGuide::open(test_config()).await.unwrap();
        assert!(app.current_user().is_none());
        assert!(!app.dark_mode());
        assert!(app.favourite_list().is_empty());
    }

    #[tokio::test]
    async fn test_register_attaches_favourites() {
        let app = CampusGuide::open(test_config()).await.unwrap();
        let user = app
            .register("Alice", "Alice@Test.com", "secret1", None)
            .await
            .unwrap();

        assert_eq!(user.email, "alice@test.com");
        assert_eq!(app.favourites().owner().as_deref(), Some("alice@test.com"));
    }

    #[tokio::test]
    async fn test_favourites_follow_the_user() {
        let app = CampusGuide::open(test_config()).await.unwrap();
        app.register("Alice", "alice@test.com", "secret1", None)
            .await
            .unwrap();

        assert!(app.add_favourite(item("/works/OL1W")).await);
        assert!(!app.add_favourite(item("/works/OL1W")).await);
        assert!(app.toggle_favourite(item("/works/OL2W")).await);

        app.logout().await;
        assert!(app.favourite_list().is_empty());

        app.register("Bob", "bob@test.com", "secret2", None)
            .await
            .unwrap();
        assert!(app.favourite_list().is_empty());

        app.login("alice@test.com", "secret1").await.unwrap();
        let keys: Vec<_> = app.favourite_list().into_iter().map(|f| f.key).collect();
        assert_eq!(keys, vec!["/works/OL1W", "/works/OL2W"]);
    }

    #[tokio::test]
    async fn test_restart_restores_session_and_favourites() {
        let kv = Arc::new(MemoryKvStore::new());
        let config = test_config();

        {
            let app = CampusGuide::with_store(kv.clone(), &config).await.unwrap();
            app.register("Alice", "alice@test.com", "secret1", None)
                .await
                .unwrap();
            app.add_favourite(item("/works/OL1W")).await;
            app.toggle_dark_mode().await;
        }

        let app = CampusGuide::with_store(kv, &config).await.unwrap();
        assert_eq!(
            app.current_user().map(|u| u.email),
            Some("alice@test.com".to_string())
        );
        assert_eq!(app.favourite_list().len(), 1);
        assert!(app.dark_mode());
        assert_eq!(app.palette(), Palette::dark());
    }

    #[tokio::test]
    async fn test_remove_favourite() {
        let app = CampusGuide::open(test_config()).await.unwrap();
        app.register("Alice", "alice@test.com", "secret1", None)
            .await
            .unwrap();

        app.add_favourite(item("/works/OL1W")).await;
        assert!(app.remove_favourite("/works/OL1W").await);
        assert!(!app.remove_favourite("/works/OL1W").await);
        assert!(app.favourite_list().is_empty());
    }

    #[tokio::test]
    async fn test_failed_login_keeps_favourites() {
        let app = CampusGuide::open(test_config()).await.unwrap();
        app.register("Alice", "alice@test.com", "secret1", None)
            .await
            .unwrap();
        app.add_favourite(item("/works/OL1W")).await;

        assert!(app.login("alice@test.com", "wrong").await.is_err());
        assert_eq!(app.favourite_list().len(), 1);
        assert!(app.session().is_authenticated());
    }

    #[test]
    fn test_favourite_from_entry() {
        let entry = CatalogEntry {
            key: Some("/works/OL1W".to_string()),
            title: "Algorithms".to_string(),
            cover_i: Some(9),
            author_name: vec!["Unknown Author".to_string()],
            first_publish_year: None,
        };

        let fav = favourite_from_entry(&entry).unwrap();
        assert_eq!(fav.key, "/works/OL1W");
        assert_eq!(fav.title, "Algorithms");
        assert_eq!(fav.cover_i, Some(9));
    }

    #[test]
    fn test_entry_without_key_is_not_favourited() {
        let entry = CatalogEntry {
            key: None,
            title: "Anonymous Notes".to_string(),
            cover_i: None,
            author_name: vec!["Unknown Author".to_string()],
            first_publish_year: None,
        };

        assert!(favourite_from_entry(&entry).is_none());
    }

    #[tokio::test]
    async fn test_cover_url_uses_placeholder() {
        let app = CampusGuide::open(test_config()).await.unwrap();
        assert_eq!(
            app.cover_url(None, CoverSize::Medium),
            "https://via.placeholder.com/150"
        );
    }
}
