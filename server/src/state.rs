use crate::database::{BookStore, StoreError};
use crate::ids::IdSource;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Where uploaded covers and generated pages live on disk.
#[derive(Debug, Clone)]
pub struct ContentDirs {
    pub public: PathBuf,
    pub uploads: PathBuf,
    pub books: PathBuf,
}

impl ContentDirs {
    pub fn new(public: impl Into<PathBuf>, uploads: impl Into<PathBuf>) -> Self {
        let public = public.into();
        ContentDirs {
            books: public.join("books"),
            public,
            uploads: uploads.into(),
        }
    }

    /// Convenience layout with `public/` and `uploads/` under one root.
    pub fn under(root: &Path) -> Self {
        Self::new(root.join("public"), root.join("uploads"))
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Mutex<BookStore>>,
    pub ids: Arc<dyn IdSource>,
    pub dirs: Arc<ContentDirs>,
}

impl AppState {
    pub fn new(store: BookStore, ids: impl IdSource + 'static, dirs: ContentDirs) -> Self {
        AppState {
            store: Arc::new(Mutex::new(store)),
            ids: Arc::new(ids),
            dirs: Arc::new(dirs),
        }
    }

    pub fn store(&self) -> Result<MutexGuard<'_, BookStore>, StoreError> {
        self.store.lock().map_err(|_| StoreError::Poisoned)
    }
}
