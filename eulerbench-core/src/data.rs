//! Problem Data
//!
//! Some problems read an input file (a word list, a number triangle). The file
//! is parsed by a loader registered with `#[eulerbench::data]`, and the parsed
//! value reaches methods through a [`DataHandle`].
//!
//! The handle is owned by the worker executing the problem's methods. It is
//! attached when the problem starts, optionally preloaded so that parsing is
//! not charged to the first measurement, and reset when the problem ends.

use std::any::Any;
use std::cell::RefCell;
use std::fmt::Display;
use std::sync::Arc;
use thiserror::Error;

/// Signature of a registered data loader after macro wrapping
pub type DataLoaderFn = fn() -> Result<Dataset, DataError>;

/// Errors raised while loading or accessing problem data
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    #[error("no data loader is registered for this problem")]
    Missing,

    #[error("failed to load data: {0}")]
    Load(String),

    #[error("data set is not of type {expected}")]
    TypeMismatch { expected: &'static str },
}

/// Type-erased, shareable parsed data set
#[derive(Clone)]
pub struct Dataset(Arc<dyn Any + Send + Sync>);

impl Dataset {
    /// Wrap a parsed value
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Recover the concrete value
    pub fn downcast<T: Any + Send + Sync>(&self) -> Result<Arc<T>, DataError> {
        self.0
            .clone()
            .downcast::<T>()
            .map_err(|_| DataError::TypeMismatch {
                expected: std::any::type_name::<T>(),
            })
    }
}

impl std::fmt::Debug for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Dataset(..)")
    }
}

/// Wrap a loader's `Result` into a [`Dataset`]; used by macro expansion.
#[doc(hidden)]
pub fn into_dataset<T, E>(loaded: Result<T, E>) -> Result<Dataset, DataError>
where
    T: Any + Send + Sync,
    E: Display,
{
    loaded
        .map(Dataset::new)
        .map_err(|e| DataError::Load(e.to_string()))
}

/// Per-problem access to the problem's data set.
///
/// Loading is lazy: the first [`DataHandle::load`] runs the loader unless
/// [`DataHandle::preload`] already did.
#[derive(Debug, Default)]
pub struct DataHandle {
    loader: Option<DataLoaderFn>,
    cache: RefCell<Option<Dataset>>,
}

impl DataHandle {
    /// Handle for a problem without data
    pub fn none() -> Self {
        Self::default()
    }

    /// Handle backed by a loader
    pub fn new(loader: Option<DataLoaderFn>) -> Self {
        Self {
            loader,
            cache: RefCell::new(None),
        }
    }

    /// Whether a loader is attached
    pub fn has_loader(&self) -> bool {
        self.loader.is_some()
    }

    /// Whether the data set is currently cached
    pub fn is_loaded(&self) -> bool {
        self.cache.borrow().is_some()
    }

    /// Load the data now. Returns `Ok(false)` when there is nothing to load.
    pub fn preload(&self) -> Result<bool, DataError> {
        if self.loader.is_none() {
            return Ok(false);
        }
        self.dataset().map(|_| true)
    }

    /// Drop the cached data set
    pub fn reset(&self) {
        self.cache.borrow_mut().take();
    }

    /// Access the data set as `T`, loading it if necessary
    pub fn load<T: Any + Send + Sync>(&self) -> Result<Arc<T>, DataError> {
        self.dataset()?.downcast::<T>()
    }

    fn dataset(&self) -> Result<Dataset, DataError> {
        if let Some(cached) = self.cache.borrow().as_ref() {
            return Ok(cached.clone());
        }
        let loader = self.loader.ok_or(DataError::Missing)?;
        let loaded = loader()?;
        *self.cache.borrow_mut() = Some(loaded.clone());
        Ok(loaded)
    }
}
