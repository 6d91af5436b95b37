//! Compiler configuration and the generated-artifact cache directory.
//!
//! Cache-directory resolution follows the same `dirs`-crate pattern as
//! `credentials_path()` in `logicaffeine_base`'s credential store: prefer
//! the platform cache directory, fall back to an explicit override.

use std::env;
use std::path::PathBuf;

const CACHE_DIR_ENV: &str = "SPICY_CACHE_DIR";

/// Options threaded through a whole compile.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Hard upper bound on fixed-point driver iterations.
    pub max_driver_iterations: usize,
    /// Emit debug-friendly artifacts (unoptimized, source-mapped).
    pub debug: bool,
    /// Where generated artifacts are cached between compiles. `None`
    /// disables caching.
    pub cache_dir: Option<PathBuf>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions { max_driver_iterations: 100, debug: false, cache_dir: resolve_cache_dir() }
    }
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_cache_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.cache_dir = dir;
        self
    }

    pub fn with_max_driver_iterations(mut self, n: usize) -> Self {
        self.max_driver_iterations = n;
        self
    }
}

/// Resolves the artifact cache directory: `$SPICY_CACHE_DIR` if set,
/// otherwise the platform cache dir joined with `spicy` and the crate
/// version, otherwise `None` (caching disabled rather than failing the
/// compile outright).
fn resolve_cache_dir() -> Option<PathBuf> {
    if let Ok(path) = env::var(CACHE_DIR_ENV) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    dirs::cache_dir().map(|base| base.join("spicy").join(env!("CARGO_PKG_VERSION")))
}
