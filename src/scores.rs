//! Best-score persistence
//!
//! The session reads the best score once at start and writes it whenever the
//! current life beats it. On wasm32 it lives in LocalStorage.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// Key-value seam for the best-ever score
pub trait ScoreStore {
    fn read(&self) -> u64;
    /// Record a new best along with the name that set it
    fn write(&mut self, score: u64, name: &str);
}

/// Best score persisted to LocalStorage (wasm32) or nowhere (native)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BestScore {
    pub score: u64,
    /// Name in use when the score was set
    #[serde(default)]
    pub name: String,
}

impl BestScore {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "neon_arena_best_score";

    pub fn new() -> Self {
        Self::default()
    }

    /// Load from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(best) = serde_json::from_str::<BestScore>(&json) {
                    log::info!("Loaded best score {}", best.score);
                    return best;
                }
            }
        }

        log::info!("No best score found, starting fresh");
        Self::new()
    }

    /// Save to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::debug!("Best score saved ({})", self.score);
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::new()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

impl ScoreStore for BestScore {
    fn read(&self) -> u64 {
        self.score
    }

    fn write(&mut self, score: u64, name: &str) {
        self.score = score;
        self.name = name.to_string();
        self.save();
    }
}

/// In-memory store; clones share the same value
#[derive(Debug, Clone, Default)]
pub struct MemoryScores {
    best: Rc<Cell<u64>>,
    name: Rc<RefCell<String>>,
    writes: Rc<Cell<u32>>,
}

impl MemoryScores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_best(best: u64) -> Self {
        let store = Self::default();
        store.best.set(best);
        store
    }

    /// Number of writes so far
    pub fn writes(&self) -> u32 {
        self.writes.get()
    }

    /// Name attached to the last write
    pub fn name(&self) -> String {
        self.name.borrow().clone()
    }
}

impl ScoreStore for MemoryScores {
    fn read(&self) -> u64 {
        self.best.get()
    }

    fn write(&mut self, score: u64, name: &str) {
        self.best.set(score);
        *self.name.borrow_mut() = name.to_string();
        self.writes.set(self.writes.get() + 1);
    }
}
