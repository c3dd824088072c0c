//! Fog-of-war shared between the round loop and event handlers.
//!
//! [`DiscoveryEngine`] is plain single-threaded state. [`Vision`] wraps it in
//! one engine-wide lock so a re-attach or hide can never interleave with a
//! flood running from an event handler, and sends its output through the
//! transport while that lock is held so fog and reveals reach players in
//! the order they were produced.

pub mod engine;

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use cave_mapgen::WorldMap;

use crate::client::Transport;
use crate::error::Result;

pub use engine::{DiscoveryEngine, EDGE_RIM_SIZE};

pub struct Vision {
    engine: Mutex<DiscoveryEngine>,
    transport: Arc<dyn Transport>,
}

impl Vision {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            engine: Mutex::new(DiscoveryEngine::new()),
            transport,
        }
    }

    /// Swap in a freshly generated map; all discovery state is reset.
    pub fn attach(&self, map: WorldMap) {
        let mut engine = self.engine.lock();
        debug!(width = map.width(), height = map.height(), "attaching world map");
        engine.attach(map);
    }

    pub fn discover_tile(&self, x: i32, y: i32) {
        self.engine.lock().discover_tile(x, y);
    }

    pub fn flood_discovery(&self, x: i32, y: i32) {
        self.engine.lock().flood_discovery(x, y);
    }

    pub fn cubic_discovery(&self, x: i32, y: i32, size: i32) {
        self.engine.lock().cubic_discovery(x, y, size);
    }

    /// Run several engine operations under one lock.
    pub fn with_engine<R>(&self, f: impl FnOnce(&mut DiscoveryEngine) -> R) -> R {
        f(&mut self.engine.lock())
    }

    /// Run `f` under the lock and flush what it discovered before releasing it.
    pub fn update<R>(&self, f: impl FnOnce(&mut DiscoveryEngine) -> R) -> Result<R> {
        let mut engine = self.engine.lock();
        let out = f(&mut engine);
        let blocks = engine.take_block_update();
        if !blocks.is_empty() {
            debug!(blocks = blocks.len(), "sending discovered tiles");
            self.transport.send_batch(blocks)?;
        }
        Ok(out)
    }

    /// Cover everything in fog right away.
    pub fn hide_all(&self) -> Result<()> {
        let mut engine = self.engine.lock();
        let blocks = engine.hide_all();
        debug!(blocks = blocks.len(), "hiding whole map");
        self.transport.send_batch(blocks)
    }

    /// Reveal the whole map; takes effect on the next flush.
    pub fn reveal_all(&self) {
        self.engine.lock().reveal_all();
    }

    /// Flush everything discovered since the last flush.
    pub fn send_block_update(&self) -> Result<()> {
        let mut engine = self.engine.lock();
        let blocks = engine.take_block_update();
        if blocks.is_empty() {
            return Ok(());
        }
        debug!(blocks = blocks.len(), "sending discovered tiles");
        self.transport.send_batch(blocks)
    }

    /// Send both layers of the attached map, ignoring fog.
    pub fn resend(&self) -> Result<()> {
        let engine = self.engine.lock();
        self.transport.send_batch(engine.map().placements())
    }
}
