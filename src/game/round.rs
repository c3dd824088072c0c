//! The round loop: wait for a trigger, build a fresh cave, hide the chests,
//! reveal the spawn and let players dig until someone finds one.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::state::PlayerId;

use super::treasure::{place_treasures, treasure_count};
use super::GameContext;

/// Seeds are drawn from `0..SEED_RANGE`
pub const SEED_RANGE: u32 = 10_000;

/// Where the loop currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    WaitForTrigger,
    GenerateWorld,
    PlaceTreasures,
    RevealSpawn,
    Announce,
    WaitForOutcome,
}

/// Who found the last treasure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WinnerRef {
    pub id: PlayerId,
    pub username: String,
}

/// Flags shared between the loop and the event handlers
#[derive(Debug, Clone, Default)]
pub struct RoundState {
    pub phase: Phase,
    /// Set by `start` and by a finished round
    pub generate_next: bool,
    pub dig_permitted: bool,
    pub last_winner: Option<WinnerRef>,
    /// Chest positions, generation coordinates
    pub treasures: Vec<(i32, i32)>,
    pub seed: Option<u32>,
    pub spawn: Option<(i32, i32)>,
}

struct RunningLoop {
    cancel: watch::Sender<bool>,
    handle: JoinHandle<Result<()>>,
}

/// Counts a loop as live from `start` until its task finishes
struct LiveGuard(Arc<AtomicUsize>);

impl LiveGuard {
    fn new(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter.clone())
    }
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Owns at most one running round loop
pub struct RoundOrchestrator {
    ctx: Arc<GameContext>,
    running: Option<RunningLoop>,
    live_loops: Arc<AtomicUsize>,
}

impl RoundOrchestrator {
    pub fn new(ctx: Arc<GameContext>) -> Self {
        Self {
            ctx,
            running: None,
            live_loops: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Loops spawned and not yet finished
    pub fn live_loops(&self) -> usize {
        self.live_loops.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.running.as_ref().is_some_and(|r| !r.handle.is_finished())
    }

    /// Start a new loop, stopping the current one first.
    pub async fn start(&mut self) {
        if self.running.is_some() {
            self.stop().await;
        }

        let (cancel, cancel_rx) = watch::channel(false);
        self.ctx.round.lock().generate_next = true;

        let guard = LiveGuard::new(&self.live_loops);
        let ctx = self.ctx.clone();
        let handle = tokio::spawn(async move {
            let _guard = guard;
            let result = run_loop(&ctx, cancel_rx).await;
            match &result {
                Err(e) if e.is_cancelled() => debug!("round loop cancelled"),
                Err(e) => error!("round loop failed: {}", e),
                Ok(()) => info!("round loop finished"),
            }
            ctx.round.lock().phase = Phase::Idle;
            result
        });

        info!("round loop started");
        self.running = Some(RunningLoop { cancel, handle });
    }

    /// Cancel the loop and wait for it to wind down. No-op when idle.
    pub async fn stop(&mut self) {
        self.ctx.round.lock().generate_next = false;

        let Some(running) = self.running.take() else {
            return;
        };
        let _ = running.cancel.send(true);
        match running.handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) if e.is_cancelled() => {}
            // already logged by the task
            Ok(Err(_)) => {}
            Err(e) => warn!("round loop task did not complete: {}", e),
        }
        info!("round loop stopped");
    }
}

/// Resolve once cancellation is raised or its sender is gone.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            return;
        }
    }
}

async fn sleep_or_cancel(cancel: &mut watch::Receiver<bool>, duration: Duration) -> Result<()> {
    tokio::select! {
        biased;
        _ = cancelled(cancel) => Err(Error::Cancelled),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}

async fn run_loop(ctx: &Arc<GameContext>, mut cancel: watch::Receiver<bool>) -> Result<()> {
    loop {
        if *cancel.borrow() {
            return Err(Error::Cancelled);
        }
        if !ctx.transport.is_connected() {
            warn!("transport disconnected, leaving round loop");
            return Ok(());
        }

        let triggered = {
            let mut round = ctx.round.lock();
            if round.generate_next {
                round.generate_next = false;
                round.dig_permitted = false;
                round.treasures.clear();
                true
            } else {
                if round.phase == Phase::Idle {
                    round.phase = Phase::WaitForTrigger;
                }
                false
            }
        };

        if triggered {
            run_round(ctx, &mut cancel).await?;
        } else {
            sleep_or_cancel(&mut cancel, ctx.config.round.poll_interval()).await?;
        }
    }
}

fn set_phase(ctx: &GameContext, phase: Phase) {
    ctx.round.lock().phase = phase;
}

async fn run_round(ctx: &Arc<GameContext>, cancel: &mut watch::Receiver<bool>) -> Result<()> {
    let timings = &ctx.config.round;
    let seed = rand::thread_rng().gen_range(0..SEED_RANGE);
    info!(seed, "preparing new round");

    sleep_or_cancel(cancel, timings.pre_generation_delay()).await?;

    set_phase(ctx, Phase::GenerateWorld);
    let (width, height) = (ctx.config.world_width, ctx.config.world_height);
    let generation = tokio::task::spawn_blocking(move || cave_mapgen::generate(seed, width, height));
    let world = tokio::select! {
        biased;
        _ = cancelled(cancel) => return Err(Error::Cancelled),
        joined = generation => joined.map_err(|e| Error::Generation(e.to_string()))?,
    };

    set_phase(ctx, Phase::PlaceTreasures);
    let count = treasure_count(ctx.players.read().len());
    let mut map = world.map;
    let mut rng = ChaCha8Rng::seed_from_u64(seed as u64);
    let treasures = place_treasures(&mut map, count, &mut rng, timings.max_treasure_attempts)?;
    debug!(?treasures, "treasures placed");

    {
        let mut round = ctx.round.lock();
        round.treasures = treasures;
        round.seed = Some(seed);
        round.spawn = Some((world.spawn_x, world.spawn_y));
        round.phase = Phase::RevealSpawn;
    }

    ctx.transport.send_chat("/clearworld", false)?;
    ctx.vision.attach(map);
    ctx.vision.hide_all()?;
    ctx.vision.flood_discovery(world.spawn_x, world.spawn_y - 1);
    ctx.vision.send_block_update()?;

    sleep_or_cancel(cancel, timings.post_reveal_delay()).await?;

    set_phase(ctx, Phase::Announce);
    ctx.transport.send_chat("/resetplayer @a", false)?;
    ctx.transport
        .send_chat(&format!("Find the treasure! {} have been hidden. Good luck!", count), true)?;
    let winner = ctx.round.lock().last_winner.clone();
    if let Some(winner) = winner {
        ctx.transport.send_chat(&format!("/givecrown #{}", winner.id), false)?;
    }

    sleep_or_cancel(cancel, timings.dig_unlock_delay()).await?;

    {
        let mut round = ctx.round.lock();
        round.dig_permitted = true;
        round.phase = Phase::WaitForOutcome;
    }
    info!(seed, treasures = count, "round running, digging allowed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tokio_test::assert_ok;

    use cave_mapgen::{to_wire_y, Layer, Tile};

    use crate::client::{OutboundMessage, Transport};
    use crate::config::{BotConfig, RoundConfig};
    use crate::game::test_support::context;

    async fn wait_for<F: Fn() -> bool>(condition: F) {
        let waited = tokio::time::timeout(Duration::from_secs(30), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert_ok!(waited);
    }

    #[tokio::test]
    async fn test_stop_when_idle() {
        let (ctx, _) = context(BotConfig::default());
        let mut orchestrator = RoundOrchestrator::new(ctx);
        orchestrator.stop().await;
        assert_eq!(orchestrator.live_loops(), 0);
        assert!(!orchestrator.is_running());
    }

    #[tokio::test]
    async fn test_start_twice_keeps_one_loop() {
        // long delays keep the loop parked in a cancellable sleep
        let (ctx, _) = context(BotConfig::default());
        let mut orchestrator = RoundOrchestrator::new(ctx.clone());

        orchestrator.start().await;
        assert_eq!(orchestrator.live_loops(), 1);
        orchestrator.start().await;
        assert_eq!(orchestrator.live_loops(), 1);
        assert!(ctx.round.lock().generate_next);

        orchestrator.stop().await;
        assert_eq!(orchestrator.live_loops(), 0);
        assert!(!ctx.round.lock().generate_next);
    }

    #[tokio::test]
    async fn test_full_round() {
        let config = BotConfig {
            round: RoundConfig::immediate(),
            ..BotConfig::default()
        };
        let (ctx, transport) = context(config);
        ctx.round.lock().last_winner = Some(WinnerRef { id: 9, username: "carol".into() });

        let mut orchestrator = RoundOrchestrator::new(ctx.clone());
        orchestrator.start().await;
        wait_for(|| ctx.round.lock().dig_permitted).await;
        orchestrator.stop().await;

        let chats = transport.chats();
        assert_eq!(
            chats,
            vec![
                "/clearworld".to_string(),
                "/resetplayer @a".to_string(),
                "Find the treasure! 6 have been hidden. Good luck!".to_string(),
                "/givecrown #9".to_string(),
            ]
        );

        let round = ctx.round.lock();
        assert_eq!(round.treasures.len(), 6);
        assert!(round.seed.is_some_and(|s| s < SEED_RANGE));
        let (spawn_x, spawn_y) = round.spawn.unwrap_or_default();
        drop(round);

        // fog first, then the spawn area
        let blocks = transport.blocks();
        assert!(blocks.len() > 400 * 200);
        ctx.vision.with_engine(|engine| {
            assert!(engine.is_discovered(spawn_x, spawn_y - 1));
            assert!(engine.discovered_count() < 400 * 200);
        });
    }

    #[tokio::test]
    async fn test_stop_interrupts_pre_generation_delay() {
        let (ctx, _) = context(BotConfig::default());
        let mut orchestrator = RoundOrchestrator::new(ctx.clone());
        orchestrator.start().await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        // the loop sits in the 5 s pre-generation pause
        let stopped = tokio::time::timeout(Duration::from_millis(500), orchestrator.stop()).await;
        assert_ok!(stopped);
        assert_eq!(orchestrator.live_loops(), 0);
        assert_eq!(ctx.round.lock().phase, Phase::Idle);
    }

    #[tokio::test]
    async fn test_placement_failure_ends_loop() {
        // a one-row world leaves no room for a chest
        let config = BotConfig {
            world_width: 10,
            world_height: 1,
            round: RoundConfig {
                max_treasure_attempts: 5,
                ..RoundConfig::immediate()
            },
            ..BotConfig::default()
        };
        let (ctx, transport) = context(config);
        let mut orchestrator = RoundOrchestrator::new(ctx.clone());
        orchestrator.start().await;

        let live = orchestrator.live_loops.clone();
        wait_for(move || live.load(Ordering::SeqCst) == 0).await;
        assert!(!orchestrator.is_running());
        assert!(transport.chats().is_empty());
        {
            let round = ctx.round.lock();
            assert_eq!(round.phase, Phase::Idle);
            assert!(!round.dig_permitted);
            assert!(round.treasures.is_empty());
        }

        // nothing restarts it on its own
        ctx.round.lock().generate_next = true;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(orchestrator.live_loops(), 0);
        orchestrator.stop().await;
    }

    #[tokio::test]
    async fn test_new_round_leaves_no_old_background_under_fog() {
        let config = BotConfig {
            round: RoundConfig::immediate(),
            ..BotConfig::default()
        };
        let (ctx, transport) = context(config);
        let announced = || transport.chats().iter().filter(|c| c.starts_with("Find the treasure!")).count();

        let mut orchestrator = RoundOrchestrator::new(ctx.clone());
        orchestrator.start().await;
        wait_for(|| ctx.round.lock().dig_permitted).await;

        // round one ends with everything on show
        ctx.vision.reveal_all();
        assert_ok!(ctx.vision.send_block_update());
        ctx.round.lock().generate_next = true;
        wait_for(|| announced() == 2 && ctx.round.lock().dig_permitted).await;
        orchestrator.stop().await;

        // replay what the server was told, per wire cell
        let mut background: HashMap<(i32, i32), Tile> = HashMap::new();
        for message in transport.messages() {
            match message {
                OutboundMessage::Chat { text, .. } if text == "/clearworld" => background.clear(),
                OutboundMessage::Blocks { blocks } => {
                    for block in blocks.into_iter().filter(|b| b.layer == Layer::Background) {
                        background.insert((block.x, block.y), block.tile);
                    }
                }
                _ => {}
            }
        }

        ctx.vision.with_engine(|engine| {
            let height = engine.height();
            let mut stale = 0;
            for x in 0..engine.width() as i32 {
                for y in 0..height as i32 {
                    if engine.is_discovered(x, y) {
                        continue;
                    }
                    let shown = background.get(&(x, to_wire_y(height, y))).copied().unwrap_or(Tile::Empty);
                    if shown != Tile::Empty {
                        stale += 1;
                    }
                }
            }
            assert_eq!(stale, 0);
        });
    }

    #[tokio::test]
    async fn test_loop_ends_when_disconnected() {
        let (ctx, transport) = context(BotConfig::default());
        transport.set_connected(false);
        assert!(!transport.is_connected());

        let mut orchestrator = RoundOrchestrator::new(ctx);
        orchestrator.start().await;
        let live = orchestrator.live_loops.clone();
        wait_for(move || live.load(Ordering::SeqCst) == 0).await;
        assert!(!orchestrator.is_running());
        orchestrator.stop().await;
    }
}
