//! Game logic on top of the discovery engine: the round loop, dig handling
//! and the inbound event table.

pub mod dig;
pub mod round;
pub mod treasure;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use cave_mapgen::from_wire_y;

use crate::client::{AdminCommand, EventKind, InboundEvent, Transport};
use crate::config::BotConfig;
use crate::discovery::Vision;
use crate::error::{Error, Result};
use crate::state::PlayerDirectory;

pub use dig::{DigOutcome, DIG_REVEAL_SIZE};
pub use round::{Phase, RoundOrchestrator, RoundState, WinnerRef, SEED_RANGE};
pub use treasure::{place_treasures, treasure_count};

/// Everything the loop and the handlers share
pub struct GameContext {
    pub config: BotConfig,
    pub transport: Arc<dyn Transport>,
    pub players: RwLock<PlayerDirectory>,
    pub vision: Vision,
    pub round: Mutex<RoundState>,
}

impl GameContext {
    pub fn new(config: BotConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            vision: Vision::new(transport.clone()),
            transport,
            players: RwLock::new(PlayerDirectory::new()),
            round: Mutex::new(RoundState::default()),
        }
    }
}

/// Work a handler hands back to the async dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Start,
    Stop,
    /// Send a whole world as a preview, outside any round
    Generate { seed: u32 },
}

/// Synchronous event handler
pub type Handler = fn(&GameContext, &InboundEvent) -> Result<Option<Control>>;

/// The bot: shared context, the round loop and the handler table
pub struct CaveBot {
    ctx: Arc<GameContext>,
    orchestrator: tokio::sync::Mutex<RoundOrchestrator>,
    handlers: HashMap<EventKind, Handler>,
}

impl CaveBot {
    pub fn new(config: BotConfig, transport: Arc<dyn Transport>) -> Self {
        let ctx = Arc::new(GameContext::new(config, transport));

        let mut handlers: HashMap<EventKind, Handler> = HashMap::new();
        handlers.insert(EventKind::PlayerJoined, on_player_joined);
        handlers.insert(EventKind::PlayerLeft, on_player_left);
        handlers.insert(EventKind::PlayerChat, on_player_chat);
        handlers.insert(EventKind::PlayerMoved, on_player_moved);
        handlers.insert(EventKind::PlayerGodMode, on_player_god_mode);
        handlers.insert(EventKind::SystemMessage, on_system_message);

        Self {
            orchestrator: tokio::sync::Mutex::new(RoundOrchestrator::new(ctx.clone())),
            ctx,
            handlers,
        }
    }

    pub fn context(&self) -> &Arc<GameContext> {
        &self.ctx
    }

    /// Wipe whatever the world held before the bot joined.
    pub fn setup(&self) -> Result<()> {
        self.ctx.transport.send_chat("/clearworld", false)
    }

    pub async fn start(&self) {
        self.orchestrator.lock().await.start().await;
    }

    pub async fn stop(&self) {
        self.orchestrator.lock().await.stop().await;
    }

    pub async fn live_loops(&self) -> usize {
        self.orchestrator.lock().await.live_loops()
    }

    /// Update the player directory, run the handler for the event and carry
    /// out whatever it asks for.
    pub async fn dispatch(&self, event: &InboundEvent) -> Result<()> {
        if !matches!(event, InboundEvent::PlayerLeft { .. }) {
            self.ctx.players.write().apply(event);
        }

        let control = match self.handlers.get(&event.kind()) {
            Some(handler) => handler(&self.ctx, event)?,
            None => None,
        };

        // leaving players are dropped after their handler saw them
        if matches!(event, InboundEvent::PlayerLeft { .. }) {
            self.ctx.players.write().apply(event);
        }

        match control {
            Some(Control::Start) => self.start().await,
            Some(Control::Stop) => self.stop().await,
            Some(Control::Generate { seed }) => {
                let ctx = self.ctx.clone();
                tokio::spawn(async move {
                    if let Err(e) = preview(&ctx, seed).await {
                        warn!("preview generation failed: {}", e);
                    }
                });
            }
            None => {}
        }
        Ok(())
    }
}

/// Generate a world outside the round loop, show all of it and put players
/// back at spawn.
pub async fn preview(ctx: &GameContext, seed: u32) -> Result<()> {
    let (width, height) = (ctx.config.world_width, ctx.config.world_height);
    let world = tokio::task::spawn_blocking(move || cave_mapgen::generate(seed, width, height))
        .await
        .map_err(|e| Error::Generation(e.to_string()))?;
    info!(seed, spawn_x = world.spawn_x, spawn_y = world.spawn_y, "sending preview world");

    ctx.transport.send_batch(world.map.placements())?;
    ctx.vision.attach(world.map);

    tokio::time::sleep(ctx.config.round.preview_reset_delay()).await;
    ctx.transport.send_chat("/resetplayer @a", false)
}

fn on_player_joined(_ctx: &GameContext, event: &InboundEvent) -> Result<Option<Control>> {
    if let InboundEvent::PlayerJoined { player_id, username, .. } = event {
        info!(player_id, username = %username, "player joined");
    }
    Ok(None)
}

fn on_player_left(ctx: &GameContext, event: &InboundEvent) -> Result<Option<Control>> {
    if let InboundEvent::PlayerLeft { player_id } = event {
        let players = ctx.players.read();
        let username = players.get(*player_id).map(|p| p.username.as_str()).unwrap_or("?");
        info!(player_id, username, "player left");
    }
    Ok(None)
}

fn on_player_moved(ctx: &GameContext, event: &InboundEvent) -> Result<Option<Control>> {
    if let InboundEvent::PlayerMoved { player_id, position, horizontal, vertical } = event {
        dig::handle_move(ctx, *player_id, *position, *horizontal, *vertical)?;
    }
    Ok(None)
}

fn on_player_god_mode(_ctx: &GameContext, event: &InboundEvent) -> Result<Option<Control>> {
    if let InboundEvent::PlayerGodMode { player_id, enabled } = event {
        debug!(player_id, enabled, "god mode toggled");
    }
    Ok(None)
}

fn on_system_message(_ctx: &GameContext, event: &InboundEvent) -> Result<Option<Control>> {
    if let InboundEvent::SystemMessage { text } = event {
        debug!(text = %text, "system message");
    }
    Ok(None)
}

fn on_player_chat(ctx: &GameContext, event: &InboundEvent) -> Result<Option<Control>> {
    let InboundEvent::PlayerChat { player_id, text } = event else {
        return Ok(None);
    };
    let Some(player) = ctx.players.read().get(*player_id).cloned() else {
        return Ok(None);
    };
    let Some(command) = AdminCommand::parse(text) else {
        return Ok(None);
    };
    if !ctx.config.is_admin(&player.username) {
        warn!(player = %player.username, command = %text, "command from non-admin ignored");
        return Ok(None);
    }

    if let Some(ack) = command.acknowledgement() {
        ctx.transport.send_direct_message(&player.username, ack)?;
    }

    match command {
        AdminCommand::Generate { seed } => return Ok(Some(Control::Generate { seed })),
        AdminCommand::Start => return Ok(Some(Control::Start)),
        AdminCommand::Stop => return Ok(Some(Control::Stop)),
        AdminCommand::Hide => ctx.vision.hide_all()?,
        AdminCommand::ShowAll => {
            ctx.vision.reveal_all();
            ctx.vision.send_block_update()?;
        }
        AdminCommand::ShowTreasure => {
            let treasures = ctx.round.lock().treasures.clone();
            dig::reveal_treasures(ctx, &treasures)?;
        }
        AdminCommand::Discover => {
            let (x, wire_y) = player.position.tile();
            ctx.vision.update(|engine| {
                if let Some(y) = from_wire_y(engine.height(), wire_y) {
                    engine.flood_discovery(x, y);
                }
            })?;
        }
        AdminCommand::Resend => ctx.vision.resend()?,
        AdminCommand::ToggleDig => {
            let permitted = {
                let mut round = ctx.round.lock();
                round.dig_permitted = !round.dig_permitted;
                round.dig_permitted
            };
            let state = if permitted { "enabled" } else { "disabled" };
            ctx.transport.send_chat(&format!("Digging is now {}.", state), true)?;
        }
    }
    Ok(None)
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio_test::assert_ok;

    use cave_mapgen::{to_wire_y, Tile, WorldMap};

    use crate::client::RecordingTransport;
    use crate::config::RoundConfig;
    use crate::state::PixelPosition;

    fn bot() -> (CaveBot, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport::new());
        let config = BotConfig {
            admin_username: "Admin".into(),
            round: RoundConfig::immediate(),
            ..BotConfig::default()
        };
        (CaveBot::new(config, transport.clone()), transport)
    }

    fn joined(id: u32, username: &str, tile: (i32, i32)) -> InboundEvent {
        InboundEvent::PlayerJoined {
            player_id: id,
            username: username.into(),
            position: PixelPosition::from_tile(tile.0, tile.1),
            godmode: false,
        }
    }

    fn chat(id: u32, text: &str) -> InboundEvent {
        InboundEvent::PlayerChat { player_id: id, text: text.into() }
    }

    #[test]
    fn test_every_event_has_a_handler() {
        let (bot, _) = bot();
        for kind in EventKind::ALL {
            assert!(bot.handlers.contains_key(&kind), "{:?}", kind);
        }
    }

    #[test]
    fn test_setup_clears_world() {
        let (bot, transport) = bot();
        bot.setup().unwrap();
        assert_eq!(transport.chats(), vec!["/clearworld".to_string()]);
        assert!(transport.blocks().is_empty());
    }

    #[tokio::test]
    async fn test_directory_follows_events() {
        let (bot, _) = bot();
        assert_ok!(bot.dispatch(&joined(1, "alice", (0, 0))).await);
        assert_ok!(bot.dispatch(&joined(2, "bob", (0, 0))).await);
        assert_eq!(bot.context().players.read().len(), 2);

        assert_ok!(bot.dispatch(&InboundEvent::PlayerLeft { player_id: 1 }).await);
        let players = bot.context().players.read();
        assert_eq!(players.len(), 1);
        assert!(players.find_by_name("BOB").is_some());
    }

    #[tokio::test]
    async fn test_non_admin_commands_ignored() {
        let (bot, transport) = bot();
        assert_ok!(bot.dispatch(&joined(3, "mallory", (0, 0))).await);
        assert_ok!(bot.dispatch(&chat(3, ".allow")).await);
        assert_ok!(bot.dispatch(&chat(3, ".start")).await);

        assert!(transport.messages().is_empty());
        assert!(!bot.context().round.lock().dig_permitted);
        assert_eq!(bot.live_loops().await, 0);
    }

    #[tokio::test]
    async fn test_toggle_dig() {
        let (bot, transport) = bot();
        assert_ok!(bot.dispatch(&joined(1, "admin", (0, 0))).await);
        assert_ok!(bot.dispatch(&chat(1, ".allow")).await);
        assert!(bot.context().round.lock().dig_permitted);
        assert_ok!(bot.dispatch(&chat(1, ".allow")).await);
        assert!(!bot.context().round.lock().dig_permitted);

        assert_eq!(
            transport.chats(),
            vec!["Digging is now enabled.".to_string(), "Digging is now disabled.".to_string()]
        );
        assert!(transport.direct_messages().is_empty());
    }

    #[tokio::test]
    async fn test_start_and_stop_commands() {
        let (bot, transport) = bot();
        assert_ok!(bot.dispatch(&joined(1, "Admin", (0, 0))).await);

        assert_ok!(bot.dispatch(&chat(1, ".start")).await);
        assert_eq!(bot.live_loops().await, 1);
        assert_ok!(bot.dispatch(&chat(1, ".start")).await);
        assert_eq!(bot.live_loops().await, 1);
        assert_ok!(bot.dispatch(&chat(1, ".stop")).await);
        assert_eq!(bot.live_loops().await, 0);

        let acks: Vec<String> = transport.direct_messages().into_iter().map(|(_, text)| text).collect();
        assert_eq!(acks, vec!["Starting game loop.", "Starting game loop.", "Stopping game loop."]);
    }

    #[tokio::test]
    async fn test_hide_show_and_discover() {
        let (bot, transport) = bot();
        let ctx = bot.context().clone();
        let mut map = WorldMap::new(10, 10);
        for y in 0..10 {
            map.place(5, y, Tile::BrickGray, None);
        }
        ctx.vision.attach(map);

        // admin stands in the left half, generation (2, 2)
        assert_ok!(bot.dispatch(&joined(1, "admin", (2, to_wire_y(10, 2)))).await);
        assert_ok!(bot.dispatch(&chat(1, ".discover")).await);
        ctx.vision.with_engine(|e| {
            assert!(e.is_discovered(0, 9));
            assert!(e.is_discovered(5, 0));
            assert!(e.is_discovered(6, 5));
            assert!(!e.is_discovered(8, 5));
        });

        assert_ok!(bot.dispatch(&chat(1, ".hide")).await);
        assert_eq!(ctx.vision.with_engine(|e| e.discovered_count()), 0);

        assert_ok!(bot.dispatch(&chat(1, ".show")).await);
        assert_eq!(ctx.vision.with_engine(|e| e.discovered_count()), 100);

        transport.clear();
        assert_ok!(bot.dispatch(&chat(1, ".resend")).await);
        assert_eq!(transport.blocks().len(), 200);
    }

    #[tokio::test]
    async fn test_show_treasure() {
        let (bot, _) = bot();
        let ctx = bot.context().clone();
        ctx.vision.attach(WorldMap::new(20, 20));
        ctx.round.lock().treasures = vec![(10, 10)];

        assert_ok!(bot.dispatch(&joined(1, "admin", (0, 0))).await);
        assert_ok!(bot.dispatch(&chat(1, ".show treasure")).await);
        ctx.vision.with_engine(|e| {
            assert_eq!(e.discovered_count(), 25);
            assert!(e.is_discovered(12, 8));
        });
    }

    #[tokio::test]
    async fn test_preview_sends_map_then_resets() {
        let (bot, transport) = bot();
        let ctx = bot.context().clone();
        assert_ok!(preview(&ctx, 1000).await);

        let messages = transport.messages();
        let blocks = transport.blocks();
        assert_eq!(blocks.len(), 2 * 400 * 200);
        assert_eq!(transport.chats(), vec!["/resetplayer @a".to_string()]);
        assert!(matches!(messages.last(), Some(crate::client::OutboundMessage::Chat { .. })));
        assert_eq!(ctx.vision.with_engine(|e| e.width()), 400);
    }

    #[tokio::test]
    async fn test_generate_command_runs_in_background() {
        let (bot, transport) = bot();
        assert_ok!(bot.dispatch(&joined(1, "admin", (0, 0))).await);
        assert_ok!(bot.dispatch(&chat(1, ".generate 42")).await);

        let done = tokio::time::timeout(Duration::from_secs(30), async {
            while transport.chats().is_empty() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert_ok!(done);
        assert_eq!(transport.direct_messages()[0].1, "Generating world.");
    }

    #[tokio::test]
    async fn test_treasure_dig_through_dispatch() {
        let (bot, transport) = bot();
        let ctx = bot.context().clone();
        let mut map = WorldMap::new(10, 10);
        map.place(6, 4, Tile::TREASURE, None);
        ctx.vision.attach(map);
        ctx.vision.discover_tile(6, 4);
        {
            let mut round = ctx.round.lock();
            round.dig_permitted = true;
            round.treasures = vec![(6, 4)];
        }

        let start = PixelPosition::from_tile(5, to_wire_y(10, 4));
        assert_ok!(bot.dispatch(&joined(4, "dora", (0, 0))).await);
        assert_ok!(
            bot.dispatch(&InboundEvent::PlayerMoved {
                player_id: 4,
                position: start,
                horizontal: 1,
                vertical: 0,
            })
            .await
        );

        assert!(transport.chats().contains(&"The treasure was found by dora!".to_string()));
        assert!(ctx.round.lock().generate_next);
    }
}
