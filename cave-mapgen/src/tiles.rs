use serde::{Deserialize, Serialize};

/// Tile identifiers placed by the generator and the game loop.
///
/// Names follow the block catalogue of the game server so they can be sent
/// over the wire as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Tile {
    #[default]
    Empty,
    /// Fog tile shown over everything that has not been discovered yet
    GenericBlackTransparent,

    // Terrain
    GrassBrickMiddle,
    BrickBrown,
    BrickOlive,
    BrickGray,
    BrickBlack,
    StoneGray,
    StoneBlue,
    StoneGreen,

    // Ores
    MineralsOrange,
    MineralsGreen,
    MineralsCyan,

    // Liquids
    LiquidLava,
    LiquidMud,
    LiquidWater,
    LiquidWaste,

    // Trees and clouds
    FactoryWood,
    DomesticWood,
    EnvironmentLog,
    BasicGreen,
    GardenLeaves,
    BrickGreen,
    KeyGreenDoor,
    CloudWhiteCenter,

    // Surface props
    MeadowYellowFlower,
    MeadowSmallBush,
    BeachDryBush,
    FairytaleFlowerPink,
    FairytaleFlowerOrange,
    FairytaleFlowerBlue,
    FairytaleMushroomDecorationOrange,
    FairytaleMushroomDecorationRed,

    // Markers
    GenericYellow,
    GenericStripedHazardBlack,
    ToolSpawnLobby,
    BeveledYellow,
    BeveledGreen,
    BeveledCyan,
    BeveledMagenta,
    PirateChestBrown,
    GravityDot,
    ClimbableLadderWood,
    ClimbableLadderMetal,

    // Background layer
    GardenGrassBg,
    BrickBrownBg,
    BrickOliveBg,
    BrickGrayBg,
    PastelBlueBg,
    StoneGrayBg,
    StoneBlueBg,
    StoneGreenBg,
    LavaDarkRedBg,
    MedievalWoodBg,
    EnvironmentLogBg,
    BasicGreenBg,
    GardenLeavesBg,
    BrickGreenBg,
    PirateWoodPlankDarkBrownBg,
}

impl Tile {
    /// Alias for the fog tile
    pub const HIDDEN: Tile = Tile::GenericBlackTransparent;

    /// The treasure chest players are hunting for
    pub const TREASURE: Tile = Tile::PirateChestBrown;

    /// Anything but empty air and climbing dots blocks movement and floods.
    pub fn is_solid(self) -> bool {
        !matches!(self, Tile::Empty | Tile::GravityDot)
    }

    /// Whether a player is allowed to dig this tile away.
    pub fn can_dig(self) -> bool {
        !matches!(
            self,
            Tile::Empty
                | Tile::LiquidLava
                | Tile::LiquidMud
                | Tile::LiquidWater
                | Tile::LiquidWaste
                | Tile::ClimbableLadderWood
                | Tile::ClimbableLadderMetal
                | Tile::ToolSpawnLobby
                | Tile::BeveledYellow
                | Tile::BeveledGreen
                | Tile::BeveledCyan
                | Tile::BeveledMagenta
                | Tile::GravityDot
        )
    }

    pub fn is_treasure(self) -> bool {
        self == Tile::TREASURE
    }
}

/// Floor variants placed under a treasure chest, one picked per chest.
pub const TREASURE_FLOORS: [Tile; 3] = [Tile::BeveledGreen, Tile::BeveledCyan, Tile::BeveledMagenta];
