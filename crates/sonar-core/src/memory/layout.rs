//! Memory layout constants for the supported target build
//!
//! Byte offsets into the engine structures the radar walks. They must match
//! the target build exactly; [`Layout`] carries them at runtime so a config
//! file can override individual values after a game update.

use serde::{Deserialize, Serialize};

/// World → level → actor array
pub mod world {
    /// UWorld.PersistentLevel
    pub const PERSISTENT_LEVEL: u64 = 0x30;
    /// ULevel.Actors (TArray: data pointer, then i32 count)
    pub const ACTOR_ARRAY: u64 = 0xB0;
    /// UWorld.OwningGameInstance
    pub const OWNING_GAME_INSTANCE: u64 = 0x1D8;
}

/// GameInstance → LocalPlayer → PlayerController → camera
pub mod local {
    /// UGameInstance.LocalPlayers (TArray data pointer)
    pub const LOCAL_PLAYERS: u64 = 0x38;
    /// ULocalPlayer.PlayerController
    pub const PLAYER_CONTROLLER: u64 = 0x30;
    /// APlayerController.PlayerCameraManager
    pub const PLAYER_CAMERA_MANAGER: u64 = 0x348;
    /// APlayerCameraManager.CameraCachePrivate (POV: 3 x f64 location,
    /// 3 x f64 rotation, f32 fov)
    pub const CAMERA_CACHE_PRIVATE: u64 = 0x13A0;
    /// APlayerController.AcknowledgedPawn
    pub const ACKNOWLEDGED_PAWN: u64 = 0x338;
}

/// Per-actor fields
pub mod actor {
    /// UObjectBase.NamePrivate (two u16: slot, block)
    pub const FNAME: u64 = 0x18;
    /// AActor.RootComponent
    pub const ROOT_COMPONENT: u64 = 0x1A0;
    /// USceneComponent.RelativeLocation
    pub const ROOT_POSITION: u64 = 0xF0;
    /// Player ghost flag (bool)
    pub const IS_GHOST: u64 = 0x678;
    /// Creature display name (pointer + u8 char count)
    pub const CREATURE_NAME: u64 = 0xC90;
    /// Health (f32 current, f32 max)
    pub const HEALTH: u64 = 0xCD0;
    /// Static mesh display name (pointer + u8 char count)
    pub const MESH_NAME: u64 = 0x2E8;
}

/// Name pool
pub mod names {
    /// Size of one block pointer in the pool's block table
    pub const BLOCK_POINTER_SIZE: u64 = 8;
    /// Entries are addressed in units of this stride
    pub const SLOT_STRIDE: u64 = 2;
    /// Header length bits start here
    pub const HEADER_LEN_SHIFT: u32 = 6;
    /// Header bit marking a UTF-16 entry
    pub const HEADER_WIDE_BIT: u16 = 0x1;
    /// Header size in bytes
    pub const HEADER_SIZE: u64 = 2;
}

/// Sanity bound on the actor array length
pub const MAX_ACTORS: i32 = 0xFFFF;

/// Width of world-space coordinates in the target build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    F32,
    #[default]
    F64,
}

/// Runtime copy of the offsets above.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    pub persistent_level: u64,
    pub actor_array: u64,
    pub owning_game_instance: u64,
    pub local_players: u64,
    pub player_controller: u64,
    pub player_camera_manager: u64,
    pub camera_cache_private: u64,
    pub acknowledged_pawn: u64,
    pub actor_fname: u64,
    pub root_component: u64,
    pub root_position: u64,
    pub is_ghost: u64,
    pub creature_name: u64,
    pub health: u64,
    pub mesh_name: u64,
    /// Name pointer + count on generic actors; unset means "use the type name"
    pub actor_name: Option<u64>,
    pub position_precision: Precision,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            persistent_level: world::PERSISTENT_LEVEL,
            actor_array: world::ACTOR_ARRAY,
            owning_game_instance: world::OWNING_GAME_INSTANCE,
            local_players: local::LOCAL_PLAYERS,
            player_controller: local::PLAYER_CONTROLLER,
            player_camera_manager: local::PLAYER_CAMERA_MANAGER,
            camera_cache_private: local::CAMERA_CACHE_PRIVATE,
            acknowledged_pawn: local::ACKNOWLEDGED_PAWN,
            actor_fname: actor::FNAME,
            root_component: actor::ROOT_COMPONENT,
            root_position: actor::ROOT_POSITION,
            is_ghost: actor::IS_GHOST,
            creature_name: actor::CREATURE_NAME,
            health: actor::HEALTH,
            mesh_name: actor::MESH_NAME,
            actor_name: None,
            position_precision: Precision::F64,
        }
    }
}

/// Timing constants for polling and retry
pub mod timing {
    use std::time::Duration;

    /// Default radar refresh rate
    pub const DEFAULT_FPS: u32 = 30;

    /// Delay between attempts while the world is unreadable
    pub const WORLD_RETRY_DELAY: Duration = Duration::from_millis(100);

    /// Attempts before the world is declared unrecoverable (30 s at the default delay)
    pub const WORLD_RETRY_ATTEMPTS: u32 = 300;
}
