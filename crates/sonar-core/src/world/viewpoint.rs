use crate::error::Result;
use crate::memory::layout::{Layout, Precision};
use crate::memory::{Field, ReadMemory, Shape, checked_offset};

/// Camera rotation in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rotation {
    pub pitch: f64,
    pub yaw: f64,
    pub roll: f64,
}

/// Local camera and controlled pawn, rebuilt every poll.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Viewpoint {
    pub position: [f64; 3],
    pub rotation: Rotation,
    pub fov: f32,
    /// Address of the pawn the local controller possesses (0 when none)
    pub pawn: u64,
}

impl Viewpoint {
    /// Follow world → game instance → first local player → controller, then
    /// read the cached camera POV and the acknowledged pawn.
    pub fn read<R: ReadMemory>(reader: &R, world: u64, layout: &Layout) -> Result<Self> {
        let game_instance = reader.read_ptr(checked_offset(world, layout.owning_game_instance)?)?;
        let local_players = reader.read_ptr(checked_offset(game_instance, layout.local_players)?)?;
        let local_player = reader.read_ptr(local_players)?;
        let controller = reader.read_ptr(checked_offset(local_player, layout.player_controller)?)?;
        let camera = reader.read_ptr(checked_offset(controller, layout.player_camera_manager)?)?;

        let pov = reader.read(
            checked_offset(camera, layout.camera_cache_private)?,
            &pov_shape(layout),
        )?;
        let pawn = reader.read_u64(checked_offset(controller, layout.acknowledged_pawn)?)?;

        Ok(Self {
            position: [pov.f64(0)?, pov.f64(1)?, pov.f64(2)?],
            rotation: Rotation {
                pitch: pov.f64(3)?,
                yaw: pov.f64(4)?,
                roll: pov.f64(5)?,
            },
            fov: pov.f64(6)? as f32,
            pawn,
        })
    }
}

/// Location, rotation, then an f32 field of view.
fn pov_shape(layout: &Layout) -> Shape {
    let component = match layout.position_precision {
        Precision::F64 => Field::F64,
        Precision::F32 => Field::F32,
    };
    let mut fields = vec![component; 6];
    fields.push(Field::F32);
    Shape::new(&fields)
}
