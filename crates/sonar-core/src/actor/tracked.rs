use std::sync::Arc;

use crate::actor::ActorKind;
use crate::error::{Error, Result};
use crate::memory::layout::{Layout, Precision};
use crate::memory::{Field, ReadMemory, Shape, TextEncoding, checked_offset, utf16_byte_len};

/// Current and maximum health.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    /// `current / max` clamped to `0..=1`; zero when max is zero.
    pub fn fraction(&self) -> f32 {
        if self.max == 0.0 || !self.max.is_finite() {
            return 0.0;
        }
        let fraction = self.current / self.max;
        if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        }
    }
}

/// Variant-specific state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActorDetail {
    Generic,
    Mesh,
    Npc { health: Health },
    Player { health: Health, is_ghost: bool },
}

impl ActorDetail {
    fn initial(kind: ActorKind) -> Self {
        match kind {
            ActorKind::Generic => ActorDetail::Generic,
            ActorKind::Mesh => ActorDetail::Mesh,
            ActorKind::Npc => ActorDetail::Npc {
                health: Health::default(),
            },
            ActorKind::Player => ActorDetail::Player {
                health: Health::default(),
                is_ghost: false,
            },
        }
    }

    pub fn health(&self) -> Option<Health> {
        match *self {
            ActorDetail::Npc { health } | ActorDetail::Player { health, .. } => Some(health),
            ActorDetail::Generic | ActorDetail::Mesh => None,
        }
    }
}

/// One live actor in the target. The address never changes; everything
/// else is replaced by [`TrackedActor::refresh`].
#[derive(Debug, Clone)]
pub struct TrackedActor {
    address: u64,
    kind: ActorKind,
    type_name: Arc<str>,
    name: String,
    position: [f64; 3],
    detail: ActorDetail,
}

struct Refreshed {
    name: Option<String>,
    position: [f64; 3],
    detail: ActorDetail,
}

impl TrackedActor {
    /// Performs no reads; state is filled in by the first refresh.
    pub fn new(address: u64, kind: ActorKind, type_name: Arc<str>) -> Self {
        Self {
            address,
            kind,
            name: type_name.to_string(),
            type_name,
            position: [0.0; 3],
            detail: ActorDetail::initial(kind),
        }
    }

    pub fn address(&self) -> u64 {
        self.address
    }

    pub fn kind(&self) -> ActorKind {
        self.kind
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Display name, falling back to the type name when the target's
    /// string is empty.
    pub fn name(&self) -> &str {
        if self.name.is_empty() {
            &self.type_name
        } else {
            &self.name
        }
    }

    pub fn position(&self) -> [f64; 3] {
        self.position
    }

    pub fn detail(&self) -> &ActorDetail {
        &self.detail
    }

    pub fn health(&self) -> Option<Health> {
        self.detail.health()
    }

    pub fn is_ghost(&self) -> bool {
        matches!(self.detail, ActorDetail::Player { is_ghost: true, .. })
    }

    /// Re-read position and variant state. On any fault the actor is left
    /// unchanged and [`Error::EntityInvalid`] is returned.
    pub fn refresh<R: ReadMemory>(&mut self, reader: &R, layout: &Layout) -> Result<()> {
        let state = self
            .read_state(reader, layout)
            .map_err(|e| Error::entity_invalid(self.address, e))?;

        if let Some(name) = state.name {
            self.name = name;
        }
        self.position = state.position;
        self.detail = state.detail;
        Ok(())
    }

    fn read_state<R: ReadMemory>(&self, reader: &R, layout: &Layout) -> Result<Refreshed> {
        let at = |offset: u64| checked_offset(self.address, offset);
        let root = reader.read_ptr(at(layout.root_component)?)?;
        let position = read_position(
            reader,
            checked_offset(root, layout.root_position)?,
            layout.position_precision,
        )?;

        let (name, detail) = match self.detail {
            ActorDetail::Generic => {
                let name = match layout.actor_name {
                    Some(offset) => Some(read_name_pair(reader, at(offset)?)?),
                    None => None,
                };
                (name, ActorDetail::Generic)
            }
            ActorDetail::Mesh => (
                Some(read_name_pair(reader, at(layout.mesh_name)?)?),
                ActorDetail::Mesh,
            ),
            ActorDetail::Npc { .. } => {
                let name = read_name_pair(reader, at(layout.creature_name)?)?;
                let health = read_health(reader, at(layout.health)?)?;
                (Some(name), ActorDetail::Npc { health })
            }
            ActorDetail::Player { .. } => {
                let name = read_name_pair(reader, at(layout.creature_name)?)?;
                let health = read_health(reader, at(layout.health)?)?;
                let is_ghost = reader.read_bool(at(layout.is_ghost)?)?;
                (Some(name), ActorDetail::Player { health, is_ghost })
            }
        };

        Ok(Refreshed {
            name,
            position,
            detail,
        })
    }
}

fn read_position<R: ReadMemory>(reader: &R, address: u64, precision: Precision) -> Result<[f64; 3]> {
    let field = match precision {
        Precision::F64 => Field::F64,
        Precision::F32 => Field::F32,
    };
    let record = reader.read(address, &Shape::repeat(field, 3))?;
    Ok([record.f64(0)?, record.f64(1)?, record.f64(2)?])
}

fn read_health<R: ReadMemory>(reader: &R, address: u64) -> Result<Health> {
    let record = reader.read(address, &Shape::new(&[Field::F32, Field::F32]))?;
    Ok(Health {
        current: record.f64(0)? as f32,
        max: record.f64(1)? as f32,
    })
}

/// A UTF-16 string referenced by a pointer followed by a u8 character
/// count that includes the terminator.
fn read_name_pair<R: ReadMemory>(reader: &R, address: u64) -> Result<String> {
    let pair = reader.read(address, &Shape::new(&[Field::U64, Field::U8]))?;
    let ptr = pair.u64(0)?;
    let count = pair.u64(1)? as u32;
    reader.read_fixed_string(ptr, utf16_byte_len(count), TextEncoding::Utf16Le)
}
