//! Top-down radar projection, label text and the presenter seam.
//!
//! The tracker computes everything a blip needs (screen offset, label,
//! alpha and variant visuals) and hands it to a [`Presenter`], which only
//! draws.

use crate::actor::{ActorDetail, ActorKind, TrackedActor, contains_any};
use crate::config::ActorsConfig;
use crate::world::Viewpoint;

pub const ZOOM_STEP: f64 = 2000.0;
pub const MIN_RANGE: f64 = 2000.0;
pub const MAX_RANGE: f64 = 100_000.0;

/// Elevation differences below this keep full opacity.
const ALPHA_THRESHOLD: f64 = 500.0;
/// Elevation difference at which opacity bottoms out.
const ALPHA_CEILING: f64 = 4500.0;
const MIN_ALPHA: f64 = 85.0;
const ALPHA_STEP: f64 = 5.0;

/// Elevation differences below this are not shown in labels.
const ELEVATION_LABEL_THRESHOLD: f64 = 450.0;

/// Radar size in pixels and the world distance mapped to its rim.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadarView {
    radius: f64,
    range: f64,
}

impl RadarView {
    pub fn new(window_size: u32, range: f64) -> Self {
        Self {
            radius: window_size as f64 / 2.0,
            range: range.clamp(MIN_RANGE, MAX_RANGE),
        }
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn range(&self) -> f64 {
        self.range
    }

    pub fn zoom_in(&mut self) {
        self.range = (self.range - ZOOM_STEP).max(MIN_RANGE);
    }

    pub fn zoom_out(&mut self) {
        self.range = (self.range + ZOOM_STEP).min(MAX_RANGE);
    }

    /// World units per pixel.
    pub fn scale(&self) -> f64 {
        self.range / self.radius
    }
}

/// Pixel offset from the radar center, y pointing up.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn distance(&self) -> f64 {
        self.x.hypot(self.y)
    }
}

/// Orthographic plan projection that keeps the camera's facing pointing up.
///
/// World x and y are swapped before rotating so the same matrix rotates
/// both actors and the compass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    cos_yaw: f64,
    sin_yaw: f64,
    /// Rotated camera position subtracted from every projected point
    offset: (f64, f64),
    scale: f64,
}

impl ViewTransform {
    pub fn new(view: &Viewpoint, radar: &RadarView) -> Self {
        let (sin_yaw, cos_yaw) = view.rotation.yaw.to_radians().sin_cos();
        let (y, x) = (view.position[0], view.position[1]);
        Self {
            cos_yaw,
            sin_yaw,
            offset: (x * cos_yaw - y * sin_yaw, x * sin_yaw + y * cos_yaw),
            scale: radar.scale(),
        }
    }

    pub fn project(&self, position: [f64; 3]) -> ScreenPoint {
        let (obj_y, obj_x) = (position[0], position[1]);
        let x = obj_x * self.cos_yaw - obj_y * self.sin_yaw - self.offset.0;
        let y = obj_x * self.sin_yaw + obj_y * self.cos_yaw - self.offset.1;
        ScreenPoint {
            x: x / self.scale,
            y: y / self.scale,
        }
    }

    /// Rotate a point already in screen space (compass lines).
    pub fn rotate(&self, x: f64, y: f64) -> ScreenPoint {
        ScreenPoint {
            x: x * self.cos_yaw - y * self.sin_yaw,
            y: x * self.sin_yaw + y * self.cos_yaw,
        }
    }

    /// Camera yaw recovered from the matrix, in `(-180, 180]`.
    pub fn heading_degrees(&self) -> f64 {
        self.sin_yaw.atan2(self.cos_yaw).to_degrees()
    }
}

/// Opacity for an elevation difference: opaque nearby, fading to
/// [`MIN_ALPHA`] far above or below.
pub fn elevation_alpha(delta: f64) -> u8 {
    let slope = (255.0 - MIN_ALPHA) / (ALPHA_CEILING - ALPHA_THRESHOLD);
    let raw = 255.0 - (delta.abs() - ALPHA_THRESHOLD) * slope;
    let stepped = (raw / ALPHA_STEP).round() * ALPHA_STEP;
    stepped.clamp(MIN_ALPHA, 255.0) as u8
}

pub fn elevation_suffix(delta: f64) -> String {
    if delta.abs() < ELEVATION_LABEL_THRESHOLD {
        return String::new();
    }
    let meters = (delta.abs() / 100.0).round();
    if delta < 0.0 {
        format!("\n▾ {}m", meters)
    } else {
        format!("\n▴ {}m", meters)
    }
}

/// Per-actor presentation options fixed at creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlipStyle {
    pub show_health: bool,
    pub invert_label: bool,
}

impl BlipStyle {
    /// Only NPC markers honor the health and label placement lists.
    pub fn for_actor(actor: &TrackedActor, config: &ActorsConfig) -> Self {
        if actor.kind() != ActorKind::Npc {
            return Self::default();
        }
        let type_name = actor.type_name();
        Self {
            show_health: contains_any(type_name, &config.show_health),
            invert_label: contains_any(type_name, &config.invert_label),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Visuals {
    /// Health ring; ghosts are drawn black
    Player { health_fraction: f32, is_ghost: bool },
    /// Diamond marker
    Npc { invert_label: bool },
    /// Cross marker for meshes and generic actors
    Marker,
}

/// Everything a presenter needs to draw one actor for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct BlipFrame {
    pub kind: ActorKind,
    pub screen: ScreenPoint,
    pub label: String,
    pub alpha: u8,
    /// Actor z minus camera z
    pub elevation: f64,
    pub visuals: Visuals,
}

impl BlipFrame {
    pub fn build(
        actor: &TrackedActor,
        style: BlipStyle,
        transform: &ViewTransform,
        view: &Viewpoint,
    ) -> Self {
        let position = actor.position();
        let elevation = position[2] - view.position[2];
        let suffix = elevation_suffix(elevation);

        let (label, visuals) = match *actor.detail() {
            ActorDetail::Player { health, is_ghost } => (
                format!("{}{}", actor.name(), suffix),
                Visuals::Player {
                    health_fraction: health.fraction(),
                    is_ghost,
                },
            ),
            ActorDetail::Npc { health } => {
                let label = if style.show_health {
                    format!(
                        "{}\n({}/{}){}",
                        actor.name(),
                        health.current.round(),
                        health.max.round(),
                        suffix
                    )
                } else {
                    format!("{}{}", actor.name(), suffix)
                };
                (
                    label,
                    Visuals::Npc {
                        invert_label: style.invert_label,
                    },
                )
            }
            ActorDetail::Mesh | ActorDetail::Generic => {
                (format!("{}{}", actor.name(), suffix), Visuals::Marker)
            }
        };

        Self {
            kind: actor.kind(),
            screen: transform.project(position),
            label,
            alpha: elevation_alpha(elevation),
            elevation,
            visuals,
        }
    }
}

/// Drawing backend. Each tracked actor owns exactly one blip from
/// [`Presenter::create`] until it is passed back to [`Presenter::release`].
pub trait Presenter {
    type Blip;

    fn create(&mut self, actor: &TrackedActor, style: BlipStyle) -> Self::Blip;

    fn update(&mut self, blip: &mut Self::Blip, frame: &BlipFrame);

    fn release(&mut self, blip: Self::Blip);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::Rotation;
    use std::sync::Arc;

    fn view_at(position: [f64; 3], yaw: f64) -> Viewpoint {
        Viewpoint {
            position,
            rotation: Rotation {
                yaw,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut radar = RadarView::new(400, 4000.0);
        radar.zoom_in();
        assert_eq!(radar.range(), 2000.0);
        radar.zoom_in();
        assert_eq!(radar.range(), 2000.0);

        let mut radar = RadarView::new(400, 99_000.0);
        radar.zoom_out();
        assert_eq!(radar.range(), MAX_RANGE);
        assert_eq!(radar.radius(), 200.0);
    }

    #[test]
    fn test_project_without_rotation() {
        let radar = RadarView::new(400, 20000.0);
        let transform = ViewTransform::new(&view_at([1000.0, 1000.0, 0.0], 0.0), &radar);

        // camera itself lands at the center
        let center = transform.project([1000.0, 1000.0, 50.0]);
        assert_close(center.x, 0.0);
        assert_close(center.y, 0.0);

        // +world x is straight up, +world y is right
        let ahead = transform.project([2000.0, 1000.0, 0.0]);
        assert_close(ahead.x, 0.0);
        assert_close(ahead.y, 10.0);
        let right = transform.project([1000.0, 3000.0, 0.0]);
        assert_close(right.x, 20.0);
        assert_close(right.y, 0.0);
    }

    #[test]
    fn test_facing_direction_points_up() {
        let radar = RadarView::new(400, 20000.0);
        let transform = ViewTransform::new(&view_at([0.0, 0.0, 0.0], 90.0), &radar);

        // yaw 90 faces +world y
        let ahead = transform.project([0.0, 1000.0, 0.0]);
        assert_close(ahead.x, 0.0);
        assert_close(ahead.y, 10.0);
        assert_close(transform.heading_degrees(), 90.0);
    }

    #[test]
    fn test_elevation_alpha() {
        assert_eq!(elevation_alpha(0.0), 255);
        assert_eq!(elevation_alpha(-500.0), 255);
        assert_eq!(elevation_alpha(2500.0), 170);
        assert_eq!(elevation_alpha(4500.0), 85);
        assert_eq!(elevation_alpha(-10_000.0), 85);
        assert_eq!(elevation_alpha(1234.0) % 5, 0);
    }

    #[test]
    fn test_elevation_suffix() {
        assert_eq!(elevation_suffix(449.0), "");
        assert_eq!(elevation_suffix(-449.0), "");
        assert_eq!(elevation_suffix(1260.0), "\n▴ 13m");
        assert_eq!(elevation_suffix(-500.0), "\n▾ 5m");
    }

    #[test]
    fn test_blip_style_only_for_npcs() {
        let config = ActorsConfig {
            show_health: vec!["Horse".to_string()],
            invert_label: vec!["Horse".to_string()],
            ..Default::default()
        };
        let npc = TrackedActor::new(1, ActorKind::Npc, Arc::from("BP_Horse_C"));
        let style = BlipStyle::for_actor(&npc, &config);
        assert!(style.show_health);
        assert!(style.invert_label);

        let mesh = TrackedActor::new(1, ActorKind::Mesh, Arc::from("SM_Horse_Statue"));
        assert_eq!(BlipStyle::for_actor(&mesh, &config), BlipStyle::default());
    }

    #[test]
    fn test_npc_label_with_health() {
        let radar = RadarView::new(400, 20000.0);
        let view = view_at([0.0, 0.0, 0.0], 0.0);
        let transform = ViewTransform::new(&view, &radar);
        let npc = TrackedActor::new(1, ActorKind::Npc, Arc::from("BP_Horse_C"));
        let style = BlipStyle {
            show_health: true,
            invert_label: false,
        };

        let frame = BlipFrame::build(&npc, style, &transform, &view);
        // never refreshed: empty health, name falls back to the type name
        assert_eq!(frame.label, "BP_Horse_C\n(0/0)");
        assert_eq!(frame.alpha, 255);
        assert_eq!(frame.kind, ActorKind::Npc);
    }

    #[test]
    fn test_player_visuals() {
        let radar = RadarView::new(400, 20000.0);
        let view = view_at([0.0, 0.0, -2000.0], 0.0);
        let transform = ViewTransform::new(&view, &radar);
        let player = TrackedActor::new(1, ActorKind::Player, Arc::from("BP_PlayerCharacter_C"));

        let frame = BlipFrame::build(&player, BlipStyle::default(), &transform, &view);
        assert_eq!(frame.label, "BP_PlayerCharacter_C\n▴ 20m");
        assert_eq!(
            frame.visuals,
            Visuals::Player {
                health_fraction: 0.0,
                is_ghost: false
            }
        );
        assert_eq!(frame.elevation, 2000.0);
    }
}
