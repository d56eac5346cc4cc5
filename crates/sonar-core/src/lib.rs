//! # sonar-core
//!
//! Core library for the sonar actor radar.
//!
//! This crate provides:
//! - Process memory reading with declared read shapes
//! - Name pool resolution with a process-lifetime cache
//! - Actor array diffing, classification and per-tick refresh
//! - Offset detection via signature scanning
//! - Radar projection and label text for a pluggable presenter

pub mod actor;
pub mod config;
pub mod error;
pub mod memory;
pub mod names;
pub mod offset;
pub mod radar;
pub mod retry;
pub mod tracker;
pub mod world;

pub use actor::{ActorDetail, ActorKind, ClassifierRules, Health, TrackedActor};
pub use config::Config;
pub use error::{Error, FaultReason, Result};
pub use memory::{
    Field, MemoryReader, ModuleRegion, ProcessHandle, ReadMemory, Record, Shape, TextEncoding,
    Value,
};
pub use names::{NameHandle, NamePool};
pub use offset::{
    CodeSignature, OffsetSearcher, OffsetSignatureEntry, OffsetSignatureSet, OffsetsCollection,
    builtin_signatures, load_offsets, load_signatures, save_offsets,
};
pub use radar::{BlipFrame, BlipStyle, Presenter, RadarView, ScreenPoint, ViewTransform, Visuals};
pub use retry::{FixedDelay, NoRetry, RetryStrategy};
pub use tracker::{ActorTracker, TickSummary};
pub use world::{ActorSnapshot, NewActor, Rotation, Viewpoint};
