//! Core data types.
//!
//! This module contains the entity model shared by the resolver and the
//! registry, and the records storage backends persist.

pub mod entity;
pub mod kind;
pub mod record;

pub use entity::{Calculable, EffectiveView, Entity, Group, OwnData, User};
pub use kind::EntityKind;
pub use record::{EntityRecord, WorldSnapshot};
