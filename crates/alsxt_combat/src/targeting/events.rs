//! Targeting events (requests от input/AI + outcomes для host'а)

use bevy::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetingRequestKind {
    /// Включить периодический trace (Scanning)
    Engage,
    AcquireClosest,
    CycleLeft,
    CycleRight,
    Disengage,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct TargetingRequest {
    pub actor: Entity,
    pub kind: TargetingRequestKind,
}

impl TargetingRequest {
    pub fn new(actor: Entity, kind: TargetingRequestKind) -> Self {
        Self { actor, kind }
    }
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetLocked {
    pub actor: Entity,
    pub target: Entity,
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetUnlocked {
    pub actor: Entity,
    pub target: Entity,
}

/// Line of sight к цели перекрыт, lock снят
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetObstructed {
    pub actor: Entity,
    pub target: Entity,
}
