//! Spatial queries (sweeps, line traces) для targeting и attack trace.
//!
//! Core зависит только от трейта `SpatialQuery`. `TraceWorld`: реализация
//! поверх снапшота `TraceBody` компонентов (bounding volumes из bevy::math).

use bevy::math::bounding::{Aabb3d, BoundingSphere, IntersectsVolume, RayCast3d};
use bevy::math::Vec3A;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Object type для фильтрации queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect, Serialize, Deserialize)]
pub enum TraceChannel {
    #[default]
    Pawn,
    WorldStatic,
    WorldDynamic,
    PhysicsBody,
}

/// Коллизионное тело для traces (сфера вокруг Transform + offset)
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct TraceBody {
    pub radius: f32,
    /// Центр сферы относительно Transform (local space)
    pub offset: Vec3,
    pub channel: TraceChannel,
}

impl TraceBody {
    pub fn pawn(radius: f32) -> Self {
        Self {
            radius,
            offset: Vec3::ZERO,
            channel: TraceChannel::Pawn,
        }
    }

    pub fn world_static(radius: f32) -> Self {
        Self {
            radius,
            offset: Vec3::ZERO,
            channel: TraceChannel::WorldStatic,
        }
    }
}

/// Результат sweep/trace по одному актору
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepHit {
    pub entity: Entity,
    /// Дистанция вдоль sweep до контакта
    pub distance: f32,
    /// Центр sweep формы в момент контакта
    pub location: Vec3,
    /// Точка на поверхности задетого тела
    pub impact_point: Vec3,
    /// Нормаль поверхности задетого тела
    pub normal: Vec3,
}

/// Filter для queries: каналы + игнорируемые акторы
#[derive(Debug, Clone, Copy)]
pub struct QueryFilter<'a> {
    pub channels: &'a [TraceChannel],
    pub ignore: &'a [Entity],
}

impl<'a> QueryFilter<'a> {
    pub fn new(channels: &'a [TraceChannel], ignore: &'a [Entity]) -> Self {
        Self { channels, ignore }
    }

    pub fn accepts(&self, entity: Entity, channel: TraceChannel) -> bool {
        self.channels.contains(&channel) && !self.ignore.contains(&entity)
    }
}

/// Collaborator: world collision queries
pub trait SpatialQuery {
    /// Sphere sweep start → end, все пересечения, отсортированы по дистанции
    fn sphere_sweep(&self, start: Vec3, end: Vec3, radius: f32, filter: QueryFilter) -> Vec<SweepHit>;

    /// Oriented box sweep (half extents в local space `rotation`), отсортирован по дистанции
    fn box_sweep(
        &self,
        start: Vec3,
        end: Vec3,
        half_extents: Vec3,
        rotation: Quat,
        filter: QueryFilter,
    ) -> Vec<SweepHit>;

    /// Первый блокирующий hit на отрезке from → to
    fn line_trace(&self, from: Vec3, to: Vec3, filter: QueryFilter) -> Option<SweepHit> {
        self.sphere_sweep(from, to, 0.0, filter).into_iter().next()
    }
}

#[derive(Debug, Clone, Copy)]
struct BodySnapshot {
    entity: Entity,
    center: Vec3,
    radius: f32,
    channel: TraceChannel,
}

/// Снапшот коллизионных тел на текущий тик
#[derive(Debug, Clone, Default)]
pub struct TraceWorld {
    bodies: Vec<BodySnapshot>,
}

impl TraceWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Собирает снапшот из ECS (Transform + TraceBody)
    pub fn collect<'a>(bodies: impl IntoIterator<Item = (Entity, &'a Transform, &'a TraceBody)>) -> Self {
        let mut world = Self::new();
        for (entity, transform, body) in bodies {
            world.insert(entity, transform.transform_point(body.offset), body.radius, body.channel);
        }
        world
    }

    pub fn insert(&mut self, entity: Entity, center: Vec3, radius: f32, channel: TraceChannel) {
        self.bodies.push(BodySnapshot {
            entity,
            center,
            radius,
            channel,
        });
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    fn sorted(mut hits: Vec<SweepHit>) -> Vec<SweepHit> {
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}

impl SpatialQuery for TraceWorld {
    fn sphere_sweep(&self, start: Vec3, end: Vec3, radius: f32, filter: QueryFilter) -> Vec<SweepHit> {
        let length = start.distance(end);
        let direction = Dir3::new(end - start).ok();

        let hits = self
            .bodies
            .iter()
            .filter(|body| filter.accepts(body.entity, body.channel))
            .filter_map(|body| {
                let combined = body.radius + radius;

                // Начальное перекрытие (или sweep нулевой длины)
                let toi = if start.distance_squared(body.center) <= combined * combined {
                    0.0
                } else {
                    let direction = direction?;
                    let ray = RayCast3d::new(Vec3A::from(start), direction, length);
                    ray.sphere_intersection_at(&BoundingSphere::new(Vec3A::from(body.center), combined))?
                };

                let location = match direction {
                    Some(direction) => start + *direction * toi,
                    None => start,
                };
                let normal = (location - body.center).normalize_or_zero();

                Some(SweepHit {
                    entity: body.entity,
                    distance: toi,
                    location,
                    impact_point: body.center + normal * body.radius,
                    normal,
                })
            })
            .collect();

        Self::sorted(hits)
    }

    fn box_sweep(
        &self,
        start: Vec3,
        end: Vec3,
        half_extents: Vec3,
        rotation: Quat,
        filter: QueryFilter,
    ) -> Vec<SweepHit> {
        // Работаем в local space коробки: swept volume = AABB(box@start ∪ box@end)
        let inverse = rotation.inverse();
        let local_end = inverse * (end - start);
        let swept = Aabb3d {
            min: Vec3A::from(local_end.min(Vec3::ZERO) - half_extents),
            max: Vec3A::from(local_end.max(Vec3::ZERO) + half_extents),
        };

        let hits = self
            .bodies
            .iter()
            .filter(|body| filter.accepts(body.entity, body.channel))
            .filter(|body| {
                let local_center = inverse * (body.center - start);
                swept.intersects(&BoundingSphere::new(Vec3A::from(local_center), body.radius))
            })
            .map(|body| {
                let normal = (start - body.center).normalize_or_zero();
                SweepHit {
                    entity: body.entity,
                    distance: start.distance(body.center),
                    location: body.center,
                    impact_point: body.center + normal * body.radius,
                    normal,
                }
            })
            .collect();

        Self::sorted(hits)
    }
}
