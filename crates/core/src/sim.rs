use glam::Vec3;

use crate::net::EntityState;

const GRAVITY: f32 = -9.81;
const FLOOR_Y: f32 = 0.0;
const RESTITUTION: f32 = 0.6;

/// Demo simulation: point bodies falling under gravity and bouncing on a
/// floor plane. Just enough state to give the loop owners a real
/// `update(dt)` and the server something worth broadcasting.
#[derive(Debug, Clone, Copy)]
pub struct Body {
    pub id: u32,
    pub position: Vec3,
    pub velocity: Vec3,
}

#[derive(Debug, Default)]
pub struct World {
    bodies: Vec<Body>,
    next_id: u32,
    tick: u32,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, position: Vec3) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.bodies.push(Body {
            id,
            position,
            velocity: Vec3::ZERO,
        });
        id
    }

    pub fn despawn(&mut self, id: u32) -> bool {
        let before = self.bodies.len();
        self.bodies.retain(|b| b.id != id);
        self.bodies.len() != before
    }

    pub fn body(&self, id: u32) -> Option<&Body> {
        self.bodies.iter().find(|b| b.id == id)
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn tick(&self) -> u32 {
        self.tick
    }

    pub fn apply_impulse(&mut self, id: u32, impulse: Vec3) {
        if let Some(body) = self.bodies.iter_mut().find(|b| b.id == id) {
            body.velocity += impulse;
        }
    }

    /// Advances every body by exactly one fixed step.
    pub fn step(&mut self, dt: f32) {
        for body in &mut self.bodies {
            body.velocity.y += GRAVITY * dt;
            body.position += body.velocity * dt;

            if body.position.y < FLOOR_Y {
                body.position.y = FLOOR_Y;
                body.velocity.y = -body.velocity.y * RESTITUTION;
            }
        }
        self.tick = self.tick.wrapping_add(1);
    }

    pub fn snapshot(&self) -> Vec<EntityState> {
        self.bodies
            .iter()
            .map(|b| EntityState {
                id: b.id,
                position: b.position.to_array(),
                velocity: b.velocity.to_array(),
            })
            .collect()
    }

    /// Replaces local body state with an authoritative snapshot, spawning
    /// bodies the local world has not seen yet.
    pub fn apply_snapshot(&mut self, tick: u32, entities: &[EntityState]) {
        self.tick = tick;
        self.bodies.clear();
        for entity in entities {
            self.bodies.push(Body {
                id: entity.id,
                position: Vec3::from_array(entity.position),
                velocity: Vec3::from_array(entity.velocity),
            });
            self.next_id = self.next_id.max(entity.id + 1);
        }
    }
}
