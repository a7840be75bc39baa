use crate::components::{Extent, GamePosition, Velocity};

/// Grid radius used when shortlisting solids around a moving body
pub const SOLID_QUERY_RADIUS: f32 = 50.0;
/// Bullets are small and fast, a tighter shortlist is enough
pub const BULLET_QUERY_RADIUS: f32 = 30.0;

/// Axis-aligned rectangle in gameplay space (top-left origin, y-down)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Aabb {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Strict overlap: touching edges do not collide
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.x < other.x + other.w
            && self.x + self.w > other.x
            && self.y < other.y + other.h
            && self.y + self.h > other.y
    }
}

fn body(pos: &GamePosition, extent: &Extent) -> Aabb {
    Aabb::new(pos.x, pos.y, extent.w, extent.h)
}

/// Shortlist of solids near a point, gathered by the caller from the
/// platform grid after the horizontal step has been applied.
pub type SolidsNear<'a> = dyn FnMut(f32, f32) -> Vec<Aabb> + 'a;

/// Move the player one axis at a time, snapping out of any solid the moved
/// rectangle lands in. The shortlist is taken once, after the horizontal
/// step, and reused for the vertical step. Horizontal snaps keep the
/// velocity; vertical snaps zero it. Every ceiling collision yields a probe
/// point just under the solid's underside, which the block-bump pass checks
/// against the level's blocks.
pub fn move_with_collisions(
    pos: &mut GamePosition,
    vel: &mut Velocity,
    extent: &Extent,
    dx: f32,
    dy: f32,
    solids_near: &mut SolidsNear<'_>,
) -> Vec<(f32, f32)> {
    pos.x += dx;
    let nearby = solids_near(pos.x, pos.y);
    for p in &nearby {
        if body(pos, extent).overlaps(p) {
            if dx > 0.0 {
                pos.x = p.x - extent.w;
            } else if dx < 0.0 {
                pos.x = p.x + p.w;
            }
        }
    }

    let mut probes = Vec::new();
    pos.y += dy;
    for p in &nearby {
        if body(pos, extent).overlaps(p) {
            if dy > 0.0 {
                pos.y = p.y - extent.h;
                vel.y = 0.0;
            } else if dy < 0.0 {
                pos.y = p.y + p.h;
                vel.y = 0.0;
                probes.push((pos.x + extent.w * 0.5, p.y + p.h + 1.0));
            }
        }
    }
    probes
}

/// Movement solver for walkers and shooters. Any horizontal contact zeroes
/// the velocity and reverses the walk direction; standing still against a
/// solid snaps to its right side.
pub fn move_entity_with_platforms(
    pos: &mut GamePosition,
    vel: &mut Velocity,
    extent: &Extent,
    dir: &mut f32,
    dx: f32,
    dy: f32,
    solids_near: &mut SolidsNear<'_>,
) {
    pos.x += dx;
    let nearby = solids_near(pos.x, pos.y);
    for p in &nearby {
        if body(pos, extent).overlaps(p) {
            if dx > 0.0 {
                pos.x = p.x - extent.w;
            } else {
                pos.x = p.x + p.w;
            }
            vel.x = 0.0;
            if *dir != 0.0 {
                *dir = -*dir;
            }
        }
    }

    pos.y += dy;
    for p in &nearby {
        if body(pos, extent).overlaps(p) {
            if dy > 0.0 {
                pos.y = p.y - extent.h;
            } else {
                pos.y = p.y + p.h;
            }
            vel.y = 0.0;
        }
    }
}

/// Movement solver for loose items (powerups). Horizontal contact reflects
/// the velocity so the item bounces between walls; vertical contact snaps
/// and settles. Items check every solid rather than a grid shortlist.
pub fn move_item_with_platforms(
    pos: &mut GamePosition,
    vel: &mut Velocity,
    extent: &Extent,
    solids: &[Aabb],
) {
    let dx = vel.x;
    let dy = vel.y;

    pos.x += dx;
    for p in solids {
        if body(pos, extent).overlaps(p) {
            if dx > 0.0 {
                pos.x = p.x - extent.w;
            } else {
                pos.x = p.x + p.w;
            }
            vel.x = -vel.x;
        }
    }

    pos.y += dy;
    for p in solids {
        if body(pos, extent).overlaps(p) {
            if dy > 0.0 {
                pos.y = p.y - extent.h;
            } else {
                pos.y = p.y + p.h;
            }
            vel.y = 0.0;
        }
    }
}

/// Whether a 2px band under the feet touches any shortlisted solid
pub fn grounded_probe(pos: &GamePosition, extent: &Extent, nearby: &[Aabb]) -> bool {
    let feet = Aabb::new(pos.x, pos.y + extent.h, extent.w, 2.0);
    nearby.iter().any(|p| feet.overlaps(p))
}

/// Whether a walker's leading foot has ground under it. Probes a 2x2 point
/// one pixel past the leading edge and one below the feet, against every
/// solid: walkers turn around at edges instead of walking off.
pub fn has_ground_ahead(pos: &GamePosition, extent: &Extent, dir: f32, solids: &[Aabb]) -> bool {
    let probe_x = pos.x + if dir > 0.0 { extent.w + 1.0 } else { -1.0 };
    let foot = Aabb::new(probe_x, pos.y + extent.h + 1.0, 2.0, 2.0);
    solids.iter().any(|p| foot.overlaps(p))
}
