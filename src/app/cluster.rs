use crate::geo::{PointEntity, WorldPos};

/// A screen-space grouping of one or more markers, rendered as a single
/// visual unit.
#[derive(Clone, Debug)]
pub(crate) struct Cluster {
    /// Indices into the point slice, in stable input order.
    pub members: Vec<usize>,
    /// Centroid of the member positions.
    pub world: WorldPos,
}

impl Cluster {
    pub fn size(&self) -> usize {
        self.members.len()
    }
}

/// Greedy nearest-neighbor grouping by on-screen pixel distance.
///
/// Points are processed in input order; each unclustered point seeds a
/// cluster and pulls in every remaining unclustered point whose screen
/// distance to the seed is strictly below `pixel_distance`. The screen
/// distance depends on the view resolution, so coarser zoom levels merge
/// more aggressively.
///
/// Quadratic in the point count, which is fine for the low thousands of
/// markers this map serves. A spatial index would have to reproduce these
/// exact groupings for the same parameters.
pub(crate) fn cluster_points(
    points: &[PointEntity],
    pixel_distance: f64,
    resolution: f64,
) -> Vec<Cluster> {
    let threshold = pixel_distance * resolution;
    let mut clustered = vec![false; points.len()];
    let mut clusters = Vec::new();

    for seed in 0..points.len() {
        if clustered[seed] {
            continue;
        }
        clustered[seed] = true;
        let mut members = vec![seed];

        for candidate in seed + 1..points.len() {
            if clustered[candidate] {
                continue;
            }
            if points[candidate].world.distance(points[seed].world) < threshold {
                clustered[candidate] = true;
                members.push(candidate);
            }
        }

        let count = members.len() as f64;
        let mut x = 0.0;
        let mut y = 0.0;
        for &index in &members {
            x += points[index].world.x;
            y += points[index].world.y;
        }

        clusters.push(Cluster {
            members,
            world: WorldPos {
                x: x / count,
                y: y / count,
            },
        });
    }

    clusters
}
