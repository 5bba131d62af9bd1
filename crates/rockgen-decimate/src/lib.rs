#![warn(missing_docs)]

//! Mesh decimation using quadric error metrics.
//!
//! Reduces a triangle mesh to a target triangle count by collapsing the
//! cheapest edges first. Edge costs come from per-vertex error quadrics
//! accumulated over the incident face planes; a collapse places the
//! merged vertex at the edge midpoint. Within a round, costs are
//! computed once up front and not refreshed after collapses, an
//! approximation that holds up well at the reduction ratios rock
//! generation uses. A fresh round (new edges, new quadrics) starts only
//! if the previous one stalls above the target.

use std::collections::{BinaryHeap, HashMap, HashSet};

use rockgen_math::Point3;

/// Symmetric 4x4 error quadric, upper triangle packed row-major.
type Quadric = [f64; 10];

/// Decimate a mesh to at most `target_triangles` triangles.
///
/// Returns the surviving vertex positions and re-indexed triangles.
/// Vertices are compacted: only vertices referenced by a surviving
/// triangle appear in the output. If the target is at or above the
/// current triangle count no collapse happens and the mesh passes
/// through unchanged (up to compaction).
pub fn simplify(
    vertices: &[Point3],
    indices: &[[u32; 3]],
    target_triangles: usize,
) -> (Vec<Point3>, Vec<[u32; 3]>) {
    let mut positions = vertices.to_vec();
    let mut vertex_map: Vec<u32> = (0..vertices.len() as u32).collect();
    let mut active_triangles: Vec<bool> = vec![true; indices.len()];
    let mut current_triangle_count = active_triangles.len();

    while current_triangle_count > target_triangles {
        let collapsed = collapse_round(
            &mut positions,
            indices,
            &mut vertex_map,
            &mut active_triangles,
            &mut current_triangle_count,
            target_triangles,
        );
        if collapsed == 0 {
            break;
        }
    }

    // Build output mesh with compacted vertices
    let mut new_vertex_map: HashMap<u32, u32> = HashMap::new();
    let mut new_positions = Vec::new();
    let mut new_indices = Vec::new();

    for (tri, active) in indices.iter().zip(&active_triangles) {
        if !*active {
            continue;
        }

        let mut out = [0u32; 3];
        for (slot, &raw) in out.iter_mut().zip(tri) {
            let old_idx = get_canonical(&vertex_map, raw);
            *slot = *new_vertex_map.entry(old_idx).or_insert_with(|| {
                let idx = new_positions.len() as u32;
                new_positions.push(positions[old_idx as usize]);
                idx
            });
        }
        new_indices.push(out);
    }

    (new_positions, new_indices)
}

/// One collapse round: compute quadrics and edge costs for the current
/// surviving triangles, then collapse cheapest-first until the target is
/// reached or the heap drains. Returns the number of collapses applied.
fn collapse_round(
    positions: &mut [Point3],
    indices: &[[u32; 3]],
    vertex_map: &mut [u32],
    active_triangles: &mut [bool],
    current_triangle_count: &mut usize,
    target_triangles: usize,
) -> usize {
    // Surviving triangles in canonical indices.
    let live: Vec<[u32; 3]> = indices
        .iter()
        .zip(active_triangles.iter())
        .filter(|(_, active)| **active)
        .map(|(tri, _)| tri.map(|i| get_canonical(vertex_map, i)))
        .collect();

    let edges = build_edge_list(&live);
    let quadrics = accumulate_quadrics(positions, &live);

    // Min-heap of collapse candidates, cheapest first.
    #[derive(PartialEq)]
    struct EdgeEntry {
        cost: f64,
        edge_idx: usize,
    }

    impl Eq for EdgeEntry {}

    impl Ord for EdgeEntry {
        fn cmp(&self, other: &Self) -> std::cmp::Ordering {
            // Reverse order for min-heap
            other
                .cost
                .partial_cmp(&self.cost)
                .unwrap_or(std::cmp::Ordering::Equal)
        }
    }

    impl PartialOrd for EdgeEntry {
        fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
            Some(self.cmp(other))
        }
    }

    let mut heap: BinaryHeap<EdgeEntry> = edges
        .iter()
        .enumerate()
        .map(|(i, &(v0, v1))| EdgeEntry {
            cost: edge_cost(&quadrics, positions, v0, v1),
            edge_idx: i,
        })
        .collect();

    let mut collapses = 0;

    while *current_triangle_count > target_triangles {
        let Some(entry) = heap.pop() else {
            break;
        };

        if entry.cost >= 1e20 {
            break;
        }

        let (v0, v1) = edges[entry.edge_idx];
        let v0_canon = get_canonical(vertex_map, v0);
        let v1_canon = get_canonical(vertex_map, v1);

        if v0_canon == v1_canon {
            continue; // Already collapsed
        }

        // Collapse v1 into v0, placed at the midpoint
        vertex_map[v1_canon as usize] = v0_canon;
        let merged = Point3::from(
            (positions[v0_canon as usize].coords + positions[v1_canon as usize].coords) / 2.0,
        );
        positions[v0_canon as usize] = merged;
        collapses += 1;

        // Deactivate triangles the collapse degenerated
        for (tri, active) in indices.iter().zip(active_triangles.iter_mut()) {
            if !*active {
                continue;
            }

            let tri_verts = [
                get_canonical(vertex_map, tri[0]),
                get_canonical(vertex_map, tri[1]),
                get_canonical(vertex_map, tri[2]),
            ];

            if tri_verts[0] == tri_verts[1]
                || tri_verts[1] == tri_verts[2]
                || tri_verts[2] == tri_verts[0]
            {
                *active = false;
                *current_triangle_count -= 1;
            }
        }
    }

    collapses
}

/// Unique undirected edges of the triangle set, smaller index first.
fn build_edge_list(indices: &[[u32; 3]]) -> Vec<(u32, u32)> {
    let mut edge_set = HashSet::new();

    for tri in indices {
        let (i0, i1, i2) = (tri[0], tri[1], tri[2]);
        edge_set.insert(if i0 < i1 { (i0, i1) } else { (i1, i0) });
        edge_set.insert(if i1 < i2 { (i1, i2) } else { (i2, i1) });
        edge_set.insert(if i2 < i0 { (i2, i0) } else { (i0, i2) });
    }

    let mut edges: Vec<_> = edge_set.into_iter().collect();
    // Deterministic collapse order regardless of hash iteration
    edges.sort_unstable();
    edges
}

/// Accumulate the fundamental error quadric of every face plane onto its
/// three corner vertices. Zero-area faces contribute nothing.
fn accumulate_quadrics(vertices: &[Point3], indices: &[[u32; 3]]) -> Vec<Quadric> {
    let mut quadrics = vec![[0.0; 10]; vertices.len()];

    for tri in indices {
        let [i0, i1, i2] = tri.map(|i| i as usize);
        let p0 = vertices[i0];
        let e1 = vertices[i1] - p0;
        let e2 = vertices[i2] - p0;
        let cross = e1.cross(&e2);
        let area = cross.norm();
        if area < 1e-30 {
            continue;
        }

        let n = cross / area;
        let (a, b, c) = (n.x, n.y, n.z);
        let d = -n.dot(&p0.coords);

        let k: Quadric = [
            a * a,
            a * b,
            a * c,
            a * d,
            b * b,
            b * c,
            b * d,
            c * c,
            c * d,
            d * d,
        ];

        for &i in &[i0, i1, i2] {
            for (q, &kk) in quadrics[i].iter_mut().zip(&k) {
                *q += kk;
            }
        }
    }

    quadrics
}

/// Cost of collapsing `(v0, v1)` to its midpoint: the combined quadric
/// evaluated at the midpoint, `v̄ᵀ (Q0 + Q1) v̄`.
fn edge_cost(quadrics: &[Quadric], vertices: &[Point3], v0: u32, v1: u32) -> f64 {
    let mut q = [0.0; 10];
    for ((qq, &a), &b) in q
        .iter_mut()
        .zip(&quadrics[v0 as usize])
        .zip(&quadrics[v1 as usize])
    {
        *qq = a + b;
    }

    let mid = (vertices[v0 as usize].coords + vertices[v1 as usize].coords) / 2.0;
    let (x, y, z) = (mid.x, mid.y, mid.z);

    q[0] * x * x
        + 2.0 * q[1] * x * y
        + 2.0 * q[2] * x * z
        + 2.0 * q[3] * x
        + q[4] * y * y
        + 2.0 * q[5] * y * z
        + 2.0 * q[6] * y
        + q[7] * z * z
        + 2.0 * q[8] * z
        + q[9]
}

fn get_canonical(vertex_map: &[u32], mut idx: u32) -> u32 {
    while vertex_map[idx as usize] != idx {
        idx = vertex_map[idx as usize];
    }
    idx
}
