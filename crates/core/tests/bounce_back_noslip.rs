//! No-slip wall validation
//!
//! Half-way bounce-back must return a population that streams into a wall
//! back toward the fluid with its momentum negated, and a channel bounded
//! by resting walls must drain tangential momentum from a uniform flow.

use lbm_sim_core::solver::bgk::{cell_moments, collide_stream, initialize_equilibrium};
use lbm_sim_core::solver::bounce_back::apply;
use lbm_sim_core::solver::tiles::tile_domain;
use lbm_sim_core::solver::RelaxationParams;
use lbm_sim_core::{BoundaryList, BoundarySite, FlowConfig, PopulationStore, Simulation, D3Q27};

fn wrap(c: usize, delta: i32, n: usize) -> usize {
    ((c + n) as i32 + delta) as usize % n
}

/// Find the slot whose discrete velocity matches `c`.
fn slot_of(c: [i32; 3]) -> usize {
    (0..D3Q27::ND)
        .find(|&k| k != D3Q27::PAD && D3Q27::VELOCITIES[k] == c)
        .expect("direction exists")
}

#[test]
fn test_reflected_momentum_is_negated() {
    let (nx, ny, nz) = (8, 8, 8);
    let site = (4, 4, 4);
    let tiles = tile_domain(nx, ny, nz, 4);
    let identity = RelaxationParams {
        tau: f64::INFINITY,
        omega: 0.0,
    };

    // An edge direction, so the reflection carries a tangential component.
    let k = slot_of([1, 1, 0]);
    let (n, d) = (k / D3Q27::OFF, k % D3Q27::OFF);
    let c = D3Q27::VELOCITIES[k];
    let marker = 0.02;

    let mut populations = PopulationStore::new(nx, ny, nz, 1);
    initialize_equilibrium(&mut populations, 1.0, [0.0; 3], 0);

    // Plant an excess heading into the wall: incoming direction k at the
    // fluid neighbor one hop upstream of the wall node.
    let fluid = (
        wrap(site.0, -c[0], nx),
        wrap(site.1, -c[1], ny),
        wrap(site.2, -c[2], nz),
    );
    let at = populations.linear_index(fluid.0, fluid.1, fluid.2, 0, 1 - n, d);
    populations.as_mut_slice()[at] += marker;

    let boundary = BoundaryList::from_sites([BoundarySite::resting(site.0, site.1, site.2)]);

    // One full cycle with identity relaxation: kernel then wall pass,
    // even then odd.
    collide_stream::<false>(&mut populations, None, identity, 0, &tiles);
    apply::<false>(&boundary, &mut populations, 0);
    collide_stream::<true>(&mut populations, None, identity, 0, &tiles);
    apply::<true>(&boundary, &mut populations, 0);

    // The excess must now travel away from the wall: incoming for the
    // opposite direction at the next cell out.
    let reflected_cell = (
        wrap(fluid.0, -c[0], nx),
        wrap(fluid.1, -c[1], ny),
        wrap(fluid.2, -c[2], nz),
    );
    let reflected_at =
        populations.linear_index(reflected_cell.0, reflected_cell.1, reflected_cell.2, 0, n, d);
    let background = D3Q27::WEIGHTS[k];
    assert!(
        (populations.as_slice()[reflected_at] - (background + marker)).abs() < 1e-13,
        "reflected excess not found at the mirror position"
    );

    // Net momentum of the whole domain: exactly the negation of what was
    // planted.
    let mut momentum = [0.0_f64; 3];
    for z in 0..nz {
        for y in 0..ny {
            for x in 0..nx {
                let (_, m) = cell_moments::<false>(&populations, x, y, z, 0);
                momentum[0] += m[0];
                momentum[1] += m[1];
                momentum[2] += m[2];
            }
        }
    }
    for axis in 0..3 {
        let expected = -marker * f64::from(c[axis]);
        assert!(
            (momentum[axis] - expected).abs() < 1e-10,
            "axis {axis}: domain momentum {} expected {expected}",
            momentum[axis]
        );
    }
}

#[test]
fn test_channel_walls_drain_tangential_momentum() {
    let (nx, ny, nz) = (8, 8, 8);
    let mut solid = vec![false; nx * ny * nz];
    for y in 0..ny {
        for x in 0..nx {
            solid[y * nx + x] = true; // z = 0 plane, periodic images bound both faces
        }
    }
    let boundary = BoundaryList::from_solid_mask(&solid, nx, ny, nz);

    let config = FlowConfig {
        nx,
        ny,
        nz,
        tile_edge: 4,
        threads: Some(2),
        relaxation_time: Some(0.6),
        ..FlowConfig::default()
    };
    let mut sim = Simulation::new(config, boundary).expect("valid configuration");
    let initial = 0.05;
    sim.set_uniform_flow(1.0, [initial, 0.0, 0.0]);

    sim.run(5);

    // Mean tangential momentum over the fluid layers must have decayed.
    let mut total = 0.0;
    let mut cells = 0;
    for z in 1..nz {
        for y in 0..ny {
            for x in 0..nx {
                total += sim.momentum_at(x, y, z).x;
                cells += 1;
            }
        }
    }
    let mean = total / f64::from(cells);
    assert!(
        mean < initial - 1e-4,
        "wall drag should slow the channel, mean momentum {mean}"
    );
    assert!(mean > 0.0, "flow should not reverse, mean momentum {mean}");
}
