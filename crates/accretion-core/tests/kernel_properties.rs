//! Whole-ray properties of the CPU kernel

// Tests are allowed to use expect/unwrap for cleaner error messages
#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use accretion_core::kernel::{MAX_STEPS, RayTrace, Termination, trace_pixel};
use accretion_core::render::trace_image;
use accretion_core::{SimulationParameters, ViewMode, WavelengthBand, pack};
use glam::{Vec2, Vec3};

fn scenario_a() -> SimulationParameters {
    SimulationParameters {
        view_mode: ViewMode::Classic,
        wavelength_band: WavelengthBand::Visible,
        camera_distance: 12.0,
        camera_angle_x: 0.3,
        camera_angle_y: 0.0,
        show_jets: true,
        show_milky_way: false,
        ..SimulationParameters::default()
    }
}

fn scenario_c() -> SimulationParameters {
    SimulationParameters {
        show_milky_way: true,
        camera_distance: 150.0,
        camera_angle_x: 0.8,
        ..SimulationParameters::default()
    }
}

fn assert_well_formed(trace: &RayTrace) {
    assert!(trace.steps <= MAX_STEPS);
    assert!(trace.color.is_finite(), "non-finite color {}", trace.color);
    assert!(
        trace.color.min_element() >= 0.0 && trace.color.max_element() <= 1.0,
        "color out of range: {}",
        trace.color
    );
    assert!(trace.transmit_well_behaved, "transmittance misbehaved");
    assert!((0.0..=1.0).contains(&trace.transmit));
}

#[test]
fn every_ray_terminates_with_displayable_color() {
    let mut params = scenario_a();
    params.show_milky_way = true;
    let block = pack(&params, 7.5, [40.0, 30.0]);

    let traces = trace_image(&block).expect("trace should succeed");
    assert_eq!(traces.len(), 40 * 30);
    for trace in &traces {
        assert_well_formed(trace);
    }
    assert!(traces.iter().any(|t| t.termination == Termination::Captured));
    assert!(traces.iter().any(|t| t.termination == Termination::Escaped));
}

#[test]
fn extreme_distances_stay_well_formed() {
    for distance in [3.0, 300.0] {
        let params = SimulationParameters {
            camera_distance: distance,
            show_milky_way: true,
            ..SimulationParameters::default()
        };
        let block = pack(&params, 1.0, [16.0, 12.0]);
        for trace in trace_image(&block).expect("trace should succeed") {
            assert_well_formed(&trace);
        }
    }
}

#[test]
fn scenario_a_has_black_center_ringed_by_disk() {
    let block = pack(&scenario_a(), 0.0, [640.0, 480.0]);

    for ndc in [
        Vec2::ZERO,
        Vec2::new(0.03, 0.0),
        Vec2::new(-0.03, 0.0),
        Vec2::new(0.0, 0.03),
        Vec2::new(0.0, -0.03),
    ] {
        let trace = trace_pixel(&block, ndc);
        assert_eq!(trace.termination, Termination::Captured, "ray at {ndc} escaped");
        assert_eq!(trace.color, Vec3::ZERO, "ray at {ndc} is not black");
    }

    // Doppler beaming makes the approaching side bright and dims the receding one
    let approaching = trace_pixel(&block, Vec2::new(0.4, 0.0));
    assert!(approaching.energy.disk > 0.01, "no disk emission on the approaching side");
    assert!(approaching.color.max_element() > 0.05, "approaching side too dark");
    let receding = trace_pixel(&block, Vec2::new(-0.4, 0.0));
    assert!(receding.energy.disk > 0.0, "no disk emission on the receding side");
    assert!(receding.color.max_element() < approaching.color.max_element());
}

#[test]
fn scenario_a_disk_band_surrounds_the_shadow() {
    let block = pack(&scenario_a(), 0.0, [640.0, 480.0]);

    // Walk outwards from the captured center in every direction until the disk shows up
    for i in 0..16 {
        let angle = i as f32 * std::f32::consts::TAU / 16.0;
        let direction = Vec2::new(angle.cos(), angle.sin());
        let hit = (2..=120)
            .map(|step| direction * (step as f32 * 0.01))
            .find(|ndc| trace_pixel(&block, *ndc).energy.disk > 0.0);
        assert!(hit.is_some(), "no disk emission around the shadow towards {direction}");
    }
}

#[test]
fn scenario_b_gravity_grid_ignores_wavelength() {
    let samples = [
        Vec2::new(0.4, 0.0),
        Vec2::new(-0.35, 0.05),
        Vec2::new(0.2, -0.1),
        Vec2::new(0.0, 0.3),
    ];
    let trace_for = |band: WavelengthBand| {
        let params = SimulationParameters {
            view_mode: ViewMode::GravityGrid,
            wavelength_band: band,
            ..scenario_a()
        };
        let block = pack(&params, 2.0, [640.0, 480.0]);
        samples.map(|ndc| trace_pixel(&block, ndc))
    };

    let reference = trace_for(WavelengthBand::Visible);
    assert!(reference.iter().any(|t| t.energy.disk > 0.0));
    for band in WavelengthBand::ALL {
        let traces = trace_for(band);
        for (a, b) in traces.iter().zip(&reference) {
            assert_eq!(a.color, b.color, "grid color changed with {band}");
            assert_eq!(a.energy.jet, 0.0, "jets must be hidden in grid mode");
        }
    }
}

#[test]
fn scenario_c_backdrop_visible_without_disk() {
    let block = pack(&scenario_c(), 0.0, [640.0, 480.0]);

    let isolated_backdrop = [0.15_f32, 0.3, -0.15, -0.3, 0.45]
        .iter()
        .flat_map(|x| [0.0_f32, -0.1, -0.25].map(|y| Vec2::new(*x, y)))
        .map(|ndc| trace_pixel(&block, ndc))
        .filter(|t| t.energy.disk + t.energy.jet < 1e-6)
        .filter(|t| t.energy.backdrop > 1e-4)
        .count();
    assert!(isolated_backdrop > 0, "backdrop never contributed on its own");
}

#[test]
fn backdrop_disabled_contributes_nothing() {
    let params = SimulationParameters {
        show_milky_way: false,
        ..scenario_c()
    };
    let block = pack(&params, 0.0, [32.0, 24.0]);
    let traces = trace_image(&block).expect("trace should succeed");
    assert!(traces.iter().all(|t| t.energy.backdrop == 0.0));
}

#[test]
fn jets_toggle_controls_jet_layer() {
    // Looking down onto the pole so rays run along the upper jet
    let mut params = scenario_a();
    params.camera_angle_x = 1.4;
    let on = pack(&params, 1.0, [32.0, 32.0]);
    params.show_jets = false;
    let off = pack(&params, 1.0, [32.0, 32.0]);

    let near_axis = Vec2::new(0.01, 0.01);
    assert!(trace_pixel(&on, near_axis).energy.jet > 0.0);
    assert_eq!(trace_pixel(&off, near_axis).energy.jet, 0.0);
}

#[test]
fn rendering_is_deterministic() {
    let block = pack(&scenario_a(), 3.0, [20.0, 15.0]);
    let a = trace_image(&block).expect("trace should succeed");
    let b = trace_image(&block).expect("trace should succeed");
    assert_eq!(a, b);
}
