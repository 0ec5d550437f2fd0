// Debug Runtime - headless scenario runner for the teleport targeting core
//
// Loads a JSON scenario (scene, targeting configuration, command list),
// replays it frame by frame, and prints a JSON report of every dispatched
// marker event, zone notification and teleport.

mod commands;

use std::{collections::BTreeMap, fs, path::PathBuf, time::Duration};

use anyhow::{anyhow, Context, Result};
use cgmath::{vec3, InnerSpace, Vector3};
use clap::Parser;
use rapier3d::prelude::{ColliderBuilder, Vector};
use tracing::{info, warn};

use teleport_pointer::{
    logging::init_logging, FrameInput, InputSignal, LayerMask, NullRenderer, PlayerTeleporter,
    PointerPose, PrimitiveScene, RapierScene, SceneGeometry, SourceIndex, TargetHandle,
    TargetingWorld, TeleportEffect, Time, ZoneId,
};

use commands::{
    EventSummary, RayCastRequest, RayCastResult, Scenario, ScenarioCommand, ScenarioReport,
    SceneSpec, SignalKind, StepResult, StepSpec,
};

type World = TargetingWorld<Box<dyn SceneGeometry>, PlayerTeleporter>;

#[derive(Parser)]
#[command(name = "debug_runtime")]
#[command(about = "Headless scenario runner for teleport targeting")]
struct Args {
    /// Scenario file to replay
    scenario: PathBuf,

    /// Build the scene from rapier colliders instead of analytic primitives
    #[arg(long)]
    rapier: bool,

    /// Simulated frame interval (e.g. 11ms)
    #[arg(long, default_value = "11ms", value_parser = humantime::parse_duration)]
    frame_interval: Duration,

    /// Print the report without pretty formatting
    #[arg(long)]
    compact: bool,
}

fn main() -> Result<()> {
    init_logging("TELEPORT_LOG");
    let args = Args::parse();

    let source = fs::read_to_string(&args.scenario)
        .with_context(|| format!("reading scenario {}", args.scenario.display()))?;
    let scenario: Scenario = serde_json::from_str(&source)
        .with_context(|| format!("parsing scenario {}", args.scenario.display()))?;

    info!(
        "Replaying {} commands from {} ({} scene)",
        scenario.commands.len(),
        args.scenario.display(),
        if args.rapier { "rapier" } else { "primitive" }
    );

    let report = run_scenario(scenario, args.rapier, args.frame_interval)?;
    let output = if args.compact {
        serde_json::to_string(&report)?
    } else {
        serde_json::to_string_pretty(&report)?
    };
    println!("{}", output);
    Ok(())
}

fn run_scenario(scenario: Scenario, rapier: bool, frame_interval: Duration) -> Result<ScenarioReport> {
    let scene = if rapier {
        build_rapier_scene(&scenario.scene)
    } else {
        build_primitive_scene(&scenario.scene)
    };
    let executor = PlayerTeleporter::new(to_vec(scenario.player_position));
    let mut world: World =
        TargetingWorld::from_config(&scenario.targeting, scene, executor, |_| {
            Box::new(NullRenderer)
        })?;

    for error in world.binding_errors() {
        warn!("Pointer binding problem: {}", error);
    }

    let mut runner = Runner {
        time: Time::default(),
        frame_interval,
        poses: BTreeMap::new(),
        pending: Vec::new(),
        report: ScenarioReport {
            steps: Vec::new(),
            ray_casts: Vec::new(),
            teleports: Vec::new(),
            player_position: scenario.player_position,
            current_zone: None,
        },
    };

    for (index, command) in scenario.commands.into_iter().enumerate() {
        runner
            .apply(&mut world, command)
            .with_context(|| format!("command #{}", index))?;
    }

    let mut report = runner.report;
    report.player_position = to_array(world.executor().player_position);
    report.current_zone = world
        .zones()
        .current()
        .and_then(|current| world.zones().zones().position(|zone| zone.id() == current));
    Ok(report)
}

struct Runner {
    time: Time,
    frame_interval: Duration,
    poses: BTreeMap<SourceIndex, PointerPose>,
    pending: Vec<InputSignal>,
    report: ScenarioReport,
}

impl Runner {
    fn apply(&mut self, world: &mut World, command: ScenarioCommand) -> Result<()> {
        match command {
            ScenarioCommand::Signal { signal, source } => {
                let source = SourceIndex(source);
                self.pending.push(match signal {
                    SignalKind::On => InputSignal::ActivateBeamOn(source),
                    SignalKind::Off => InputSignal::ActivateBeamOff(source),
                    SignalKind::Confirm => InputSignal::ConfirmDestination(source),
                });
            }
            ScenarioCommand::Pose {
                source,
                position,
                forward,
            } => {
                let forward = to_vec(forward);
                if forward.magnitude2() == 0.0 {
                    return Err(anyhow!("pose for source {} has a zero forward vector", source));
                }
                self.poses.insert(
                    SourceIndex(source),
                    PointerPose::looking(to_vec(position), forward.normalize()),
                );
            }
            ScenarioCommand::Step(spec) => {
                let frames = self.frames_for(&spec)?;
                let result = self.step(world, frames);
                self.report.steps.push(result);
            }
            ScenarioCommand::RayCast(request) => {
                let result = ray_cast(world.scene(), &request);
                self.report.ray_casts.push(result);
            }
            ScenarioCommand::SetZoneTeleport { zone, enabled } => {
                let id = zone_id(world, zone)?;
                world.set_zone_teleport_enabled(id, enabled)?;
            }
            ScenarioCommand::EnableZone { zone } => {
                let id = zone_id(world, zone)?;
                world.enable_zone(id)?;
            }
            ScenarioCommand::DisableZone { zone } => {
                let id = zone_id(world, zone)?;
                world.disable_zone(id)?;
            }
        }
        Ok(())
    }

    fn frames_for(&self, spec: &StepSpec) -> Result<u32> {
        match spec {
            StepSpec::Frames { frames } => Ok(*frames),
            StepSpec::Duration { duration } => {
                let duration = humantime::parse_duration(duration)
                    .with_context(|| format!("invalid step duration '{}'", duration))?;
                let interval = self.frame_interval.as_secs_f64();
                if interval <= 0.0 {
                    return Err(anyhow!("frame interval must be positive"));
                }
                Ok((duration.as_secs_f64() / interval).ceil() as u32)
            }
        }
    }

    fn step(&mut self, world: &mut World, frames: u32) -> StepResult {
        let start_time = self.time.total;
        let mut events = Vec::new();
        let mut zone_notices = Vec::new();

        for _ in 0..frames {
            self.time = self.time.advance(self.frame_interval);
            let mut input = FrameInput::new(self.time);
            // Signals are delivered on the first frame of the step
            for signal in self.pending.drain(..) {
                input = input.with_signal(signal);
            }
            for (source, pose) in &self.poses {
                input = input.with_pose(*source, *pose);
            }
            world.tick(input);

            events.extend(world.take_dispatched().into_iter().map(|event| EventSummary {
                kind: format!("{:?}", event.kind),
                target: event.payload.target.map(|target| target.0),
                destination: to_array(event.payload.destination_position),
                allow_teleport: event.payload.allow_teleport,
            }));
            zone_notices.extend(
                world
                    .take_zone_notices()
                    .into_iter()
                    .map(|notice| format!("{:?}: {:?}", notice.zone, notice.notification)),
            );
            for effect in world.executor_mut().take_effects() {
                let TeleportEffect::SetPlayerPosition {
                    position,
                    is_teleport,
                    ..
                } = effect;
                if is_teleport {
                    info!("Teleported to {:?}", position);
                    self.report.teleports.push(to_array(position));
                }
            }
        }

        StepResult {
            frames_advanced: frames,
            time_advanced: (self.time.total - start_time).as_secs_f32(),
            new_frame_index: world.frame(),
            new_total_time: self.time.total.as_secs_f32(),
            events,
            zone_notices,
        }
    }
}

fn zone_id(world: &World, index: usize) -> Result<ZoneId> {
    world
        .zones()
        .zones()
        .nth(index)
        .map(|zone| zone.id())
        .ok_or_else(|| anyhow!("no destination zone at index {}", index))
}

fn ray_cast(scene: &dyn SceneGeometry, request: &RayCastRequest) -> RayCastResult {
    let start = to_vec(request.start);
    let delta = to_vec(request.end) - start;
    let length = delta.magnitude();
    let max_distance = request.max_distance.unwrap_or(length);

    let hit = if length > 0.0 {
        scene.cast(start, delta / length, max_distance, LayerMask::raycast_default())
    } else {
        None
    };

    match hit {
        Some(hit) => RayCastResult {
            hit: true,
            hit_point: Some(to_array(hit.point)),
            hit_normal: Some(to_array(hit.normal)),
            distance: Some(hit.distance),
            target: Some(hit.target.0),
        },
        None => RayCastResult {
            hit: false,
            hit_point: None,
            hit_normal: None,
            distance: None,
            target: None,
        },
    }
}

fn build_primitive_scene(spec: &SceneSpec) -> Box<dyn SceneGeometry> {
    let mut scene = PrimitiveScene::new();
    if let Some(floor) = &spec.floor {
        scene.add_floor(TargetHandle(floor.target), floor.height);
    }
    for spec_box in &spec.boxes {
        scene.add_box(
            TargetHandle(spec_box.target),
            to_vec(spec_box.min),
            to_vec(spec_box.max),
        );
    }
    Box::new(scene)
}

const RAPIER_FLOOR_HALF_EXTENT: f32 = 500.0;

fn build_rapier_scene(spec: &SceneSpec) -> Box<dyn SceneGeometry> {
    let mut scene = RapierScene::new();
    if let Some(floor) = &spec.floor {
        scene.insert(
            ColliderBuilder::cuboid(RAPIER_FLOOR_HALF_EXTENT, 0.1, RAPIER_FLOOR_HALF_EXTENT)
                .translation(Vector::new(0.0, floor.height - 0.1, 0.0))
                .build(),
            TargetHandle(floor.target),
        );
    }
    for spec_box in &spec.boxes {
        let min = to_vec(spec_box.min);
        let max = to_vec(spec_box.max);
        let half = (max - min) * 0.5;
        let center = min + half;
        scene.insert(
            ColliderBuilder::cuboid(half.x.abs(), half.y.abs(), half.z.abs())
                .translation(Vector::new(center.x, center.y, center.z))
                .build(),
            TargetHandle(spec_box.target),
        );
    }
    Box::new(scene)
}

fn to_vec(v: [f32; 3]) -> Vector3<f32> {
    vec3(v[0], v[1], v[2])
}

fn to_array(v: Vector3<f32>) -> [f32; 3] {
    [v.x, v.y, v.z]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pad_scenario() -> Scenario {
        serde_json::from_str(
            r#"{
                "targeting": {
                    "pointers": [ { "source_index": 0 } ],
                    "zones": [ { "target": 10, "anchor_position": { "x": 0.0, "y": 0.1, "z": -3.0 } } ]
                },
                "scene": {
                    "floor": { "target": 1 },
                    "boxes": [ { "target": 10, "min": [-1.0, 0.0, -4.0], "max": [1.0, 0.1, -2.0] } ]
                },
                "commands": [
                    { "command": "pose", "source": 0, "position": [0.0, 1.5, 0.0], "forward": [0.0, -1.4, -3.0] },
                    { "command": "step", "frames": 1 },
                    { "command": "signal", "signal": "on", "source": 0 },
                    { "command": "step", "frames": 2 },
                    { "command": "ray_cast", "start": [0.0, 5.0, 0.0], "end": [0.0, -5.0, 0.0] }
                ]
            }"#,
        )
        .expect("scenario")
    }

    #[test]
    fn test_primitive_scenario_reports_events_and_ray_casts() {
        let report = run_scenario(pad_scenario(), false, Duration::from_millis(11)).expect("run");

        assert_eq!(report.steps.len(), 2);
        assert!(report.steps[0].events.is_empty());
        assert!(report.steps[1].events.iter().any(|event| event.kind == "Enter"));

        assert_eq!(report.ray_casts.len(), 1);
        let ray = &report.ray_casts[0];
        assert!(ray.hit);
        assert_eq!(ray.target, Some(1));
        assert!(report.teleports.is_empty());
    }

    #[test]
    fn test_duration_step_rounds_up_to_whole_frames() {
        let runner = Runner {
            time: Time::default(),
            frame_interval: Duration::from_millis(10),
            poses: BTreeMap::new(),
            pending: Vec::new(),
            report: ScenarioReport {
                steps: Vec::new(),
                ray_casts: Vec::new(),
                teleports: Vec::new(),
                player_position: [0.0; 3],
                current_zone: None,
            },
        };
        let frames = runner
            .frames_for(&StepSpec::Duration {
                duration: "25ms".to_owned(),
            })
            .expect("frames");
        assert_eq!(frames, 3);
    }
}
