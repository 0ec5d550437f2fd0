// Scenario commands for the debug runtime
//
// A scenario is a JSON document describing the scene, the targeting
// configuration, and a list of commands replayed frame by frame.

use serde::{Deserialize, Serialize};
use teleport_pointer::TargetingConfig;

/// Complete scenario file
#[derive(Debug, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub targeting: TargetingConfig,
    #[serde(default)]
    pub scene: SceneSpec,
    #[serde(default)]
    pub player_position: [f32; 3],
    pub commands: Vec<ScenarioCommand>,
}

/// Geometry to build the scene from
#[derive(Debug, Default, Deserialize)]
pub struct SceneSpec {
    pub floor: Option<FloorSpec>,
    #[serde(default)]
    pub boxes: Vec<BoxSpec>,
}

#[derive(Debug, Deserialize)]
pub struct FloorSpec {
    pub target: u64,
    #[serde(default)]
    pub height: f32,
}

#[derive(Debug, Deserialize)]
pub struct BoxSpec {
    pub target: u64,
    pub min: [f32; 3],
    pub max: [f32; 3],
}

/// Commands replayed against the targeting world
#[derive(Debug, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ScenarioCommand {
    /// Queue an input signal for the next frame
    Signal { signal: SignalKind, source: u8 },

    /// Set the pose of an input source; it persists until changed
    Pose {
        source: u8,
        position: [f32; 3],
        forward: [f32; 3],
    },

    /// Step the simulation forward by frames or time
    Step(StepSpec),

    /// Perform a scene raycast
    RayCast(RayCastRequest),

    /// Lock or unlock a destination zone, by index in the configuration
    SetZoneTeleport { zone: usize, enabled: bool },

    EnableZone { zone: usize },

    DisableZone { zone: usize },
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    On,
    Off,
    Confirm,
}

/// Specification for stepping the simulation
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum StepSpec {
    /// Step by number of frames
    Frames { frames: u32 },
    /// Step by duration
    Duration { duration: String }, // Parsed with humantime
}

/// Result of stepping the simulation
#[derive(Debug, Serialize)]
pub struct StepResult {
    pub frames_advanced: u32,
    pub time_advanced: f32,
    pub new_frame_index: u64,
    pub new_total_time: f32,
    pub events: Vec<EventSummary>,
    pub zone_notices: Vec<String>,
}

/// One dispatched marker event
#[derive(Debug, Serialize)]
pub struct EventSummary {
    pub kind: String,
    pub target: Option<u64>,
    pub destination: [f32; 3],
    pub allow_teleport: bool,
}

/// Request for a scene raycast
#[derive(Debug, Deserialize)]
pub struct RayCastRequest {
    pub start: [f32; 3],
    pub end: [f32; 3],
    pub max_distance: Option<f32>,
}

/// Result of a scene raycast
#[derive(Debug, Serialize)]
pub struct RayCastResult {
    pub hit: bool,
    pub hit_point: Option<[f32; 3]>,
    pub hit_normal: Option<[f32; 3]>,
    pub distance: Option<f32>,
    pub target: Option<u64>,
}

/// Everything the runtime prints once the scenario finishes
#[derive(Debug, Serialize)]
pub struct ScenarioReport {
    pub steps: Vec<StepResult>,
    pub ray_casts: Vec<RayCastResult>,
    pub teleports: Vec<[f32; 3]>,
    pub player_position: [f32; 3],
    pub current_zone: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scenario_commands() {
        let scenario: Scenario = serde_json::from_str(
            r#"{
                "scene": { "floor": { "target": 1 } },
                "commands": [
                    { "command": "pose", "source": 0, "position": [0, 1.5, 0], "forward": [0, 0, -1] },
                    { "command": "signal", "signal": "on", "source": 0 },
                    { "command": "step", "frames": 2 },
                    { "command": "step", "duration": "50ms" },
                    { "command": "ray_cast", "start": [0, 1, 0], "end": [0, -1, 0] },
                    { "command": "set_zone_teleport", "zone": 0, "enabled": false }
                ]
            }"#,
        )
        .expect("scenario");

        assert_eq!(scenario.commands.len(), 6);
        assert!(matches!(
            scenario.commands[2],
            ScenarioCommand::Step(StepSpec::Frames { frames: 2 })
        ));
        assert!(matches!(
            scenario.commands[3],
            ScenarioCommand::Step(StepSpec::Duration { .. })
        ));
        assert!(scenario.scene.boxes.is_empty());
    }
}
