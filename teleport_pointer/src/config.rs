use std::{fs, path::Path, time::Duration};

use cgmath::{vec3, Deg, Quaternion, Rotation3, Vector3};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, TargetingError},
    marker::SourceIndex,
    scene::{LayerMask, TargetHandle},
};

/// How activation signals drive the beam.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationMode {
    /// Beam is on exactly while the activation input is held.
    Hold,
    /// First signal turns the beam on, a later one turns it off.
    Toggle,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivationConfig {
    pub mode: ActivationMode,
    /// The toggle action shares its button with the set (confirm) action.
    pub toggle_aliases_set: bool,
    /// Cooldown after the beam turns off or a destination is confirmed.
    pub activate_delay_secs: f32,
    /// Start the hovered object's use action when the beam touches it.
    pub activate_use_on_contact: bool,
}

impl ActivationConfig {
    /// Cooldown as a duration. Delays too large to represent saturate; use
    /// `validate` to reject them up front.
    pub fn activate_delay(&self) -> Duration {
        Duration::try_from_secs_f32(self.activate_delay_secs.max(0.0)).unwrap_or(Duration::MAX)
    }

    pub fn validate(&self) -> Result<()> {
        Duration::try_from_secs_f32(self.activate_delay_secs.max(0.0)).map_err(|err| {
            TargetingError::InvalidArgument(format!(
                "activate_delay_secs {} is not a usable duration: {}",
                self.activate_delay_secs, err
            ))
        })?;
        Ok(())
    }
}

impl Default for ActivationConfig {
    fn default() -> Self {
        ActivationConfig {
            mode: ActivationMode::Hold,
            toggle_aliases_set: false,
            activate_delay_secs: 0.0,
            activate_use_on_contact: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurvedBeamConfig {
    /// Longest forward cast, before the height limit shortens it.
    pub maximum_length: f32,
    /// Vertical alignment, as a percentage, above which the forward cast is clamped.
    /// 100 never clamps.
    pub height_limit_angle: f32,
    /// Number of samples probed for early collisions. 0 disables the check.
    pub collision_check_frequency: usize,
    /// Number of points in the rendered curve.
    pub pointer_density: usize,
    /// Extra height added to the curve's raised joint.
    pub beam_curve_offset: f32,
    /// Align the cursor with the surface normal instead of world up.
    pub cursor_matches_target_rotation: bool,
    pub layer_mask: u32,
}

impl CurvedBeamConfig {
    /// `height_limit_angle` clamped to `[0, 100]`.
    pub fn height_limit(&self) -> f32 {
        self.height_limit_angle.clamp(0.0, 100.0)
    }

    pub fn layers(&self) -> LayerMask {
        LayerMask::from_bits_truncate(self.layer_mask)
    }
}

impl Default for CurvedBeamConfig {
    fn default() -> Self {
        CurvedBeamConfig {
            maximum_length: 10.0,
            height_limit_angle: 100.0,
            collision_check_frequency: 0,
            pointer_density: 10,
            beam_curve_offset: 1.0,
            cursor_matches_target_rotation: false,
            layer_mask: LayerMask::raycast_default().bits(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StraightBeamConfig {
    pub maximum_length: f32,
    pub layer_mask: u32,
}

impl StraightBeamConfig {
    pub fn layers(&self) -> LayerMask {
        LayerMask::from_bits_truncate(self.layer_mask)
    }
}

impl Default for StraightBeamConfig {
    fn default() -> Self {
        StraightBeamConfig {
            maximum_length: 100.0,
            layer_mask: LayerMask::raycast_default().bits(),
        }
    }
}

/// Which beam projector a pointer uses.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BeamKind {
    Straight(StraightBeamConfig),
    Curved(CurvedBeamConfig),
}

impl Default for BeamKind {
    fn default() -> Self {
        BeamKind::Curved(CurvedBeamConfig::default())
    }
}

/// Beam and cursor colors, RGB in 0..1.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeamColors {
    pub valid: Vector3<f32>,
    pub invalid: Vector3<f32>,
}

impl Default for BeamColors {
    fn default() -> Self {
        // Cyan for valid destinations, orange-red for invalid ones
        Self {
            valid: vec3(0.0, 0.8, 1.0),
            invalid: vec3(1.0, 0.35, 0.1),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointerConfig {
    /// Input source driving this pointer. A pointer without one never activates.
    pub source_index: Option<SourceIndex>,
    pub activation: ActivationConfig,
    pub beam: BeamKind,
    pub colors: BeamColors,
}

impl PointerConfig {
    pub fn for_source(source_index: SourceIndex) -> Self {
        Self {
            source_index: Some(source_index),
            ..Default::default()
        }
    }
}

/// How a destination zone orients the player after teleporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationPolicy {
    /// Keep the player's current orientation.
    None,
    /// Face the anchor's forward, compensating for where the headset is looking.
    RelativeToSourceOrientation,
    /// Use the anchor rotation as is.
    Absolute,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneConfig {
    /// Scene node whose hits count as hitting this zone.
    pub target: TargetHandle,
    pub anchor_position: Vector3<f32>,
    /// Anchor heading around world up, in degrees.
    pub anchor_yaw_degrees: f32,
    pub snap_to_point: bool,
    pub enable_teleport: bool,
    pub rotation_policy: RotationPolicy,
    pub hide_pointer_cursor_on_hover: bool,
}

impl ZoneConfig {
    pub fn new(target: TargetHandle, anchor_position: Vector3<f32>) -> Self {
        Self {
            target,
            anchor_position,
            ..Default::default()
        }
    }

    pub fn anchor_rotation(&self) -> Quaternion<f32> {
        Quaternion::from_angle_y(Deg(self.anchor_yaw_degrees))
    }
}

impl Default for ZoneConfig {
    fn default() -> Self {
        ZoneConfig {
            target: TargetHandle(0),
            anchor_position: vec3(0.0, 0.0, 0.0),
            anchor_yaw_degrees: 0.0,
            snap_to_point: true,
            enable_teleport: true,
            rotation_policy: RotationPolicy::None,
            hide_pointer_cursor_on_hover: false,
        }
    }
}

/// Everything needed to compose a targeting scene.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetingConfig {
    pub pointers: Vec<PointerConfig>,
    pub zones: Vec<ZoneConfig>,
}

impl TargetingConfig {
    /// Parse and validate a configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for pointer in &self.pointers {
            pointer.activation.validate()?;
        }
        Ok(())
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| TargetingError::Io {
            operation: format!("read {}", path.display()),
            source,
        })?;
        Self::from_json_str(&json)
    }
}
