#![allow(dead_code)]
//! Demo scene and fixture loading shared by the integration tests.

use propanim_animation_core::{
    AnimationClip, AnimationEvent, BehaviorId, BehaviorRegistry, CurveFlags, Keyframe,
    LinearCurve, NamedCurve, NodeId, Rgba, Scene,
};
use serde::Deserialize;

pub fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

#[derive(Debug, Deserialize)]
struct CurveDesc {
    path: String,
    #[serde(default)]
    flags: Vec<String>,
    keys: Vec<Keyframe>,
}

/// On-disk clip description used by the JSON fixtures.
#[derive(Debug, Deserialize)]
pub struct ClipDesc {
    pub name: String,
    #[serde(default)]
    pub additive: bool,
    #[serde(default)]
    pub length: Option<f32>,
    #[serde(default)]
    curves: Vec<CurveDesc>,
    #[serde(default)]
    pub events: Vec<AnimationEvent>,
}

fn parse_flags(flags: &[String]) -> CurveFlags {
    flags.iter().fold(CurveFlags::empty(), |acc, f| {
        acc | match f.as_str() {
            "imported" => CurveFlags::IMPORTED,
            "morph_frame" => CurveFlags::MORPH_FRAME,
            "morph_weight" => CurveFlags::MORPH_WEIGHT,
            other => panic!("unknown curve flag '{other}'"),
        }
    })
}

impl ClipDesc {
    pub fn into_clip(self) -> AnimationClip {
        AnimationClip {
            name: self.name,
            curves: self
                .curves
                .into_iter()
                .map(|c| {
                    let keys = c.keys.iter().map(|k| (k.time, k.value));
                    NamedCurve::new(c.path, LinearCurve::new(keys))
                        .with_flags(parse_flags(&c.flags))
                })
                .collect(),
            events: self.events,
            additive: self.additive,
            length: self.length,
        }
    }
}

pub fn load_clip(name: &str) -> AnimationClip {
    propanim_test_fixtures::clips::load::<ClipDesc>(name)
        .unwrap_or_else(|e| panic!("fixture {name}: {e:#}"))
        .into_clip()
}

#[derive(Debug)]
pub struct Light {
    pub intensity: f32,
    pub tint: Rgba,
    pub enabled: bool,
    pub level: i32,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            intensity: 0.0,
            tint: Rgba::WHITE,
            enabled: false,
            level: 0,
        }
    }
}

#[derive(Debug, Default)]
pub struct Door {
    pub opened: u32,
    pub closed: u32,
}

#[derive(Debug, Default)]
pub struct Pose {
    pub offsets: Vec<[f32; 3]>,
    pub aim: [f32; 3],
}

pub fn registry() -> BehaviorRegistry {
    let mut reg = BehaviorRegistry::new();
    reg.register::<Light>("Light")
        .field("intensity", |l| &l.intensity, |l| &mut l.intensity)
        .field("tint", |l| &l.tint, |l| &mut l.tint)
        .field("enabled", |l| &l.enabled, |l| &mut l.enabled)
        .field("level", |l| &l.level, |l| &mut l.level);
    reg.register::<Door>("Door")
        .method("Open", |d| d.opened += 1)
        .method("Close", |d| d.closed += 1);
    reg.register::<Pose>("Pose")
        .list("offsets", |p| &p.offsets, |p| &mut p.offsets)
        .field("target.aim", |p| &p.aim, |p| &mut p.aim);
    reg
}

/// ```text
/// Rig (+Door, +Door, +Pose)
/// ├── Arm
/// │   └── Hand
/// └── Lamp (+Light)
/// ```
pub struct Demo {
    pub scene: Scene,
    pub root: NodeId,
    pub arm: NodeId,
    pub hand: NodeId,
    pub lamp: NodeId,
    pub light: BehaviorId,
    pub door: BehaviorId,
    pub spare_door: BehaviorId,
    pub pose: BehaviorId,
}

pub fn demo() -> Demo {
    let mut scene = Scene::new(registry());
    let root = scene.spawn("Rig", None).unwrap();
    let arm = scene.spawn("Arm", Some(root)).unwrap();
    let hand = scene.spawn("Hand", Some(arm)).unwrap();
    let lamp = scene.spawn("Lamp", Some(root)).unwrap();
    let light = scene.attach(lamp, Light::default()).unwrap();
    let door = scene.attach(root, Door::default()).unwrap();
    let spare_door = scene.attach(root, Door::default()).unwrap();
    let pose = scene
        .attach(
            root,
            Pose {
                offsets: vec![[0.0; 3]; 3],
                aim: [1.0, 2.0, 3.0],
            },
        )
        .unwrap();
    Demo {
        scene,
        root,
        arm,
        hand,
        lamp,
        light,
        door,
        spare_door,
        pose,
    }
}
