//! Animator: owns clips and playback state and drives one scene subtree.
//!
//! Each `update` runs, in order:
//! 1. advance clip times and fades,
//! 2. rebuild bindings if the clip layout or the scene structure changed,
//! 3. sample and blend every curve, then write through the bindings,
//! 4. sweep event markers and dispatch them.

use hashbrown::{HashMap, HashSet};
use log::{debug, trace};
use thiserror::Error;

use crate::binder::{bind_clip_curves, ClipBindings};
use crate::blend::{weights_1d, weights_2d, Blend1D, Blend2D, CurveAccumulator};
use crate::clip::AnimationClip;
use crate::config::AnimatorConfig;
use crate::events::{dispatch, markers_crossed};
use crate::ids::{ClipId, IdAllocator};
use crate::outputs::{Change, FiredEvent, Outputs};
use crate::playback::{
    ClipHandle, ClipPlayback, ClipState, Layer, LayerStatus, TimeStep, WrapMode,
};
use crate::scene::{NodeId, Scene};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnimatorError {
    #[error("clip {0:?} is not registered")]
    UnknownClip(ClipId),
}

/// Minimal clip library storage.
#[derive(Default, Debug)]
struct ClipLib {
    items: Vec<(ClipId, AnimationClip)>,
}

impl ClipLib {
    fn insert(&mut self, id: ClipId, clip: AnimationClip) {
        self.items.push((id, clip));
    }

    fn get(&self, id: ClipId) -> Option<&AnimationClip> {
        self.items
            .iter()
            .find_map(|(c, clip)| if *c == id { Some(clip) } else { None })
    }
}

pub struct Animator {
    cfg: AnimatorConfig,
    ids: IdAllocator,
    clips: ClipLib,
    playback: ClipPlayback,
    root: NodeId,

    // Bindings and the versions they were built against.
    bindings: Option<ClipBindings>,
    morph_curves: HashSet<String>,
    bound_layout: u64,
    bound_structure: u64,
    hierarchy_dirty: bool,

    accum: CurveAccumulator,
    generic: HashMap<String, f32>,
    outputs: Outputs,
}

impl Animator {
    pub fn new(root: NodeId, cfg: AnimatorConfig) -> Self {
        Self {
            playback: ClipPlayback::new(cfg.default_speed, cfg.default_wrap_mode),
            cfg,
            ids: IdAllocator::new(),
            clips: ClipLib::default(),
            root,
            bindings: None,
            morph_curves: HashSet::new(),
            bound_layout: 0,
            bound_structure: 0,
            hierarchy_dirty: false,
            accum: CurveAccumulator::new(),
            generic: HashMap::new(),
            outputs: Outputs::default(),
        }
    }

    pub fn config(&self) -> &AnimatorConfig {
        &self.cfg
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Drive a different subtree. Bindings are rebuilt on the next update.
    pub fn set_root(&mut self, root: NodeId) {
        self.root = root;
        self.hierarchy_dirty = true;
    }

    /// Register a clip, returning its id.
    pub fn add_clip(&mut self, mut clip: AnimationClip) -> ClipId {
        clip.sort_events();
        let id = self.ids.alloc_clip();
        self.clips.insert(id, clip);
        id
    }

    pub fn clip(&self, id: ClipId) -> Option<&AnimationClip> {
        self.clips.get(id)
    }

    fn handle(&self, id: ClipId) -> Result<ClipHandle, AnimatorError> {
        let clip = self.clips.get(id).ok_or(AnimatorError::UnknownClip(id))?;
        Ok(ClipHandle {
            id,
            length: clip.length(),
            additive: clip.additive,
        })
    }

    // ---- Playback control ----

    pub fn play(&mut self, clip: ClipId) -> Result<(), AnimatorError> {
        let h = self.handle(clip)?;
        self.playback.play(h);
        Ok(())
    }

    /// Play an additive clip on additive layer `layer`. Returns `Ok(false)`
    /// when the clip holds no additive animation; the layer is cleared.
    pub fn blend_additive(
        &mut self,
        clip: ClipId,
        weight: f32,
        fade_length: f32,
        layer: u32,
    ) -> Result<bool, AnimatorError> {
        let h = self.handle(clip)?;
        Ok(self.playback.blend_additive(h, weight, fade_length, layer))
    }

    /// An empty descriptor leaves playback unchanged.
    pub fn blend_1d(&mut self, info: &Blend1D, t: f32) -> Result<(), AnimatorError> {
        if info.clips.is_empty() {
            return Ok(());
        }
        let handles = info
            .clips
            .iter()
            .map(|c| self.handle(c.clip))
            .collect::<Result<Vec<_>, _>>()?;
        let positions: Vec<f32> = info.clips.iter().map(|c| c.position).collect();
        let weights = weights_1d(&positions, t);
        let entries: Vec<(ClipHandle, f32)> = handles.into_iter().zip(weights).collect();
        self.playback.set_static_weights(&entries);
        Ok(())
    }

    pub fn blend_2d(&mut self, info: &Blend2D, u: f32, v: f32) -> Result<(), AnimatorError> {
        let corners = info.corners();
        let mut entries = Vec::with_capacity(4);
        for (clip, weight) in corners.into_iter().zip(weights_2d(u, v)) {
            entries.push((self.handle(clip)?, weight));
        }
        self.playback.set_static_weights(&entries);
        Ok(())
    }

    pub fn cross_fade(&mut self, clip: ClipId, fade_length: f32) -> Result<(), AnimatorError> {
        let h = self.handle(clip)?;
        self.playback.cross_fade(h, fade_length);
        Ok(())
    }

    /// Pin `clip` at `time` on the base layer.
    pub fn sample(&mut self, clip: ClipId, time: f32) -> Result<(), AnimatorError> {
        let h = self.handle(clip)?;
        self.playback.sample(h, time);
        Ok(())
    }

    pub fn stop(&mut self, layer: Layer) {
        self.playback.stop(layer);
    }

    pub fn stop_all(&mut self) {
        self.playback.stop_all();
    }

    pub fn get_state(&self, clip: ClipId) -> Option<ClipState> {
        self.playback.get_state(clip)
    }

    pub fn set_state(&mut self, clip: ClipId, state: ClipState) -> Result<(), AnimatorError> {
        let h = self.handle(clip)?;
        self.playback.set_state(h, state);
        Ok(())
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.cfg.default_speed = speed;
        self.playback.set_speed(speed);
    }

    pub fn set_wrap_mode(&mut self, wrap_mode: WrapMode) {
        self.cfg.default_wrap_mode = wrap_mode;
        self.playback.set_wrap_mode(wrap_mode);
    }

    // ---- Queries ----

    pub fn is_playing(&self) -> bool {
        self.playback.is_playing()
    }

    pub fn layer_status(&self, layer: Layer) -> LayerStatus {
        self.playback.layer_status(layer)
    }

    pub fn playback(&self) -> &ClipPlayback {
        &self.playback
    }

    /// Bindings from the last rebuild.
    pub fn bindings(&self) -> Option<&ClipBindings> {
        self.bindings.as_ref()
    }

    /// Blended value of a morph curve from the last update.
    pub fn generic_curve_value(&self, curve: &str) -> Option<f32> {
        self.generic.get(curve).copied()
    }

    /// The scene hierarchy under the root changed in a way the scene's own
    /// version counter cannot see. Bindings are rebuilt on the next update.
    pub fn notify_hierarchy_changed(&mut self) {
        self.hierarchy_dirty = true;
    }

    // ---- Tick ----

    pub fn update(&mut self, scene: &mut Scene, dt: f32) -> &Outputs {
        self.outputs.clear();
        let steps = self.playback.advance(dt);

        if self.bindings_stale(scene) {
            self.rebuild_bindings(scene);
        }
        self.evaluate(scene);
        self.fire_events(scene, &steps);

        &self.outputs
    }

    fn bindings_stale(&self, scene: &Scene) -> bool {
        self.bindings.is_none()
            || self.hierarchy_dirty
            || self.bound_layout != self.playback.layout_version()
            || self.bound_structure != scene.structure_version()
    }

    fn rebuild_bindings(&mut self, scene: &Scene) {
        debug!(
            "rebuilding bindings (layout {}, structure {})",
            self.playback.layout_version(),
            scene.structure_version()
        );
        let clips = &self.clips;
        let curves = self
            .playback
            .clips()
            .iter()
            .filter_map(|c| clips.get(c.handle.id))
            .flat_map(|clip| clip.curves.iter());

        self.morph_curves.clear();
        for curve in curves.clone().filter(|c| c.flags.is_morph()) {
            self.morph_curves.insert(curve.name.clone());
        }
        let bindings = bind_clip_curves(scene, self.root, curves);

        if self.cfg.record_skipped_bindings {
            self.outputs.skipped = bindings.skipped.clone();
        }
        self.bindings = Some(bindings);
        self.bound_layout = self.playback.layout_version();
        self.bound_structure = scene.structure_version();
        self.hierarchy_dirty = false;
    }

    fn evaluate(&mut self, scene: &mut Scene) {
        self.accum.clear();
        self.generic.clear();

        for active in self.playback.clips() {
            let weight = active.effective_weight();
            if weight == 0.0 {
                continue;
            }
            let Some(clip) = self.clips.get(active.handle.id) else {
                continue;
            };
            let looping = active.state.wrap_mode == WrapMode::Loop;
            let additive = active.state.layer.is_additive();
            for curve in &clip.curves {
                let sample = curve.curve.evaluate(active.state.time, looping);
                self.accum.add(&curve.name, sample, weight, additive);
            }
        }

        let Some(bindings) = self.bindings.as_ref() else {
            return;
        };
        for (name, value) in self.accum.iter() {
            if self.morph_curves.contains(name) {
                self.generic.insert(name.to_string(), value);
                continue;
            }
            let Some(setter) = bindings.get(name) else {
                continue;
            };
            match setter.apply(scene, value) {
                Ok(()) => {
                    trace!("{name} <- {value}");
                    self.outputs.push_change(Change {
                        curve: name.to_string(),
                        value,
                    });
                }
                Err(e) => debug!("skipping write to '{name}': {e}"),
            }
        }
    }

    fn fire_events(&mut self, scene: &mut Scene, steps: &[TimeStep]) {
        let cap = self.cfg.max_events_per_tick;
        for step in steps {
            let Some(clip) = self.clips.get(step.clip) else {
                continue;
            };
            for event in markers_crossed(&clip.events, step) {
                if self.outputs.events.len() >= cap {
                    debug!("event cap {cap} reached; dropping '{}'", event.name);
                    return;
                }
                let outcome = dispatch(scene, self.root, &event.name);
                self.outputs.push_event(FiredEvent {
                    clip: step.clip,
                    name: event.name.clone(),
                    time: event.time,
                    outcome,
                });
            }
        }
    }
}
