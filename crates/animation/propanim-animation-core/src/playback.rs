//! Per-layer clip playback state.
//!
//! One base layer plus any number of numbered additive layers. Each active
//! clip is keyed by (clip, layer) and carries its own time, speed, weight, wrap
//! mode and optional fade. Playback knows nothing about curves: it only
//! advances time and reports the steps taken so events can be swept.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::ids::ClipId;

/// Playback slot. The base layer sits outside the additive numbering, so
/// additive layer 0 is an ordinary additive layer.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layer {
    #[default]
    Base,
    Additive(u32),
}

impl Layer {
    #[inline]
    pub fn is_additive(self) -> bool {
        matches!(self, Layer::Additive(_))
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WrapMode {
    #[default]
    Loop,
    Clamp,
}

impl WrapMode {
    /// Bring `time` into `[0, length]`. Zero-length clips always sit at 0.
    pub fn wrap(self, time: f32, length: f32) -> f32 {
        if length <= 0.0 {
            return 0.0;
        }
        match self {
            WrapMode::Loop => time.rem_euclid(length),
            WrapMode::Clamp => time.clamp(0.0, length),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipState {
    pub layer: Layer,
    /// Seconds from the clip start.
    pub time: f32,
    pub speed: f32,
    /// Nominally in [0, 1]; values outside extrapolate linearly.
    pub weight: f32,
    pub wrap_mode: WrapMode,
}

impl Default for ClipState {
    fn default() -> Self {
        Self {
            layer: Layer::Base,
            time: 0.0,
            speed: 1.0,
            weight: 1.0,
            wrap_mode: WrapMode::Loop,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FadeDirection {
    In,
    Out,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Fade {
    pub direction: FadeDirection,
    /// Elapsed seconds, kept in `[0, length]`.
    pub time: f32,
    pub length: f32,
}

impl Fade {
    fn new(direction: FadeDirection, length: f32) -> Self {
        Self {
            direction,
            time: 0.0,
            length,
        }
    }

    /// Multiplier applied to the clip weight.
    pub fn factor(&self) -> f32 {
        let t = if self.length > 0.0 {
            (self.time / self.length).clamp(0.0, 1.0)
        } else {
            1.0
        };
        match self.direction {
            FadeDirection::In => t,
            FadeDirection::Out => 1.0 - t,
        }
    }

    pub fn finished(&self) -> bool {
        self.time >= self.length
    }
}

/// What playback needs to know about a clip without owning it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ClipHandle {
    pub id: ClipId,
    pub length: f32,
    pub additive: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ActiveClip {
    pub handle: ClipHandle,
    pub state: ClipState,
    pub fade: Option<Fade>,
    /// Placed by `sample` or a blend; `set_speed` leaves it still.
    pub pinned: bool,
}

impl ActiveClip {
    #[inline]
    pub fn effective_weight(&self) -> f32 {
        self.state.weight * self.fade.map_or(1.0, |f| f.factor())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LayerStatus {
    Empty,
    Playing,
    /// Every clip on the layer has zero speed.
    Paused,
}

/// Time swept by one clip during `advance`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TimeStep {
    pub clip: ClipId,
    pub layer: Layer,
    /// Wrapped time before the step.
    pub from: f32,
    /// Signed `speed * dt`.
    pub delta: f32,
    pub length: f32,
    pub wrap_mode: WrapMode,
}

#[derive(Clone, Debug)]
pub struct ClipPlayback {
    clips: Vec<ActiveClip>,
    pub default_speed: f32,
    pub default_wrap_mode: WrapMode,
    layout_version: u64,
}

impl Default for ClipPlayback {
    fn default() -> Self {
        Self::new(1.0, WrapMode::Loop)
    }
}

impl ClipPlayback {
    pub fn new(default_speed: f32, default_wrap_mode: WrapMode) -> Self {
        Self {
            clips: Vec::new(),
            default_speed,
            default_wrap_mode,
            layout_version: 0,
        }
    }

    /// Bumped whenever the set of active (clip, layer) pairs changes.
    #[inline]
    pub fn layout_version(&self) -> u64 {
        self.layout_version
    }

    fn touch_layout(&mut self) {
        self.layout_version = self.layout_version.wrapping_add(1);
    }

    fn fresh_state(&self, layer: Layer, weight: f32) -> ClipState {
        ClipState {
            layer,
            time: 0.0,
            speed: self.default_speed,
            weight,
            wrap_mode: self.default_wrap_mode,
        }
    }

    /// Find or insert `clip` on `layer`. With `stop_existing`, every other clip
    /// on that layer is removed first. Returns the slot index, or `None` when
    /// only clearing (`clip` is `None`).
    pub fn add_clip(
        &mut self,
        clip: Option<ClipHandle>,
        layer: Layer,
        stop_existing: bool,
    ) -> Option<usize> {
        let id = clip.map(|c| c.id);
        let before = self.clips.len();
        if stop_existing {
            self.clips
                .retain(|c| c.state.layer != layer || Some(c.handle.id) == id);
        }
        if self.clips.len() != before {
            self.touch_layout();
        }

        let handle = clip?;
        let existing = self
            .clips
            .iter()
            .position(|c| c.state.layer == layer && c.handle.id == handle.id);
        if let Some(idx) = existing {
            self.clips[idx].handle = handle;
            return Some(idx);
        }
        let state = self.fresh_state(layer, 1.0);
        self.clips.push(ActiveClip {
            handle,
            state,
            fade: None,
            pinned: false,
        });
        self.touch_layout();
        Some(self.clips.len() - 1)
    }

    /// Replace whatever occupies the base layer, no fade.
    pub fn play(&mut self, clip: ClipHandle) {
        let state = self.fresh_state(Layer::Base, 1.0);
        if let Some(idx) = self.add_clip(Some(clip), Layer::Base, true) {
            let slot = &mut self.clips[idx];
            slot.state = state;
            slot.fade = None;
            slot.pinned = false;
        }
    }

    /// Put an additive clip on additive layer `layer`, ramping in over
    /// `fade_length` seconds. A non-additive clip clears the layer and is
    /// refused.
    pub fn blend_additive(
        &mut self,
        clip: ClipHandle,
        weight: f32,
        fade_length: f32,
        layer: u32,
    ) -> bool {
        let layer = Layer::Additive(layer);
        if !clip.additive {
            warn!(
                "blend_additive: clip {:?} holds no additive animation; clearing {layer:?}",
                clip.id
            );
            self.add_clip(None, layer, true);
            return false;
        }
        let state = self.fresh_state(layer, weight);
        if let Some(idx) = self.add_clip(Some(clip), layer, true) {
            let slot = &mut self.clips[idx];
            slot.state = state;
            slot.pinned = false;
            slot.fade = (fade_length > 0.0).then(|| Fade::new(FadeDirection::In, fade_length));
        }
        true
    }

    /// Place still, clamped clips on the base layer with fixed weights. Base
    /// clips missing from `entries` are removed; clips already present keep
    /// their slot, so re-applying the same set leaves the layout untouched.
    /// Used by the 1D and 2D blends.
    pub fn set_static_weights(&mut self, entries: &[(ClipHandle, f32)]) {
        let before = self.clips.len();
        self.clips.retain(|c| {
            c.state.layer != Layer::Base || entries.iter().any(|(h, _)| h.id == c.handle.id)
        });
        if self.clips.len() != before {
            self.touch_layout();
        }

        for (clip, weight) in entries {
            if let Some(idx) = self.add_clip(Some(*clip), Layer::Base, false) {
                let slot = &mut self.clips[idx];
                slot.state = ClipState {
                    layer: Layer::Base,
                    time: 0.0,
                    speed: 0.0,
                    weight: *weight,
                    wrap_mode: WrapMode::Clamp,
                };
                slot.fade = None;
                slot.pinned = true;
            }
        }
    }

    /// Fade `clip` in on the base layer while every other base clip fades out
    /// over the same window. `fade_length <= 0` is a plain `play`.
    pub fn cross_fade(&mut self, clip: ClipHandle, fade_length: f32) {
        if fade_length <= 0.0 {
            self.play(clip);
            return;
        }
        let state = self.fresh_state(Layer::Base, 1.0);
        if let Some(idx) = self.add_clip(Some(clip), Layer::Base, false) {
            let slot = &mut self.clips[idx];
            slot.state = state;
            slot.pinned = false;
            slot.fade = Some(Fade::new(FadeDirection::In, fade_length));
        }

        for other in self
            .clips
            .iter_mut()
            .filter(|c| c.state.layer == Layer::Base && c.handle.id != clip.id)
        {
            // Bake an in-flight fade into the weight so the new fade-out
            // starts from the weight currently in effect.
            if let Some(f) = other.fade.filter(|f| !f.finished()) {
                other.state.weight *= f.factor();
            }
            other.fade = Some(Fade::new(FadeDirection::Out, fade_length));
        }
    }

    /// Pin a single frame of `clip` on the base layer.
    pub fn sample(&mut self, clip: ClipHandle, time: f32) {
        let wrap_mode = self.default_wrap_mode;
        if let Some(idx) = self.add_clip(Some(clip), Layer::Base, true) {
            let slot = &mut self.clips[idx];
            slot.state = ClipState {
                layer: Layer::Base,
                time,
                speed: 0.0,
                weight: 1.0,
                wrap_mode,
            };
            slot.fade = None;
            slot.pinned = true;
        }
    }

    pub fn stop(&mut self, layer: Layer) {
        let before = self.clips.len();
        self.clips.retain(|c| c.state.layer != layer);
        if self.clips.len() != before {
            self.touch_layout();
        }
    }

    pub fn stop_all(&mut self) {
        if !self.clips.is_empty() {
            self.clips.clear();
            self.touch_layout();
        }
    }

    /// Sets the default speed and applies it to every clip not pinned in place.
    pub fn set_speed(&mut self, speed: f32) {
        self.default_speed = speed;
        for c in self.clips.iter_mut().filter(|c| !c.pinned) {
            c.state.speed = speed;
        }
    }

    /// Sets the default wrap mode and applies it to every clip.
    pub fn set_wrap_mode(&mut self, wrap_mode: WrapMode) {
        self.default_wrap_mode = wrap_mode;
        for c in &mut self.clips {
            c.state.wrap_mode = wrap_mode;
        }
    }

    /// State of the first entry playing `clip`, with time wrapped into range.
    pub fn get_state(&self, clip: ClipId) -> Option<ClipState> {
        self.clips.iter().find(|c| c.handle.id == clip).map(|c| {
            let mut state = c.state;
            state.time = state.wrap_mode.wrap(state.time, c.handle.length);
            state
        })
    }

    /// Insert or overwrite `clip` on `state.layer`, leaving other clips alone.
    pub fn set_state(&mut self, clip: ClipHandle, state: ClipState) {
        if let Some(idx) = self.add_clip(Some(clip), state.layer, false) {
            let slot = &mut self.clips[idx];
            slot.state = state;
            slot.pinned = false;
        }
    }

    /// Advance clip times by `speed * dt` and fades by `|dt|`. Completed
    /// fade-outs are removed, except under `Clamp` where the clip is held at
    /// zero weight.
    pub fn advance(&mut self, dt: f32) -> Vec<TimeStep> {
        let mut steps = Vec::with_capacity(self.clips.len());
        let mut removed = false;

        self.clips.retain_mut(|c| {
            let from = c.state.wrap_mode.wrap(c.state.time, c.handle.length);
            let delta = c.state.speed * dt;
            c.state.time = c.state.wrap_mode.wrap(from + delta, c.handle.length);
            if delta != 0.0 {
                steps.push(TimeStep {
                    clip: c.handle.id,
                    layer: c.state.layer,
                    from,
                    delta,
                    length: c.handle.length,
                    wrap_mode: c.state.wrap_mode,
                });
            }

            let Some(fade) = c.fade.as_mut() else {
                return true;
            };
            fade.time = (fade.time + dt.abs()).min(fade.length);
            if !fade.finished() {
                return true;
            }
            let direction = fade.direction;
            match direction {
                FadeDirection::In => {
                    c.fade = None;
                    true
                }
                FadeDirection::Out if c.state.wrap_mode == WrapMode::Clamp => {
                    c.state.weight = 0.0;
                    c.fade = None;
                    true
                }
                FadeDirection::Out => {
                    debug!("clip {:?} faded out on {:?}", c.handle.id, c.state.layer);
                    removed = true;
                    false
                }
            }
        });

        if removed {
            self.touch_layout();
        }
        steps
    }

    pub fn is_playing(&self) -> bool {
        !self.clips.is_empty()
    }

    pub fn num_clips(&self) -> usize {
        self.clips.len()
    }

    pub fn clip_at(&self, idx: usize) -> Option<ClipId> {
        self.clips.get(idx).map(|c| c.handle.id)
    }

    pub fn layer_status(&self, layer: Layer) -> LayerStatus {
        let mut on_layer = self.clips.iter().filter(|c| c.state.layer == layer).peekable();
        if on_layer.peek().is_none() {
            return LayerStatus::Empty;
        }
        if on_layer.all(|c| c.state.speed == 0.0) {
            LayerStatus::Paused
        } else {
            LayerStatus::Playing
        }
    }

    pub fn clips(&self) -> &[ActiveClip] {
        &self.clips
    }
}
