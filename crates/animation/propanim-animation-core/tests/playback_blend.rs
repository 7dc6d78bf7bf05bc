mod common;

use common::{approx, demo, load_clip, Demo};
use propanim_animation_core::{
    Animator, AnimatorConfig, Blend1D, Blend2D, ClipId, ClipState, Layer, LayerStatus, WrapMode,
};

fn animator(d: &Demo) -> Animator {
    Animator::new(d.root, AnimatorConfig::default())
}

fn position_x(d: &Demo) -> f32 {
    d.scene.transform(d.root).unwrap().position[0]
}

#[test]
fn blend_1d_quarter_way() {
    let mut d = demo();
    let mut anim = animator(&d);
    let idle = anim.add_clip(load_clip("idle"));
    let run = anim.add_clip(load_clip("run"));

    anim.blend_1d(&Blend1D::new([(idle, 0.0), (run, 1.0)]), 0.25)
        .unwrap();
    let out = anim.update(&mut d.scene, 0.016);
    approx(out.change("Position.x").unwrap(), 3.0, 1e-5);
    assert_eq!(anim.layer_status(Layer::Base), LayerStatus::Paused);

    // Pull-based: a new parameter fully recomputes the weights.
    anim.blend_1d(&Blend1D::new([(idle, 0.0), (run, 1.0)]), 5.0)
        .unwrap();
    anim.update(&mut d.scene, 0.016);
    approx(position_x(&d), 6.0, 1e-5);
}

#[test]
fn repeated_blend_keeps_bindings() {
    let mut d = demo();
    let mut anim = animator(&d);
    let idle = anim.add_clip(load_clip("idle"));
    let lamp = anim.add_clip(load_clip("lamp-pulse"));
    let info = Blend1D::new([(idle, 0.0), (lamp, 1.0)]);

    let mut versions = Vec::new();
    let mut skipped = Vec::new();
    for t in [0.0, 0.5, 1.0] {
        anim.blend_1d(&info, t).unwrap();
        versions.push(anim.playback().layout_version());
        skipped.push(anim.update(&mut d.scene, 0.016).skipped.len());
    }
    assert_eq!(versions[0], versions[1]);
    assert_eq!(versions[1], versions[2]);
    assert_eq!(skipped, vec![2, 0, 0]);
    // At t = 1 idle has zero weight, so Position.x keeps its last written value.
    approx(position_x(&d), 1.0, 1e-5);
}

#[test]
fn empty_blend_leaves_playback_alone() {
    let d = demo();
    let mut anim = animator(&d);
    let idle = anim.add_clip(load_clip("idle"));
    anim.play(idle).unwrap();
    let version = anim.playback().layout_version();

    anim.blend_1d(&Blend1D { clips: Vec::new() }, 0.5).unwrap();
    assert_eq!(anim.playback().layout_version(), version);
    assert_eq!(anim.layer_status(Layer::Base), LayerStatus::Playing);
}

#[test]
fn blend_2d_center_averages_corners() {
    let mut d = demo();
    let mut anim = animator(&d);
    let info = Blend2D {
        top_left: anim.add_clip(load_clip("lean-tl")),
        top_right: anim.add_clip(load_clip("lean-tr")),
        bot_left: anim.add_clip(load_clip("lean-bl")),
        bot_right: anim.add_clip(load_clip("lean-br")),
    };
    anim.blend_2d(&info, 0.5, 0.5).unwrap();
    anim.update(&mut d.scene, 0.016);
    approx(position_x(&d), 2.5, 1e-5);

    anim.blend_2d(&info, 1.0, 0.0).unwrap();
    anim.update(&mut d.scene, 0.016);
    approx(position_x(&d), 2.0, 1e-5);
}

#[test]
fn blend_with_unknown_clip_changes_nothing() {
    let d = demo();
    let mut anim = animator(&d);
    let idle = anim.add_clip(load_clip("idle"));
    assert!(anim
        .blend_1d(&Blend1D::new([(idle, 0.0), (ClipId(99), 1.0)]), 0.5)
        .is_err());
    assert!(!anim.is_playing());
}

#[test]
fn clamp_holds_at_duration() {
    let mut d = demo();
    let mut anim = animator(&d);
    let run = anim.add_clip(load_clip("run"));
    anim.set_wrap_mode(WrapMode::Clamp);
    anim.play(run).unwrap();
    anim.update(&mut d.scene, 5.0);

    let state = anim.get_state(run).unwrap();
    assert_eq!(state.time, 1.0);
    assert_eq!(state.wrap_mode, WrapMode::Clamp);
    assert!(anim.is_playing());
    assert_eq!(anim.layer_status(Layer::Base), LayerStatus::Playing);
}

#[test]
fn cross_fade_overlaps_then_retires_old_clip() {
    let mut d = demo();
    let mut anim = animator(&d);
    let idle = anim.add_clip(load_clip("idle"));
    let run = anim.add_clip(load_clip("run"));
    anim.play(idle).unwrap();
    anim.update(&mut d.scene, 0.1);
    approx(position_x(&d), 2.0, 1e-5);

    anim.cross_fade(run, 1.0).unwrap();
    anim.update(&mut d.scene, 0.5);
    approx(position_x(&d), 4.0, 1e-5);

    anim.update(&mut d.scene, 0.6);
    approx(position_x(&d), 6.0, 1e-5);
    assert_eq!(anim.playback().num_clips(), 1);
    assert!(anim.get_state(idle).is_none());
}

#[test]
fn cross_fade_without_length_is_play() {
    let mut d = demo();
    let mut anim = animator(&d);
    let idle = anim.add_clip(load_clip("idle"));
    let run = anim.add_clip(load_clip("run"));
    anim.play(idle).unwrap();
    anim.cross_fade(run, 0.0).unwrap();
    anim.update(&mut d.scene, 0.1);
    approx(position_x(&d), 6.0, 1e-5);
    assert_eq!(anim.playback().num_clips(), 1);
}

#[test]
fn additive_layer_adds_on_top_of_base() {
    let mut d = demo();
    let mut anim = animator(&d);
    let idle = anim.add_clip(load_clip("idle"));
    let nod = anim.add_clip(load_clip("nod-additive"));
    anim.play(idle).unwrap();
    assert!(anim.blend_additive(nod, 0.5, 0.0, 1).unwrap());
    anim.update(&mut d.scene, 0.1);
    approx(position_x(&d), 2.5, 1e-5);

    // A non-additive clip is refused and clears the layer.
    assert!(!anim.blend_additive(idle, 1.0, 0.0, 1).unwrap());
    assert_eq!(anim.layer_status(Layer::Additive(1)), LayerStatus::Empty);
    anim.update(&mut d.scene, 0.1);
    approx(position_x(&d), 2.0, 1e-5);
}

#[test]
fn additive_layer_zero_sits_beside_the_base_layer() {
    let mut d = demo();
    let mut anim = animator(&d);
    let idle = anim.add_clip(load_clip("idle"));
    let nod = anim.add_clip(load_clip("nod-additive"));
    anim.play(idle).unwrap();
    assert!(anim.blend_additive(nod, 0.5, 0.0, 0).unwrap());
    anim.update(&mut d.scene, 0.1);
    approx(position_x(&d), 2.5, 1e-5);
    assert_eq!(anim.get_state(nod).unwrap().layer, Layer::Additive(0));

    anim.stop(Layer::Base);
    assert_eq!(anim.layer_status(Layer::Additive(0)), LayerStatus::Playing);
}

#[test]
fn additive_fade_in_ramps_weight() {
    let mut d = demo();
    let mut anim = animator(&d);
    let idle = anim.add_clip(load_clip("idle"));
    let nod = anim.add_clip(load_clip("nod-additive"));
    anim.play(idle).unwrap();
    anim.blend_additive(nod, 1.0, 2.0, 3).unwrap();
    anim.update(&mut d.scene, 0.5);
    approx(position_x(&d), 2.25, 1e-5);
    anim.update(&mut d.scene, 2.0);
    approx(position_x(&d), 3.0, 1e-5);
}

#[test]
fn sample_pins_a_frame() {
    let mut d = demo();
    let mut anim = animator(&d);
    let wave = anim.add_clip(load_clip("wave"));
    anim.sample(wave, 1.0).unwrap();
    anim.update(&mut d.scene, 0.25);
    approx(d.scene.transform(d.arm).unwrap().position[1], 2.0, 1e-5);
    anim.set_speed(3.0);
    anim.update(&mut d.scene, 0.25);
    assert_eq!(anim.get_state(wave).unwrap().time, 1.0);
}

#[test]
fn set_state_seeks_and_get_state_wraps() {
    let mut d = demo();
    let mut anim = animator(&d);
    let wave = anim.add_clip(load_clip("wave"));
    anim.set_state(
        wave,
        ClipState {
            time: 5.0,
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(anim.get_state(wave).unwrap().time, 1.0);
    anim.update(&mut d.scene, 0.0);
    approx(d.scene.transform(d.arm).unwrap().position[1], 2.0, 1e-5);
}

#[test]
fn speed_scales_time_and_stop_silences() {
    let mut d = demo();
    let mut anim = animator(&d);
    let wave = anim.add_clip(load_clip("wave"));
    anim.play(wave).unwrap();
    anim.set_speed(2.0);
    anim.update(&mut d.scene, 0.25);
    approx(anim.get_state(wave).unwrap().time, 0.5, 1e-6);

    anim.stop(Layer::Base);
    assert!(!anim.is_playing());
    assert!(anim.update(&mut d.scene, 0.25).changes.is_empty());
}
