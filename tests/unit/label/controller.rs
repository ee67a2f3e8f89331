use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use super::*;
use crate::animation::clock::ManualClock;
use crate::foundation::error::TextBlurError;
use crate::text::rasterizer::RasterizedText;

/// Draws one 3px-wide block per character in the text color.
#[derive(Default)]
struct BlockRasterizer {
    renders: usize,
    fail: bool,
}

impl TextRasterizer for BlockRasterizer {
    fn render(&mut self, text: &StyledText, max_size: Size) -> TextBlurResult<RasterizedText> {
        if self.fail {
            return Err(TextBlurError::raster("stub rasterizer failure"));
        }
        self.renders += 1;
        let w = (text.text.chars().count() as u32 * 4).clamp(1, max_size.width as u32);
        let h = 6u32.clamp(1, max_size.height as u32);
        let px = text.style.color.to_premul().to_array();
        let mut data = vec![0u8; (w * h * 4) as usize];
        for y in 1..h.saturating_sub(1) {
            for x in (0..w).filter(|x| x % 4 < 3) {
                let i = ((y * w + x) * 4) as usize;
                data[i..i + 4].copy_from_slice(&px);
            }
        }
        Ok(RasterizedText {
            bitmap: Bitmap::from_premul_rgba8(w, h, data)?,
            measured: Size::new(f64::from(w), f64::from(h)),
        })
    }
}

type Label = TextBlurController<BlockRasterizer, ManualClock>;
type Log = Rc<RefCell<Vec<bool>>>;

fn params() -> BlurParameters {
    BlurParameters {
        number_of_stages: 10,
        blur_radius: 4.0,
        animation_duration: 1.0,
    }
}

fn options(eager: bool) -> LabelOptions {
    LabelOptions {
        eager_generation: eager,
        worker_threads: Some(1),
        ..LabelOptions::default()
    }
}

fn label_with(eager: bool) -> Label {
    let font = Font::new(vec![0u8; 4], 12.0).unwrap();
    TextBlurController::new(
        BlockRasterizer::default(),
        ManualClock::new(),
        font,
        params(),
        options(eager),
    )
    .unwrap()
}

fn ready_label(text: &str) -> Label {
    let mut label = label_with(true);
    label.set_text(text).unwrap();
    assert!(label.finish_generation().unwrap());
    label
}

fn recorder() -> (Log, Option<Completion>) {
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let sink = log.clone();
    let done: Completion = Box::new(move |finished| sink.borrow_mut().push(finished));
    (log, Some(done))
}

fn tick(label: &mut Label) {
    label.clock_mut().advance(Duration::from_millis(100));
    label.on_frame();
}

fn shows(label: &Label, bitmap: &Bitmap) -> bool {
    label
        .layers()
        .lower
        .contents
        .as_ref()
        .is_some_and(|b| b.ptr_eq(bitmap))
}

#[test]
fn new_label_is_empty_and_unblurred() {
    let mut label = label_with(true);
    assert!(label.layers().is_empty());
    assert!(!label.is_ready());
    assert!(!label.is_blurred());
    assert!(label.clock().is_paused());
    assert_eq!(label.text(), "");

    let (log, done) = recorder();
    label.set_blurred(true, true, done);
    let (unblur_log, unblur) = recorder();
    label.set_blurred(false, false, unblur);
    assert_eq!(*log.borrow(), vec![false]);
    assert_eq!(*unblur_log.borrow(), vec![true]);
    assert!(!label.queue.is_pending());
}

#[test]
fn eager_generation_shows_stage_zero_immediately() {
    let mut label = label_with(true);
    label.set_text("blur").unwrap();
    assert!(!label.is_ready());
    let stage0 = label.rendered_image().cloned().unwrap();
    assert!(shows(&label, &stage0));
    assert!(label.blurred_image().is_none());

    assert!(label.finish_generation().unwrap());
    let stages = label.stages().unwrap().clone();
    assert_eq!(stages.len(), 12);
    assert!(stages.unblurred().ptr_eq(&stage0));
    assert!(shows(&label, &stage0));
    assert!(!label.finish_generation().unwrap());
}

#[test]
fn instant_blur_is_idempotent_and_round_trips() {
    let mut label = ready_label("blur");
    let (log, done) = recorder();
    label.set_blurred(true, false, done);
    let max = label.blurred_image().cloned().unwrap();
    assert!(label.is_blurred());
    assert!(shows(&label, &max));

    let (again, done) = recorder();
    label.set_blurred(true, false, done);
    assert!(shows(&label, &max));
    assert_eq!(label.layers().upper.opacity, 0.0);

    label.set_blurred(false, false, None);
    assert!(!label.is_blurred());
    assert!(shows(&label, label.rendered_image().unwrap()));
    assert_eq!(*log.borrow(), vec![true]);
    assert_eq!(*again.borrow(), vec![true]);
}

#[test]
fn deferred_requests_keep_only_the_last_writer() {
    let mut label = label_with(true);
    label.set_text("late").unwrap();
    let (first, done1) = recorder();
    let (second, done2) = recorder();
    label.set_blurred(true, true, done1);
    label.set_blurred(true, false, done2);
    assert_eq!(*first.borrow(), vec![false]);
    assert!(second.borrow().is_empty());
    assert!(!label.is_blurred());

    label.finish_generation().unwrap();
    assert_eq!(*second.borrow(), vec![true]);
    assert!(label.is_blurred());
    assert!(!label.is_animating());
    assert!(shows(&label, label.blurred_image().unwrap()));
}

#[test]
fn eleven_frames_walk_every_stage_and_finish_once() {
    let mut label = ready_label("frames");
    let stages = label.stages().unwrap().clone();
    let (log, done) = recorder();
    label.set_blurred(true, true, done);
    assert!(label.is_animating());
    assert!(!label.clock().is_paused());

    for k in 1..=10 {
        tick(&mut label);
        assert!(shows(&label, stages.get(k).unwrap()), "frame {k}");
        let upper = label.layers().upper.contents.as_ref().unwrap();
        assert!(upper.ptr_eq(stages.get(k + 1).unwrap()));
        // Frame 1 still shows stage 1, the sharp duplicate, with the upper layer clear.
        assert_eq!(label.is_blurred(), k >= 2, "frame {k}");
        assert!(log.borrow().is_empty());
    }
    tick(&mut label);
    assert_eq!(*log.borrow(), vec![true]);
    assert!(label.is_blurred());
    assert!(!label.is_animating());
    assert!(label.clock().is_paused());
    assert!(shows(&label, stages.max_blurred()));

    tick(&mut label);
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn unblur_animation_reads_stages_backwards() {
    let mut label = ready_label("back");
    label.set_blurred(true, false, None);
    let stages = label.stages().unwrap().clone();
    let (log, done) = recorder();
    label.set_blurred(false, true, done);
    for k in 1..=10 {
        tick(&mut label);
        assert!(shows(&label, stages.get(11 - k).unwrap()), "frame {k}");
        // Frame 10 lands back on stage 1, the sharp duplicate.
        assert_eq!(label.is_blurred(), k < 10, "frame {k}");
    }
    tick(&mut label);
    assert_eq!(*log.borrow(), vec![true]);
    assert!(!label.is_blurred());
    assert!(shows(&label, stages.unblurred()));
}

#[test]
fn animated_request_to_current_state_finishes_immediately() {
    let mut label = ready_label("same");
    let (log, done) = recorder();
    label.set_blurred(false, true, done);
    assert_eq!(*log.borrow(), vec![true]);
    assert!(!label.is_animating());
}

#[test]
fn requests_while_running_supersede_or_reverse() {
    let mut label = ready_label("busy");
    let (first, done1) = recorder();
    label.set_blurred(true, true, done1);
    tick(&mut label);
    tick(&mut label);

    let (second, done2) = recorder();
    label.set_blurred(true, true, done2);
    assert_eq!(*first.borrow(), vec![false]);
    assert_eq!(label.driver.progress(), Duration::from_millis(200));

    let (third, done3) = recorder();
    label.set_blurred(false, true, done3);
    assert_eq!(*second.borrow(), vec![false]);
    assert_eq!(label.driver.target_blurred(), Some(false));

    let (fourth, done4) = recorder();
    label.set_blurred(true, false, done4);
    assert_eq!(*third.borrow(), vec![false]);
    assert_eq!(*fourth.borrow(), vec![true]);
    assert!(!label.is_animating());
    assert!(label.is_blurred());
}

#[test]
fn content_change_mid_animation_cancels_and_reblurs() {
    let mut label = ready_label("first");
    let (log, done) = recorder();
    label.set_blurred(true, true, done);
    tick(&mut label);
    tick(&mut label);

    label.set_text("second").unwrap();
    assert_eq!(*log.borrow(), vec![false]);
    assert!(!label.is_ready());
    assert!(!label.is_animating());
    assert!(!label.is_blurred());
    assert!(label.clock().is_paused());
    assert!(label.queue.is_pending());

    label.finish_generation().unwrap();
    assert!(label.is_blurred());
    assert!(shows(&label, label.blurred_image().unwrap()));
    assert_eq!(log.borrow().len(), 1);
}

#[test]
fn clearing_the_text_drops_everything() {
    let mut label = ready_label("gone");
    label.set_blurred(true, false, None);
    label.set_text("").unwrap();
    assert!(label.layers().is_empty());
    assert!(label.stages().is_none());
    assert!(label.rendered_image().is_none());
    assert!(!label.is_blurred());
    assert!(!label.queue.is_pending());
    assert!(!label.cache.is_generating());
}

#[test]
fn lazy_generation_waits_for_the_first_blur_request() {
    let mut label = label_with(false);
    label.set_text("lazy").unwrap();
    assert!(!label.cache.is_generating());
    let preview = label.rendered_image().cloned().unwrap();
    assert!(shows(&label, &preview));

    let (log, done) = recorder();
    label.set_blurred(true, false, done);
    assert!(label.cache.is_generating());
    // Stage 0 is recomputed for the run and still reads as sharp.
    assert!(!label.cache.unblurred().unwrap().ptr_eq(&preview));
    assert!(!label.is_blurred());
    label.finish_generation().unwrap();
    assert_eq!(*log.borrow(), vec![true]);
    assert!(label.is_blurred());
    assert_eq!(label.rasterizer.renders, 1);
}

#[test]
fn rasterizer_failures_surface_and_fail_requests() {
    let mut label = label_with(true);
    label.rasterizer.fail = true;
    assert!(matches!(
        label.set_text("broken"),
        Err(TextBlurError::Raster(_))
    ));
    assert!(label.layers().is_empty());

    let (log, done) = recorder();
    label.set_blurred(true, false, done);
    assert_eq!(*log.borrow(), vec![false]);
    assert!(!label.queue.is_pending());
}

#[test]
fn style_changes_regenerate_but_parameter_changes_wait() {
    let mut label = ready_label("style");
    let before = label.rasterizer.renders;

    label.set_blur_radius(2.0).unwrap();
    label.set_number_of_stages(4).unwrap();
    label.set_animation_duration(0.5).unwrap();
    assert!(label.is_ready());
    assert_eq!(label.stages().unwrap().number_of_stages(), 10);

    label.set_text_color(Rgba8::rgba(200, 0, 0, 255)).unwrap();
    assert!(!label.is_ready());
    label.finish_generation().unwrap();
    assert_eq!(label.stages().unwrap().number_of_stages(), 4);
    assert_eq!(label.rasterizer.renders, before + 1);

    label.set_alignment(TextAlignment::Center).unwrap();
    assert!(label.is_ready());
    assert_eq!(label.rasterizer.renders, before + 1);

    assert!(label.set_number_of_stages(1).is_err());
    assert!(label.set_blur_radius(f32::NAN).is_err());
    assert!(label.set_animation_duration(0.0).is_err());
    assert!(label.set_bounds(Size::new(-1.0, 4.0)).is_err());
    assert_eq!(label.params().number_of_stages, 4);
}

#[test]
fn background_is_composited_under_every_stage() {
    let mut label = ready_label("bg");
    label.set_background(Rgba8::BLACK).unwrap();
    label.finish_generation().unwrap();
    let stage0 = label.rendered_image().unwrap();
    assert_eq!(stage0.pixel(3, 0), Some([0, 0, 0, 255]));
}

#[test]
fn dropping_fails_pending_work_and_cancels_the_clock() {
    let mut label = label_with(true);
    label.set_text("drop").unwrap();
    let (log, done) = recorder();
    label.set_blurred(true, true, done);
    drop(label);
    assert_eq!(*log.borrow(), vec![false]);
}
