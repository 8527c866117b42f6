use std::path::{Path, PathBuf};

use canvas_compositor::codec::{decode, encode};
use canvas_compositor::overlay::BubbleLayout;
use canvas_compositor::{
    merge_by_source, ComposeOptions, Compositor, EditorKind, FontFace, ImageHandle, MaskSession,
    Operation, OutputFormat, OverlaySettings, Point, SpeechBubbleSettings, TailDirection,
    Typeface,
};
use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};

/// Fixed-advance face: every char is a solid `0.5 * px` wide block.
struct BlockFace;

impl Typeface for BlockFace {
    #[allow(clippy::cast_precision_loss)]
    fn measure(&self, text: &str, px: f32) -> f32 {
        text.chars().count() as f32 * px * 0.5
    }

    fn v_metrics(&self, px: f32) -> (f32, f32) {
        (px * 0.8, -px * 0.2)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn rasterize(
        &self,
        text: &str,
        px: f32,
        x: f32,
        y: f32,
        plot: &mut dyn FnMut(i32, i32, f32),
    ) {
        let x1 = (x + self.measure(text, px)).round() as i32;
        for py in (y - px * 0.8).round() as i32..(y + px * 0.2).round() as i32 {
            for px_x in x.round() as i32..x1 {
                plot(px_x, py, 1.0);
            }
        }
    }
}

fn png(img: &RgbaImage) -> ImageHandle {
    encode(img, OutputFormat::Png).unwrap()
}

fn dejavu_mono() -> FontFace {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fonts/DejaVuSansMono.ttf");
    FontFace::from_file(&path).unwrap()
}

fn scratch_dir(name: &str) -> PathBuf {
    let unique = format!("canvas-compositor-{name}-{}", uuid::Uuid::new_v4());
    let dir = std::env::temp_dir().join(unique);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn inpaint_session_punches_a_hole_under_the_stroke() {
    let photo = png(&RgbaImage::from_pixel(400, 400, Rgba([90, 120, 150, 255])));
    let mut session = MaskSession::inpaint(&photo, (400.0, 400.0)).unwrap();
    assert_eq!(session.kind(), EditorKind::Inpaint);
    session.set_brush_size(50.0);
    session.pointer_down(Point::new(200.0, 200.0));
    session.pointer_move(Point::new(201.0, 200.0));
    session.pointer_up();
    let mask = session.finish().unwrap();

    let out = Compositor::new().apply_erase_mask(&photo, &mask).unwrap();
    let img = decode(&out).unwrap();
    assert_eq!(img.dimensions(), (400, 400));
    assert_eq!(img.get_pixel(200, 200)[3], 0);
    assert_eq!(*img.get_pixel(0, 0), Rgba([90, 120, 150, 255]));
    assert_eq!(img.get_pixel(399, 399)[3], 255);
}

#[test]
fn translucent_white_mask_erases_completely() {
    let photo = png(&RgbaImage::from_pixel(4, 4, Rgba([9, 8, 7, 255])));
    let mask = png(&RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 128])));
    let out = decode(&Compositor::new().apply_erase_mask(&photo, &mask).unwrap()).unwrap();
    assert!(out.pixels().all(|p| *p == Rgba([9, 8, 7, 0])));
}

#[test]
fn letterboxed_session_maps_strokes_to_native_pixels() {
    // 800x400 shown in 400x400: rendered box 400x200 at y 100..300, scale 2.
    let photo = png(&RgbaImage::from_pixel(800, 400, Rgba([0, 0, 0, 255])));
    let mut session = MaskSession::inpaint(&photo, (400.0, 400.0)).unwrap();
    session.pointer_down(Point::new(100.0, 200.0));
    session.pointer_move(Point::new(100.0, 200.0));
    session.pointer_up();
    let mask = decode(&session.finish().unwrap()).unwrap();

    assert_eq!(mask.dimensions(), (800, 400));
    assert_eq!(*mask.get_pixel(200, 200), Rgba([255, 255, 255, 255]));
    assert_eq!(*mask.get_pixel(600, 200), Rgba([0, 0, 0, 255]));
}

#[test]
fn mosaic_session_pixelates_only_the_selected_blocks() {
    let checker = RgbaImage::from_fn(200, 200, |x, y| {
        if (x + y) % 2 == 0 {
            Rgba([0, 0, 0, 255])
        } else {
            Rgba([255, 255, 255, 255])
        }
    });
    let photo = png(&checker);
    let mut session = MaskSession::mosaic(&photo, (200.0, 200.0)).unwrap();
    session.pointer_down(Point::new(100.0, 100.0));
    session.pointer_move(Point::new(105.0, 105.0));
    session.pointer_up();
    let mask = session.finish().unwrap();

    let out = decode(&Compositor::new().apply_mosaic(&photo, &mask).unwrap()).unwrap();
    // Block side for a 200px wide image is 10.
    let block_color = *out.get_pixel(100, 100);
    for y in 100..110 {
        for x in 100..110 {
            assert_eq!(*out.get_pixel(x, y), block_color);
        }
    }
    assert!(block_color[0] > 100 && block_color[0] < 160);
    assert_eq!(out.get_pixel(0, 0), checker.get_pixel(0, 0));
    assert_eq!(out.get_pixel(1, 0), checker.get_pixel(1, 0));
}

#[test]
fn background_detection_tolerates_small_noise_only() {
    let engine = Compositor::new();
    let mut flat = RgbaImage::from_pixel(60, 60, Rgba([10, 10, 10, 255]));
    assert!(engine.detect_empty_background(&png(&flat)));

    flat.put_pixel(59, 0, Rgba([10, 30, 10, 255]));
    assert!(!engine.detect_empty_background(&png(&flat)));

    let mut cutout = RgbaImage::from_pixel(60, 60, Rgba([200, 0, 0, 255]));
    cutout.put_pixel(0, 0, Rgba([0, 0, 0, 0]));
    assert!(engine.detect_empty_background(&png(&cutout)));

    assert!(!engine.detect_empty_background(&ImageHandle::new("image/png", b"nope".to_vec())));
}

#[test]
fn bubble_tail_points_toward_the_canvas_center() {
    assert_eq!(TailDirection::for_position(0, 0), TailDirection::Down);
    assert_eq!(TailDirection::for_position(0, 2), TailDirection::Down);
    assert_eq!(TailDirection::for_position(2, 1), TailDirection::Up);
    assert_eq!(TailDirection::for_position(1, 0), TailDirection::Right);
    assert_eq!(TailDirection::for_position(1, 2), TailDirection::Left);
    assert_eq!(TailDirection::for_position(1, 1), TailDirection::None);

    let settings = SpeechBubbleSettings {
        text: "hi".to_string(),
        position: [1, 0],
        ..SpeechBubbleSettings::default()
    };
    let layout = BubbleLayout::compute(&settings, (800.0, 600.0), &BlockFace).unwrap();
    assert_eq!(layout.tail, TailDirection::Right);
    assert!((layout.box_x - 20.0).abs() < 1e-3);
    assert!(layout.box_x + layout.width + settings.tail_height <= 800.0);
}

#[test]
fn bubble_render_changes_pixels_and_keeps_size() {
    let src = png(&RgbaImage::from_pixel(400, 300, Rgba([30, 30, 30, 255])));
    let settings = SpeechBubbleSettings {
        text: "Hello\nthere".to_string(),
        font_size: 24.0,
        ..SpeechBubbleSettings::default()
    };
    let out = Compositor::with_typeface(BlockFace)
        .render_speech_bubble(&src, &settings)
        .unwrap();
    let img = decode(&out).unwrap();
    assert_eq!(img.dimensions(), (400, 300));
    assert!(img.pixels().any(|p| p[0] > 200));
    assert_eq!(*img.get_pixel(0, 0), Rgba([30, 30, 30, 255]));
}

#[test]
fn batch_frame_results_merge_back_by_id() {
    let engine = Compositor::with_typeface(BlockFace);
    let mut images: Vec<ImageHandle> = [(64, 48), (32, 32), (50, 70)]
        .iter()
        .map(|&(w, h)| png(&RgbaImage::from_pixel(w, h, Rgba([0, 0, 255, 255]))))
        .collect();
    let untouched = images.clone();
    let json = r#"{"text":"ok","fontSize":12,"frame":{"enabled":true,"thickness":4}}"#;
    let settings: OverlaySettings = serde_json::from_str(json).unwrap();

    let mut results = engine.batch_frame_and_text(&images, &settings);
    results.rotate_left(1);
    assert_eq!(merge_by_source(&mut images, results), 3);

    for (after, before) in images.iter().zip(&untouched) {
        assert_ne!(after.id(), before.id());
        let (a, b) = (decode(after).unwrap(), decode(before).unwrap());
        assert_eq!(a.dimensions(), b.dimensions());
        assert_eq!(*a.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
    }
}

#[test]
fn process_file_writes_next_to_requested_output() {
    let dir = scratch_dir("file");
    let input = dir.join("photo.png");
    let mask = dir.join("mask.png");
    RgbaImage::from_pixel(30, 30, Rgba([5, 6, 7, 255])).save(&input).unwrap();
    RgbaImage::from_pixel(30, 30, Rgba([255, 255, 255, 255])).save(&mask).unwrap();

    let output = dir.join("out").join("photo_erased.png");
    let result = Compositor::new().process_file(&input, &output, &Operation::EraseMask { mask });
    assert!(result.success, "{}", result.message);
    let written = image::open(&output).unwrap().to_rgba8();
    assert!(written.pixels().all(|p| p[3] == 0));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn process_directory_skips_disabled_brand_and_unsupported_files() {
    let dir = scratch_dir("dir");
    let input = dir.join("in");
    std::fs::create_dir_all(&input).unwrap();
    RgbaImage::from_pixel(10, 10, Rgba([1, 2, 3, 255])).save(input.join("a.png")).unwrap();
    std::fs::write(input.join("notes.txt"), "not an image").unwrap();

    let results = Compositor::new().process_directory(
        &input,
        &dir.join("out"),
        &Operation::Brand(canvas_compositor::BrandOverlaySettings::default()),
    );
    assert_eq!(results.len(), 1);
    assert!(results[0].success && results[0].skipped);
    assert!(!dir.join("out").join("a_branded.png").exists());

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn kept_jpeg_results_are_written_with_a_jpeg_extension() {
    let dir = scratch_dir("jpeg");
    let input = dir.join("in");
    std::fs::create_dir_all(&input).unwrap();
    DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 40, Rgb([120, 60, 30])))
        .save(input.join("a.jpg"))
        .unwrap();

    let engine = Compositor::new().with_options(ComposeOptions {
        keep_source_format: true,
        ..ComposeOptions::default()
    });
    let mut settings = OverlaySettings::default();
    settings.frame.enabled = true;
    settings.frame.thickness = 4.0;
    let out_dir = dir.join("out");
    let results = engine.process_directory(&input, &out_dir, &Operation::FrameText(settings));

    assert_eq!(results.len(), 1);
    assert!(results[0].success, "{}", results[0].message);
    let written = std::fs::read(out_dir.join("a_framed.jpg")).unwrap();
    assert_eq!(written[..3], [0xFF, 0xD8, 0xFF]);
    assert!(!out_dir.join("a_framed.png").exists());

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
#[allow(clippy::cast_possible_truncation)]
fn font_face_measures_and_rasterizes_real_glyphs() {
    let face = dejavu_mono();
    let one = face.measure("a", 20.0);
    assert!(one > 5.0 && one < 20.0);
    assert!((face.measure("abcd", 20.0) - 4.0 * one).abs() < 1e-2);
    assert!((face.measure("a", 40.0) - 2.0 * one).abs() < 1e-2);

    let (ascent, descent) = face.v_metrics(20.0);
    assert!(ascent > 0.0 && descent < 0.0);

    let mut hits = Vec::new();
    face.rasterize("H", 20.0, 10.0, 30.0, &mut |x: i32, y: i32, c: f32| {
        if c > 0.0 {
            hits.push((x, y));
        }
    });
    assert!(!hits.is_empty());
    let right = 10 + one.ceil() as i32 + 1;
    let top = (30.0 - ascent).floor() as i32 - 1;
    assert!(hits
        .iter()
        .all(|&(x, y)| (9..=right).contains(&x) && (top..=31).contains(&y)));

    let mut blank = 0;
    face.rasterize(" ", 20.0, 0.0, 30.0, &mut |_: i32, _: i32, c: f32| {
        if c > 0.0 {
            blank += 1;
        }
    });
    assert_eq!(blank, 0);
}

#[test]
fn font_face_draws_centered_text_block() {
    let src = png(&RgbaImage::from_pixel(200, 100, Rgba([0, 0, 0, 255])));
    let settings = OverlaySettings {
        text: "Hi".to_string(),
        font_size: 32.0,
        ..OverlaySettings::default()
    };
    let out = Compositor::with_typeface(dejavu_mono())
        .render_frame_and_text(&src, &settings)
        .unwrap();
    let img = decode(&out).unwrap();
    let lit: Vec<(u32, u32)> = img
        .enumerate_pixels()
        .filter(|(_, _, p)| p[0] > 128)
        .map(|(x, y, _)| (x, y))
        .collect();
    assert!(!lit.is_empty());
    assert!(lit.iter().all(|&(x, y)| (60..140).contains(&x) && (20..80).contains(&y)));
    assert_eq!(*img.get_pixel(0, 0), Rgba([0, 0, 0, 255]));
}
