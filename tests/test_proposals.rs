mod common;

use common::*;
use image::{DynamicImage, GrayImage};
use signspot::classify::{CROP_SIZE, Detection};
use signspot::{
    ChannelMode, ClassifierRegistry, DetectionParams, PipelineObserver, ProposalCallback, RegionClassifier,
    classify_proposals,
};

#[test]
fn square_and_disc_are_proposed() -> anyhow::Result<()> {
    let (image, square, disc) = square_and_disc_scene();
    let extractor = ProposalExtractor::default();

    let proposals = extractor.extract(&image);

    assert_eq!(proposals.len(), 2, "unexpected proposals: {:?}", proposals);
    assert_eq!(proposals.count(ShapeLabel::Rectangle), 1);
    assert_eq!(proposals.count(ShapeLabel::Circle), 1);

    let rect_box = proposals.get(ShapeLabel::Rectangle)[0];
    let circle_box = proposals.get(ShapeLabel::Circle)[0];
    assert!(rect_box.contains(&must_contain(&square, 15)), "{} vs {}", rect_box, square);
    assert!(circle_box.contains(&must_contain(&disc, 15)), "{} vs {}", circle_box, disc);
    assert!(!rect_box.contains(&circle_box));

    for (_, bbox) in proposals.iter() {
        assert!(bbox.fits_within(image.width(), image.height()));
    }
    Ok(())
}

#[test]
fn extraction_is_repeatable() {
    let (image, _, _) = square_and_disc_scene();
    let extractor = ProposalExtractor::default();

    let first = extractor.extract(&image);
    let second = extractor.extract(&image);

    assert_eq!(first, second);
}

#[test]
fn triangle_is_proposed() {
    let mut canvas = blank_canvas(200, 180);
    fill_polygon(&mut canvas, &[(100, 40), (160, 140), (40, 140)], SIGN_YELLOW);

    let proposals = ProposalExtractor::default().extract(&DynamicImage::ImageRgb8(canvas));

    assert_eq!(proposals.len(), 1, "unexpected proposals: {:?}", proposals);
    assert_eq!(proposals.count(ShapeLabel::Triangle), 1);
}

#[test]
fn boxes_are_clipped_at_the_border() {
    let mut canvas = blank_canvas(100, 100);
    fill_square(&mut canvas, 5, 5, 50, SIGN_RED);

    let proposals = ProposalExtractor::default().extract(&DynamicImage::ImageRgb8(canvas));

    assert_eq!(proposals.count(ShapeLabel::Rectangle), 1);
    let bbox = proposals.get(ShapeLabel::Rectangle)[0];
    assert_eq!((bbox.x, bbox.y), (0, 0));
    assert!(bbox.fits_within(100, 100));
}

#[test]
fn signs_cut_by_the_left_edge_are_proposed() {
    for (x, y) in [(0, 30), (0, 0)] {
        let mut canvas = blank_canvas(100, 100);
        let square = fill_square(&mut canvas, x, y, 50, SIGN_RED);

        let proposals = ProposalExtractor::default().extract(&DynamicImage::ImageRgb8(canvas));

        assert_eq!(proposals.len(), 1, "square at ({x}, {y}): {:?}", proposals);
        assert_eq!(proposals.count(ShapeLabel::Rectangle), 1);
        let bbox = proposals.get(ShapeLabel::Rectangle)[0];
        assert_eq!(bbox.x, 0);
        assert!(bbox.contains(&must_contain(&square, 15)), "{} vs {}", bbox, square);
        assert!(bbox.fits_within(100, 100));
    }
}

#[test]
fn fully_saturated_image_is_one_region() {
    let image = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(200, 200, SIGN_RED));

    let proposals = ProposalExtractor::default().extract(&image);

    assert_eq!(proposals.len(), 1, "unexpected proposals: {:?}", proposals);
    assert_eq!(proposals.get(ShapeLabel::Rectangle), &[BoundingBox::new(0, 0, 200, 200)]);
}

#[test]
fn repeated_shapes_share_a_label() {
    let mut canvas = blank_canvas(400, 300);
    let small = fill_square(&mut canvas, 40, 40, 60, SIGN_RED);
    let large = fill_square(&mut canvas, 220, 120, 80, SIGN_BLUE);

    let proposals = ProposalExtractor::default().extract(&DynamicImage::ImageRgb8(canvas));

    assert_eq!(proposals.len(), 2, "unexpected proposals: {:?}", proposals);
    assert_eq!(proposals.count(ShapeLabel::Rectangle), 2);
    let boxes = proposals.get(ShapeLabel::Rectangle);
    for shape in [small, large] {
        let covering = boxes.iter().filter(|b| b.contains(&must_contain(&shape, 15))).count();
        assert_eq!(covering, 1, "{} not covered by exactly one of {:?}", shape, boxes);
    }
}

#[test]
fn thin_and_tiny_regions_are_filtered() {
    let mut canvas = blank_canvas(300, 200);
    fill_square(&mut canvas, 20, 20, 6, SIGN_RED);
    // Aspect ratio far above the limit
    imageproc::drawing::draw_filled_rect_mut(
        &mut canvas,
        imageproc::rect::Rect::at(20, 100).of_size(250, 20),
        SIGN_BLUE,
    );

    let proposals = ProposalExtractor::default().extract(&DynamicImage::ImageRgb8(canvas));

    assert!(proposals.is_empty(), "unexpected proposals: {:?}", proposals);
}

#[test]
fn images_without_saturation_yield_nothing() {
    let extractor = ProposalExtractor::default();

    assert!(extractor.extract(&DynamicImage::ImageRgb8(blank_canvas(64, 48))).is_empty());
    assert!(extractor.extract(&DynamicImage::new_rgb8(0, 0)).is_empty());
    assert!(extractor.get_mask(&DynamicImage::new_rgb8(0, 0)).is_empty());
}

#[test]
fn hue_mode_finds_the_same_shapes() -> anyhow::Result<()> {
    let (image, square, disc) = square_and_disc_scene();
    let config = ProposalConfig::from_json_str(r#"{ "preprocess": { "channel": "red_blue_hue" } }"#)?;
    assert_eq!(config.preprocess.channel, ChannelMode::RedBlueHue);

    let proposals = ProposalExtractor::new(config).extract(&image);

    assert_eq!(proposals.count(ShapeLabel::Rectangle), 1);
    assert_eq!(proposals.count(ShapeLabel::Circle), 1);
    assert!(proposals.get(ShapeLabel::Rectangle)[0].contains(&must_contain(&square, 15)));
    assert!(proposals.get(ShapeLabel::Circle)[0].contains(&must_contain(&disc, 15)));
    Ok(())
}

#[test]
fn zero_margin_keeps_the_shape_extent() -> anyhow::Result<()> {
    let (image, square, _) = square_and_disc_scene();
    let config = ProposalConfig::from_json_str(r#"{ "margin": 0 }"#)?;

    let proposals = ProposalExtractor::new(config).extract(&image);

    let bbox = proposals.get(ShapeLabel::Rectangle)[0];
    assert!(square.contains(&bbox));
    assert!(bbox.width + 2 * EDGE_TOLERANCE >= square.width);
    assert!(bbox.height + 2 * EDGE_TOLERANCE >= square.height);
    Ok(())
}

#[test]
fn callback_sees_every_proposal() {
    let (image, _, _) = square_and_disc_scene();
    let extractor = ProposalExtractor::default();

    let mut seen = Vec::new();
    let proposals = extractor.extract_observed(
        &image,
        &mut ProposalCallback(|label: ShapeLabel, bbox: &BoundingBox| seen.push((label, *bbox))),
    );

    let expected: Vec<_> = proposals.iter().map(|(l, b)| (l, *b)).collect();
    seen.sort_by_key(|(label, _)| *label);
    assert_eq!(seen, expected);
}

#[derive(Default)]
struct StageCounter {
    inputs: usize,
    stages: Vec<String>,
    finished: Option<usize>,
}

impl PipelineObserver for StageCounter {
    fn on_input(&mut self, _image: &DynamicImage) {
        self.inputs += 1;
    }

    fn on_stage(&mut self, _index: usize, name: &str, _image: &DynamicImage) {
        self.stages.push(name.to_string());
    }

    fn on_finish(&mut self, proposals: &ProposalSet) {
        self.finished = Some(proposals.len());
    }
}

#[test]
fn observer_sees_every_stage() {
    let (image, _, _) = square_and_disc_scene();
    let extractor = ProposalExtractor::default();
    let mut counter = StageCounter::default();

    let proposals = extractor.extract_observed(&image, &mut counter);

    assert_eq!(counter.inputs, 1);
    assert_eq!(counter.stages, extractor.preprocessor().pipeline().step_names());
    assert_eq!(counter.finished, Some(proposals.len()));
}

/// Scores a crop by its share of bright pixels
struct Brightness;

impl RegionClassifier for Brightness {
    fn detect(&self, region: &GrayImage, _params: &DetectionParams) -> Vec<Detection> {
        let bright = region.pixels().filter(|p| p.0[0] > 128).count();
        vec![Detection {
            confidence: bright as f64 / (CROP_SIZE * CROP_SIZE) as f64,
            region: BoundingBox::new(0, 0, region.width(), region.height()),
        }]
    }
}

#[test]
fn proposals_are_handed_to_classifiers() {
    let (image, _, _) = square_and_disc_scene();
    let proposals = ProposalExtractor::default().extract(&image);
    let registry = ClassifierRegistry::builder().register("bright", Brightness).build();

    let detections = classify_proposals(&image, &proposals, &registry, &DetectionParams::default());

    assert_eq!(detections.len(), proposals.len());
    for detection in &detections {
        assert_eq!(detection.sign, "bright");
        assert_eq!(detection.region, detection.hit);
        assert!(detection.confidence > 0.0 && detection.confidence <= 1.0);
    }
}
