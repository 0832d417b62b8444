use image::ImageReader;
use signspot::detection::steps::*;
use signspot::{
    BoundingBox, ChannelPreprocessor, ContourClassifier, NoopObserver, Pipeline, ProposalCallback, ProposalExtractor,
    ShapeConfig, ShapeLabel,
};
use std::env;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <image_path>", args[0]);
        std::process::exit(1);
    }

    let image_path = &args[1];
    let img = ImageReader::open(image_path)?
        .decode()
        .map_err(|e| anyhow::anyhow!("Failed to decode image: {}", e))?;

    println!("Loaded image: {}x{}", img.width(), img.height());

    // Example 1: Default proposal pipeline
    println!("\n=== Default Proposal Pipeline ===");
    let standard = ProposalExtractor::default();
    println!("Steps: {}", standard.preprocessor().pipeline().step_names().join(" -> "));
    let proposals = standard.extract(&img);
    println!("Total proposals: {}", proposals.len());
    for (i, (label, bbox)) in proposals.iter().take(10).enumerate() {
        println!("  {}: {} at {}", i + 1, label, bbox);
    }

    // Example 2: Heavier smoothing, a lower threshold and a closing pass,
    // with polygons that fail the convexity test kept as non-convex
    println!("\n\n=== Custom Pipeline (Lenient Mask, Non-Convex Kept) ===");
    let pipeline = Pipeline::new()
        .add_step_boxed(Box::new(SaturationStep))
        .add_step_boxed(Box::new(EqualizeStep))
        .add_step_boxed(Box::new(BlurStep { sigma: 2.0 }))
        .add_step_boxed(Box::new(ThresholdStep { level: 170 }))
        .add_step_boxed(Box::new(OpeningStep { radius: 1 }))
        .add_step_boxed(Box::new(ClosingStep { radius: 2 }));
    let classifier = ContourClassifier::new(ShapeConfig {
        detect_non_convex: true,
        ..ShapeConfig::default()
    });
    let custom = ProposalExtractor::from_parts(ChannelPreprocessor::from_pipeline(pipeline), classifier, 10);

    let mut seen = 0;
    let custom_proposals = custom.extract_observed(
        &img,
        &mut ProposalCallback(|label: ShapeLabel, bbox: &BoundingBox| {
            seen += 1;
            println!("  found {} at {}", label, bbox);
        }),
    );
    println!("Custom pipeline found {} regions ({} reported)", custom_proposals.len(), seen);

    // Example 3: Only the first 2 steps (partial execution for debugging)
    println!("\n\n=== Partial Pipeline (Stop After Equalization) ===");
    let partial = standard.preprocessor().pipeline().run_partial(&img, 2, &mut NoopObserver);
    println!("  Partial result: {}x{} image", partial.width(), partial.height());

    // Could save this for debugging:
    // partial.save("debug_equalized.png")?;

    Ok(())
}
