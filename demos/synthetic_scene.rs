use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_polygon_mut};
use imageproc::point::Point;
use imageproc::rect::Rect;
use signspot::debug::annotate;
use signspot::ProposalExtractor;
use std::env;
use std::path::Path;

fn main() -> anyhow::Result<()> {
    let out_path = env::args().nth(1).unwrap_or_else(|| "synthetic_scene.png".to_string());

    let mut img = RgbImage::from_pixel(640, 360, Rgb([120, 120, 120]));

    // Red square, blue disc, yellow triangle and a green stop-like hexagon
    draw_filled_rect_mut(&mut img, Rect::at(40, 60).of_size(80, 80), Rgb([220, 20, 20]));
    draw_filled_circle_mut(&mut img, (230, 100), 45, Rgb([20, 40, 220]));
    draw_polygon_mut(
        &mut img,
        &[Point::new(380, 50), Point::new(440, 150), Point::new(320, 150)],
        Rgb([240, 200, 0]),
    );
    draw_polygon_mut(
        &mut img,
        &[
            Point::new(580, 100),
            Point::new(555, 143),
            Point::new(505, 143),
            Point::new(480, 100),
            Point::new(505, 57),
            Point::new(555, 57),
        ],
        Rgb([20, 180, 40]),
    );
    // Too thin to be a sign
    draw_filled_rect_mut(&mut img, Rect::at(40, 260).of_size(400, 20), Rgb([220, 20, 20]));

    img.save(&out_path)?;
    println!("Created {} ({}x{})", out_path, img.width(), img.height());

    let source = DynamicImage::ImageRgb8(img);
    let extractor = ProposalExtractor::default();
    let proposals = extractor.extract(&source);

    println!("\n=== Proposals ===");
    for (label, bbox) in proposals.iter() {
        println!("  {:<10} at {}", label, bbox);
    }

    println!("\n=== All contours ===");
    for (contour, result) in extractor.get_classifications(&source) {
        println!(
            "  {} points -> {} ({:?}, solidity {:.2})",
            contour.len(),
            result.label,
            result.rejection,
            result.metrics.solidity
        );
    }

    let out_path = Path::new(&out_path);
    let file_name = out_path.file_name().and_then(|n| n.to_str()).unwrap_or("scene.png");
    let annotated_path = out_path.with_file_name(format!("annotated_{}", file_name));
    annotate(&source, &proposals).save(&annotated_path)?;
    println!("\nAnnotated copy written to {}", annotated_path.display());

    Ok(())
}
