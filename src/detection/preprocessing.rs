use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::contrast::{ThresholdType, threshold};
use imageproc::distance_transform::Norm;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology;
use palette::{FromColor, Hsv, Srgb};

/// Hue bounds on the 0..180 scale
const RED_HUE_LOW_MAX: u8 = 10;
const RED_HUE_HIGH_MIN: u8 = 160;
const BLUE_HUE_MIN: u8 = 100;
const BLUE_HUE_MAX: u8 = 130;
const HUE_MIN_SATURATION: u8 = 100;
const HUE_MIN_VALUE: u8 = 50;

/// Hue (0..180), saturation and value of one pixel, 8 bits each
pub fn rgb_to_hsv(pixel: &Rgb<u8>) -> (u8, u8, u8) {
    let [r, g, b] = pixel.0;
    let hsv: Hsv = Hsv::from_color(Srgb::new(r, g, b).into_format::<f32>());

    let hue = (hsv.hue.into_positive_degrees() / 2.0).round() as u32 % 180;
    let saturation = (hsv.saturation * 255.0).round().clamp(0.0, 255.0);
    let value = (hsv.value * 255.0).round().clamp(0.0, 255.0);

    (hue as u8, saturation as u8, value as u8)
}

/// Extract the HSV saturation channel
pub fn saturation_channel(img: &RgbImage) -> GrayImage {
    let mut out = GrayImage::new(img.width(), img.height());
    for (x, y, pixel) in img.enumerate_pixels() {
        let (_, s, _) = rgb_to_hsv(pixel);
        out.put_pixel(x, y, Luma([s]));
    }
    out
}

/// Binary mask of strongly colored red or blue pixels
pub fn red_blue_hue_mask(img: &RgbImage) -> GrayImage {
    let mut out = GrayImage::new(img.width(), img.height());
    for (x, y, pixel) in img.enumerate_pixels() {
        let (h, s, v) = rgb_to_hsv(pixel);
        let colored = s >= HUE_MIN_SATURATION && v >= HUE_MIN_VALUE;
        let red = h <= RED_HUE_LOW_MAX || h >= RED_HUE_HIGH_MIN;
        let blue = (BLUE_HUE_MIN..=BLUE_HUE_MAX).contains(&h);
        if colored && (red || blue) {
            out.put_pixel(x, y, Luma([255]));
        }
    }
    out
}

/// Histogram equalization that maps the darkest occupied level to 0.
///
/// An image with a single gray level is returned unchanged.
/// `imageproc::contrast::equalize_histogram` is not used because it lifts a
/// dominant dark background towards mid gray, which then survives the threshold.
pub fn equalize_histogram(img: &GrayImage) -> GrayImage {
    let mut hist = [0u64; 256];
    for p in img.pixels() {
        hist[p[0] as usize] += 1;
    }

    let total: u64 = hist.iter().sum();
    let first_count = hist.iter().copied().find(|&c| c > 0).unwrap_or(0);
    if total == first_count {
        return img.clone();
    }

    let scale = 255.0 / (total - first_count) as f64;
    let mut lut = [0u8; 256];
    let mut cumulative = 0u64;
    for (level, count) in hist.iter().enumerate() {
        cumulative += count;
        let mapped = (cumulative.saturating_sub(first_count)) as f64 * scale;
        lut[level] = mapped.round().clamp(0.0, 255.0) as u8;
    }

    let mut out = img.clone();
    for p in out.pixels_mut() {
        p[0] = lut[p[0] as usize];
    }
    out
}

/// Apply Gaussian blur to reduce noise; a non-positive sigma is a no-op
pub fn apply_blur(img: &GrayImage, sigma: f32) -> GrayImage {
    if sigma <= 0.0 {
        return img.clone();
    }
    gaussian_blur_f32(img, sigma)
}

/// Pixels strictly above `level` become 255, all others 0
pub fn binarize(img: &GrayImage, level: u8) -> GrayImage {
    threshold(img, level, ThresholdType::Binary)
}

/// Erode then dilate with a (2r+1) square element
pub fn open_mask(img: &GrayImage, radius: u8) -> GrayImage {
    if radius == 0 {
        return img.clone();
    }
    morphology::open(img, Norm::LInf, radius)
}

/// Dilate then erode with a (2r+1) square element
pub fn close_mask(img: &GrayImage, radius: u8) -> GrayImage {
    if radius == 0 {
        return img.clone();
    }
    morphology::close(img, Norm::LInf, radius)
}
