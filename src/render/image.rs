use crate::model::{ImageAlign, ImageVAlign};

/// Share of a corner radius that intrudes into the straight edge.
const CORNER_INSET: f32 = 0.414;

/// Axis-aligned rectangle as `(x, y, width, height)`.
pub type Rect = (f32, f32, f32, f32);

/// Where an image goes inside a box, relative to the box origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImagePlacement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct BoxShape {
    pub width: f32,
    pub height: f32,
    pub top_radius: f32,
    pub bottom_radius: f32,
}

/// Fits an image of `natural` size (or the placeholder square when the
/// image is not available) into the box, keeping clear of rounded corners.
pub fn place_image(
    shape: &BoxShape,
    natural: Option<(f32, f32)>,
    align: ImageAlign,
    valign: ImageVAlign,
) -> ImagePlacement {
    let (w, h) = (shape.width, shape.height);
    let (top, bottom) = (shape.top_radius, shape.bottom_radius);
    let height_inset = (CORNER_INSET * (top + bottom)).max(1.0);

    let (inset, max_x, max_y) = match natural {
        Some((nat_w, nat_h)) if nat_w > 0.0 && nat_h > 0.0 => {
            let (mut max_x, mut max_y) = (nat_w, nat_h);
            if max_y > h - height_inset {
                max_x = nat_w * (h - height_inset) / nat_h;
                max_y = h - height_inset;
            }
            let width_inset = CORNER_INSET * top.max(bottom);
            if max_x > w - 2.0 * width_inset {
                max_y = nat_h * (w - 2.0 * width_inset) / nat_w;
                max_x = w - 2.0 * width_inset;
            }
            (width_inset, max_x, max_y)
        }
        _ => {
            let side = w.min(h) - 2.0 * height_inset;
            (height_inset, side, side)
        }
    };

    let x = match align {
        ImageAlign::Left => inset,
        ImageAlign::Center => (w - 2.0 * inset - max_x) / 2.0 + inset,
        ImageAlign::Right => w - max_x - inset,
    };
    let y = match valign {
        ImageVAlign::Top => CORNER_INSET * top + 1.0,
        ImageVAlign::Middle => (h - max_y) / 2.0,
        ImageVAlign::Bottom => h - max_y - CORNER_INSET * bottom - 1.0,
    };
    ImagePlacement {
        x,
        y,
        width: max_x,
        height: max_y,
    }
}

/// The part of the box left for text once the image is placed, relative to
/// the box origin. The larger free region beside or above/below the image
/// wins where the alignment leaves a choice.
pub fn text_area(
    shape: &BoxShape,
    image: &ImagePlacement,
    align: ImageAlign,
    valign: ImageVAlign,
) -> Rect {
    let (w, h) = (shape.width, shape.height);
    let beside = image.x + image.width;
    let below = image.y + image.height;
    let wide_side = (w - image.width) * h > w * (h - image.height);

    match (align, valign) {
        (ImageAlign::Left, ImageVAlign::Middle) => (beside, 0.0, w - beside, h),
        (ImageAlign::Left, ImageVAlign::Top) if wide_side => (beside, 0.0, w - beside, h),
        (ImageAlign::Left, ImageVAlign::Top) => (0.0, below, w, h - below),
        (ImageAlign::Left, ImageVAlign::Bottom) if wide_side => (beside, 0.0, w - beside, h),
        (ImageAlign::Left, ImageVAlign::Bottom) => (0.0, 0.0, w, h - below),
        (ImageAlign::Center, ImageVAlign::Top) => (0.0, below, w, h - below),
        (ImageAlign::Center, ImageVAlign::Middle) if w - image.width > h - image.height => {
            (beside, 0.0, w - beside, h)
        }
        (ImageAlign::Center, ImageVAlign::Middle) => (0.0, below, w, h - below),
        (ImageAlign::Center, ImageVAlign::Bottom) => (0.0, 0.0, w, image.y),
        (ImageAlign::Right, ImageVAlign::Middle) => (0.0, 0.0, image.x, h),
        (ImageAlign::Right, _) if wide_side => (0.0, 0.0, image.x, h),
        (ImageAlign::Right, ImageVAlign::Top) => (0.0, below, w, h - below),
        (ImageAlign::Right, ImageVAlign::Bottom) => (0.0, 0.0, w, h - below),
    }
}
