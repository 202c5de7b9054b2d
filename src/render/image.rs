/// Decoded cross image pixels. Decoders hand back rows starting at the top of
/// the picture; the constructors flip them so that texel (0, 0) is the
/// bottom-left corner, the convention the layout tables are written in.
#[derive(Debug)]
pub enum CrossImageData {
    Ldr(image::RgbaImage),
    Hdr(image::Rgba32FImage),
}

#[derive(Debug)]
pub struct CrossImage {
    data: CrossImageData,
}

impl CrossImage {
    pub fn from_ldr(mut rgba_image: image::RgbaImage) -> Self {
        image::imageops::flip_vertical_in_place(&mut rgba_image);
        Self {
            data: CrossImageData::Ldr(rgba_image),
        }
    }

    pub fn from_hdr(mut rgba_image: image::Rgba32FImage) -> Self {
        image::imageops::flip_vertical_in_place(&mut rgba_image);
        Self {
            data: CrossImageData::Hdr(rgba_image),
        }
    }

    pub fn data(&self) -> &CrossImageData {
        &self.data
    }

    pub fn dimensions(&self) -> (u32, u32) {
        match &self.data {
            CrossImageData::Ldr(rgba_image) => rgba_image.dimensions(),
            CrossImageData::Hdr(rgba_image) => rgba_image.dimensions(),
        }
    }

    pub fn is_hdr(&self) -> bool {
        matches!(self.data, CrossImageData::Hdr(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ldr_rows_are_normalized_to_bottom_left_origin() {
        let mut rgba_image = image::RgbaImage::new(1, 2);
        rgba_image.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        rgba_image.put_pixel(0, 1, image::Rgba([0, 0, 255, 255]));

        let cross_image = CrossImage::from_ldr(rgba_image);
        assert!(!cross_image.is_hdr());
        assert_eq!(cross_image.dimensions(), (1, 2));

        // The bottom picture row (blue) now comes first.
        match cross_image.data() {
            CrossImageData::Ldr(rgba_image) => {
                assert_eq!(rgba_image.get_pixel(0, 0), &image::Rgba([0, 0, 255, 255]));
                assert_eq!(rgba_image.get_pixel(0, 1), &image::Rgba([255, 0, 0, 255]));
            }
            CrossImageData::Hdr(_) => unreachable!(),
        }
    }

    #[test]
    fn hdr_rows_are_normalized_to_bottom_left_origin() {
        let mut rgba_image = image::Rgba32FImage::new(1, 2);
        rgba_image.put_pixel(0, 0, image::Rgba([4.0, 0.0, 0.0, 1.0]));
        rgba_image.put_pixel(0, 1, image::Rgba([0.0, 0.0, 4.0, 1.0]));

        let cross_image = CrossImage::from_hdr(rgba_image);
        assert!(cross_image.is_hdr());

        match cross_image.data() {
            CrossImageData::Hdr(rgba_image) => {
                assert_eq!(rgba_image.get_pixel(0, 0), &image::Rgba([0.0, 0.0, 4.0, 1.0]));
            }
            CrossImageData::Ldr(_) => unreachable!(),
        }
    }
}
