use anyhow::Result;

use crate::error::Error;
use crate::render::image::CrossImage;
use crate::resource::cross::CrossImageLoader;

pub struct FileSystemCrossImageLoader {
    pub path: String,
}

impl FileSystemCrossImageLoader {
    /// Radiance files are decoded to float triples; everything else goes
    /// through the 8-bit path.
    fn is_radiance_path(path: &str) -> bool {
        std::path::Path::new(path)
            .extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| extension.eq_ignore_ascii_case("hdr"))
    }
}

impl CrossImageLoader for FileSystemCrossImageLoader {
    fn load_cross_image(&self) -> Result<CrossImage> {
        let dynamic_image = image::open(&self.path).map_err(|error| Error::ImageLoad {
            path: self.path.clone(),
            message: error.to_string(),
        })?;

        if FileSystemCrossImageLoader::is_radiance_path(&self.path) {
            Ok(CrossImage::from_hdr(dynamic_image.to_rgba32f()))
        } else {
            Ok(CrossImage::from_ldr(dynamic_image.to_rgba8()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radiance_files_are_detected_by_extension() {
        assert!(FileSystemCrossImageLoader::is_radiance_path("sky/cross.hdr"));
        assert!(FileSystemCrossImageLoader::is_radiance_path("CROSS.HDR"));
        assert!(!FileSystemCrossImageLoader::is_radiance_path("cross.png"));
        assert!(!FileSystemCrossImageLoader::is_radiance_path("cross"));
    }

    #[test]
    fn missing_files_surface_an_image_load_error() {
        let loader = FileSystemCrossImageLoader {
            path: String::from("does/not/exist.png"),
        };

        let error = loader.load_cross_image().unwrap_err();
        let error = error.downcast_ref::<Error>().unwrap();
        assert!(matches!(error, Error::ImageLoad { .. }));
    }
}
