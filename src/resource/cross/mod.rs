use anyhow::Result;

use crate::render::image::CrossImage;

pub mod file;

pub trait CrossImageLoader {
    fn load_cross_image(&self) -> Result<CrossImage>;
}
