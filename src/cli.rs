use clap::Parser;

/// A skybox viewer that converts a cross layout image into a cubemap
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the cross layout image; .hdr files are decoded as radiance data
    pub image: Option<String>,

    /// Arrangement of the six cube faces within the cross image
    #[arg(short, long, value_enum, default_value_t = LayoutKind::Horizontal)]
    pub layout: LayoutKind,

    /// Edge size in texels of each generated cubemap face
    #[arg(short, long, default_value_t = 512)]
    pub face_size: u32,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum LayoutKind {
    Horizontal,
    Vertical,
}

impl From<LayoutKind> for crossmap_viewer::args::CrossLayoutArg {
    fn from(value: LayoutKind) -> Self {
        match value {
            LayoutKind::Horizontal => crossmap_viewer::args::CrossLayoutArg::HorizontalCross,
            LayoutKind::Vertical => crossmap_viewer::args::CrossLayoutArg::VerticalCross,
        }
    }
}
