#[derive(Debug)]
pub enum Error {
    ImageLoad { path: String, message: String },
    ShaderCompile { name: String, message: String },
    ShaderLink { name: String, message: String },
    InvalidLayout { message: String },
    FramebufferIncomplete { message: String },
    Gpu { message: String },
    Initialization { message: String },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::ImageLoad { path, message } => {
                write!(f, "Failed to load image {path}: {message}")
            }
            Error::ShaderCompile { name, message } => {
                write!(f, "Failed to compile shader {name}: {message}")
            }
            Error::ShaderLink { name, message } => {
                write!(f, "Failed to create pipeline {name}: {message}")
            }
            Error::InvalidLayout { message } => write!(f, "{message}"),
            Error::FramebufferIncomplete { message } => {
                write!(f, "Incomplete render target: {message}")
            }
            Error::Gpu { message } => write!(f, "GPU error: {message}"),
            Error::Initialization { message } => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_load_display_includes_path() {
        let error = Error::ImageLoad {
            path: String::from("cross.hdr"),
            message: String::from("no such file"),
        };
        assert_eq!(
            error.to_string(),
            "Failed to load image cross.hdr: no such file"
        );
    }

    #[test]
    fn invalid_layout_display_is_message() {
        let error = Error::InvalidLayout {
            message: String::from("face index 7 is outside 0..6"),
        };
        assert_eq!(error.to_string(), "face index 7 is outside 0..6");
    }
}
