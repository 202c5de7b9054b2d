pub struct Args {
    pub cross_environment: Option<CrossEnvironmentArgs>,
}

#[derive(Clone)]
pub struct CrossEnvironmentArgs {
    pub image: String,
    pub layout: CrossLayoutArg,
    pub face_size: u32,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CrossLayoutArg {
    HorizontalCross,
    VerticalCross,
}
