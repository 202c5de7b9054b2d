use clap::Parser;

use crate::cli::Cli;
use crossmap_viewer::args::{Args, CrossEnvironmentArgs};
use crossmap_viewer::run;

mod cli;

fn main() {
    let cli = Cli::parse();
    run(Args {
        cross_environment: cli.image.map(|image| CrossEnvironmentArgs {
            image,
            layout: cli.layout.into(),
            face_size: cli.face_size,
        }),
    });
}
