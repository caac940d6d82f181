use clap::Parser;
use mandelbrot::cli::Args;
use mandelbrot::{App, AppError, Config};

fn run(args: Args) -> Result<(), AppError> {
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if args.dump_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    App::new(config).run(&args.shaders_dir)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        log::error!("initialization failure: {e}");
        std::process::exit(1);
    }
}
