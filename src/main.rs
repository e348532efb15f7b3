//! PixelSuite command-line tools.

#[cfg(not(target_arch = "wasm32"))]
const USAGE: &str = "Usage:
  pixelsuite inspect <image> <labels.txt>   decode a YOLO keypoint file against an image
  pixelsuite skeletons                      list stored skeleton templates
  pixelsuite config                         print the effective configuration";

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use pixelsuite::AppConfig;

    let config = AppConfig::load_or_default();
    env_logger::Builder::from_env(
        env_logger::Env::default()
            .default_filter_or(config.preferences.log_level.to_level_filter().to_string()),
    )
    .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(e) = cli::run(&config, &args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::error::Error;
    use std::path::Path;

    use pixelsuite::format::formats::decode_keypoints;
    use pixelsuite::geometry::CanvasSize;
    use pixelsuite::store::FileStore;
    use pixelsuite::{AppConfig, SkeletonLibrary};

    use super::USAGE;

    pub fn run(config: &AppConfig, args: &[String]) -> Result<(), Box<dyn Error>> {
        match args {
            [cmd, image, labels] if cmd == "inspect" => inspect(config, image, labels),
            [cmd] if cmd == "skeletons" => skeletons(config),
            [cmd] if cmd == "config" => {
                println!("{}", config.to_json()?);
                Ok(())
            }
            _ => Err(USAGE.into()),
        }
    }

    fn inspect(config: &AppConfig, image: &str, labels: &str) -> Result<(), Box<dyn Error>> {
        let (width, height) = image::image_dimensions(Path::new(image))?;
        let canvas = CanvasSize::fit(width, height, config.editors.keypoint_max_width);
        log::info!(
            "{} is {}x{}, displayed at {}x{}",
            image,
            width,
            height,
            canvas.width,
            canvas.height
        );

        let text = std::fs::read_to_string(labels)?;
        let import = decode_keypoints(&text, canvas);
        for warning in &import.warnings {
            log::warn!("{}: line {:?}: {}", labels, warning.line, warning.message);
        }

        for (i, object) in import.objects.iter().enumerate() {
            let b = &object.bbox;
            println!(
                "object {} class {} box center ({:.1}, {:.1}) size {:.1}x{:.1}",
                i + 1,
                object.class_id,
                b.cx,
                b.cy,
                b.width,
                b.height
            );
            for kp in &object.keypoints {
                println!(
                    "  ({:.1}, {:.1}) visibility {}",
                    kp.x,
                    kp.y,
                    kp.visibility.code()
                );
            }
        }
        println!(
            "{} objects, {} skipped lines or warnings",
            import.objects.len(),
            import.warnings.len()
        );
        Ok(())
    }

    fn skeletons(config: &AppConfig) -> Result<(), Box<dyn Error>> {
        let dir = config
            .data_dir()
            .ok_or("Could not determine the data directory")?;
        let library = SkeletonLibrary::new(FileStore::new(dir));
        let templates = library.load();
        if templates.is_empty() {
            println!("No saved skeletons");
        }
        for t in &templates {
            println!(
                "{}  {}  ({} nodes, {} connections)",
                t.id,
                t.name,
                t.keypoints.len(),
                t.connections.len()
            );
        }
        Ok(())
    }
}

// The library is used directly from the browser; there is no CLI there.
#[cfg(target_arch = "wasm32")]
fn main() {}
