// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use log::info;
use nalgebra::DMatrix;
use std::{env, error::Error, fs, path::Path, path::PathBuf};

use feature_tracking_rs::core::feature::{Feature, FeatureList, TrackStatus};
use feature_tracking_rs::core::frame::Frame;
use feature_tracking_rs::core::seed;
use feature_tracking_rs::core::track::patch_match::{Config, PatchTracker};
use feature_tracking_rs::dataset::tum_rgbd;
use feature_tracking_rs::misc::view;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args: Vec<String> = env::args().collect();
    if let Err(error) = my_run(&args) {
        eprintln!("{}", error);
        std::process::exit(1);
    }
}

const USAGE: &str = "Usage: ./ftrs_track_sequence rgb.txt [params_file [output_dir]]";

fn my_run(args: &[String]) -> Result<(), Box<dyn Error>> {
    // Check that the arguments are correct.
    let valid_args = check_args(args)?;

    // Setup tracking configuration.
    let config = match &valid_args.params_file_path {
        Some(path) => Config::from_params(&fs::read_to_string(path)?)?,
        None => Config::default(),
    };
    info!("Tracking with {:?}", config);
    let tracker = PatchTracker::new(config);
    let seed_config = seed::Config::default();

    // Build a vector containing timestamps and full paths of images.
    let images = parse_images(&valid_args.images_file_path)?;
    let first = match images.first() {
        Some(entry) => entry,
        None => return Err("The image list is empty".into()),
    };

    // Seed features on the first image.
    let mut intensity = read_intensity(&first.file_path)?;
    let mut features = seed::seed(&intensity, &seed_config, 0);
    let mut next_id = features.len();
    let nb_seeded = features.len();
    info!("Seeded {} features", nb_seeded);
    print_features(first.timestamp, &features);
    save_view(&valid_args.output_dir, 0, &intensity, &features)?;

    // Track features through every following image.
    for (index, entry) in images.iter().enumerate().skip(1) {
        let new_intensity = read_intensity(&entry.file_path)?;
        tracker.track_par(&Frame::Gray(new_intensity.clone()), &mut features)?;
        print_features(entry.timestamp, &features);
        save_view(&valid_args.output_dir, index, &new_intensity, &features)?;
        intensity = new_intensity;

        // Next patches are captured in the current image.
        refresh_patches(&intensity, seed_config.patch_half_size, &mut features);
        let nb_tracked = features.iter().filter(|f| f.is_tracked()).count();
        if 2 * nb_tracked < nb_seeded {
            let added = seed::refill(&intensity, &seed_config, &mut features, &mut next_id);
            info!(
                "Only {} features left at {}, seeded {} new ones",
                nb_tracked, entry.timestamp, added
            );
        }
    }

    Ok(())
}

struct Args {
    images_file_path: PathBuf,
    params_file_path: Option<PathBuf>,
    output_dir: Option<PathBuf>,
}

/// Verify that command line arguments are correct.
fn check_args(args: &[String]) -> Result<Args, String> {
    let (images, params, output) = match args {
        [_, images] => (images, None, None),
        [_, images, params] => (images, Some(params), None),
        [_, images, params, output] => (images, Some(params), Some(output)),
        _ => {
            eprintln!("{}", USAGE);
            return Err("Wrong number of arguments".to_string());
        }
    };
    let images_file_path = PathBuf::from(images);
    if !images_file_path.is_file() {
        eprintln!("{}", USAGE);
        return Err(format!(
            "The image list does not exist or is not reachable: {}",
            images
        ));
    }
    let params_file_path = params.map(PathBuf::from);
    if let Some(path) = &params_file_path {
        if !path.is_file() {
            eprintln!("{}", USAGE);
            return Err(format!("The parameters file does not exist: {}", path.display()));
        }
    }
    let output_dir = output.map(PathBuf::from);
    if let Some(dir) = &output_dir {
        if !dir.is_dir() {
            eprintln!("{}", USAGE);
            return Err(format!("The output directory does not exist: {}", dir.display()));
        }
    }
    Ok(Args {
        images_file_path,
        params_file_path,
        output_dir,
    })
}

/// Open an image list and parse it into entries with full paths.
fn parse_images<P: AsRef<Path>>(file_path: P) -> Result<Vec<tum_rgbd::ImageEntry>, Box<dyn Error>> {
    let content = fs::read_to_string(&file_path)?;
    let parent = file_path
        .as_ref()
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let entries = tum_rgbd::parse::images(&content)?;
    Ok(entries.iter().map(|e| e.relative_to(&parent)).collect())
}

/// Read an image file and convert it to intensities.
fn read_intensity<P: AsRef<Path>>(file_path: P) -> Result<DMatrix<u8>, Box<dyn Error>> {
    let frame = Frame::from(image::open(file_path)?);
    Ok(frame.intensity().into_owned())
}

/// Recapture the patches of tracked features around their new position.
/// Features whose patch does not fit anymore are marked lost.
fn refresh_patches(intensity: &DMatrix<u8>, half_size: usize, features: &mut FeatureList) {
    for feature in features.iter_mut().filter(|f| f.is_tracked()) {
        match Feature::from_frame(feature.id, intensity, feature.x, feature.y, half_size) {
            Some(captured) => feature.patch = captured.patch,
            None => feature.status = TrackStatus::Lost,
        }
    }
}

/// Print one line per feature: timestamp id x y status.
fn print_features(timestamp: f64, features: &[Feature]) {
    for f in features {
        println!("{} {} {} {} {:?}", timestamp, f.id, f.x, f.y, f.status);
    }
}

/// Save a visualization of the features if an output directory was given.
fn save_view(
    output_dir: &Option<PathBuf>,
    index: usize,
    intensity: &DMatrix<u8>,
    features: &[Feature],
) -> Result<(), Box<dyn Error>> {
    if let Some(dir) = output_dir {
        let file_path = dir.join(format!("features_{:05}.png", index));
        view::features_on_image(intensity, features).save(file_path)?;
    }
    Ok(())
}
