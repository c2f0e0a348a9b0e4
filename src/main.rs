// Command-line runner for the `pixel_sort` library.
//
//     pixel_sort <input> <output>
//
// Sorting options come from the PIXEL_SORT_* environment variables (see
// `SortConfig::from_env`). With PIXEL_SORT_DUMP_EDGES set, the thresholded edge map is
// written instead of a sorted image.

use anyhow::{Context, Result, bail};
use log::info;
use pixel_sort::core_modules::edge_detection;
use pixel_sort::core_modules::utils::image_helper::image_helper;
use pixel_sort::{ParallelSorter, PixelSorter, SortConfig, Sorter};
use std::env;

const ENV_DUMP_EDGES: &str = "PIXEL_SORT_DUMP_EDGES";

fn read_params() -> Result<(String, String)> {
    let args: Vec<String> = env::args().collect();
    if args.len() != 3 {
        bail!("usage: {} <input image> <output png>", args.first().map(String::as_str).unwrap_or("pixel_sort"));
    }
    Ok((args[1].clone(), args[2].clone()))
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let (in_image_name, out_image_name) = read_params()?;
    let config = SortConfig::from_env().context("invalid PIXEL_SORT_* configuration")?;

    info!("Input image: {in_image_name}");
    info!("Output image: {out_image_name}");
    info!("Config: {config:?}");

    let image = image_helper::load_rgba(&in_image_name).with_context(|| format!("failed to load {in_image_name}"))?;

    if env::var_os(ENV_DUMP_EDGES).is_some() {
        let segmentation = edge_detection::segment(&image, config.threshold);
        info!("Edge threshold: {}", segmentation.threshold);
        image_helper::save_gray(&out_image_name, &segmentation.edges)
            .with_context(|| format!("failed to save {out_image_name}"))?;
        return Ok(());
    }

    let sorted = if config.workers == 1 {
        let mut sorter = PixelSorter::new(image, config);
        sorter.sort()?;
        sorter.into_image()
    } else {
        ParallelSorter::new(config).sort(image).await?
    };

    image_helper::save_png(&out_image_name, &sorted).with_context(|| format!("failed to save {out_image_name}"))?;
    info!("Done");
    Ok(())
}
