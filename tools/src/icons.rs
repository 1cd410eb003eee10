use std::fs;
use std::path::{Path, PathBuf};

use image::{ImageFormat, Rgb, RgbImage};
use tracing::info;

use crate::error::ToolError;

/// `#1a1a2e`
pub const BACKGROUND: [u8; 3] = [26, 26, 46];

/// Share of brightness lost between the top and bottom rows.
const GRADIENT_DEPTH: f64 = 0.3;

pub struct IconSpec {
    pub name: &'static str,
    pub size: u32,
}

pub const ICONS: &[IconSpec] = &[
    IconSpec { name: "action", size: 72 },
    IconSpec { name: "action@2x", size: 144 },
    IconSpec { name: "category", size: 28 },
    IconSpec { name: "category@2x", size: 56 },
    IconSpec { name: "plugin", size: 144 },
    IconSpec { name: "plugin@2x", size: 288 },
];

/// Square placeholder that darkens linearly from top to bottom.
pub fn gradient_icon(size: u32, background: [u8; 3]) -> RgbImage {
    RgbImage::from_fn(size, size, |_, y| {
        let factor = 1.0 - (f64::from(y) / f64::from(size)) * GRADIENT_DEPTH;
        Rgb(background.map(|channel| (f64::from(channel) * factor).floor() as u8))
    })
}

/// Write every placeholder icon into `<plugin_dir>/images`.
pub fn generate(plugin_dir: &Path) -> Result<Vec<PathBuf>, ToolError> {
    let images_dir = plugin_dir.join("images");
    fs::create_dir_all(&images_dir).map_err(ToolError::io("create", &images_dir))?;

    let mut written = Vec::with_capacity(ICONS.len());
    for spec in ICONS {
        let path = images_dir.join(format!("{}.png", spec.name));
        gradient_icon(spec.size, BACKGROUND)
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|source| ToolError::Image {
                path: path.clone(),
                source,
            })?;
        info!("created {}.png ({}x{})", spec.name, spec.size, spec.size);
        written.push(path);
    }

    info!("placeholder icons generated; replace them with designed artwork before release");
    Ok(written)
}
