use std::error::Error;

use clap::Parser;
use mu_asset_core::{AssetCache, TextureLoader};

#[derive(Parser)]
pub struct DumpTexture {
    /// Texture path, by container or source image name
    path: String,
}

pub fn dump_texture(opts: &DumpTexture, cache: &AssetCache) -> Result<(), Box<dyn Error>> {
    if let Some(file) = cache.resolve_for(&TextureLoader, opts.path.as_str()) {
        println!("file: {}", file.display());
    }

    let texture = cache.load(&TextureLoader, opts.path.as_str())?;

    println!("{}x{}", texture.width, texture.height);
    match texture.compression {
        Some(compression) => println!(
            "{compression} compressed, {} components, {} mip levels, {} bytes",
            texture.components,
            texture.mip_levels,
            texture.data.len()
        ),
        None => println!(
            "uncompressed, {} components, {} bytes",
            texture.components,
            texture.data.len()
        ),
    }

    Ok(())
}
