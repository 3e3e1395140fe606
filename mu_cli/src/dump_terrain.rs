use std::error::Error;

use clap::Parser;
use mu_asset_core::{AssetCache, AssetPath, AttributeLoader, MappingLoader, ObjectListLoader};
use mu_terrain::TERRAIN_SIZE;

#[derive(Parser)]
pub struct DumpTerrain {
    /// Path to an `obj`, `att` or `map` file
    path: String,
    /// Print every object placement
    #[clap(short, long)]
    verbose: bool,
}

pub fn dump_terrain(opts: &DumpTerrain, cache: &AssetCache) -> Result<(), Box<dyn Error>> {
    let path = AssetPath::new(&opts.path);
    let extension = path.extension().unwrap_or_default().to_ascii_lowercase();

    match extension.as_str() {
        "obj" => {
            let list = cache.load(&ObjectListLoader, &path)?;
            println!("{:?}", list.header);
            println!("{} objects", list.objects.len());

            if opts.verbose {
                for object in &list.objects {
                    println!("{object:?}");
                }
            }
        }
        "att" => {
            let attribute = cache.load(&AttributeLoader, &path)?;
            println!("{:?}", attribute.header);

            let mut walkable = 0;
            let mut safe = 0;
            for y in 0..TERRAIN_SIZE {
                for x in 0..TERRAIN_SIZE {
                    walkable += usize::from(attribute.is_walkable(x, y));
                    safe += usize::from(attribute.is_safe_zone(x, y));
                }
            }
            println!("{walkable} walkable cells, {safe} in safe zones");
        }
        "map" => {
            let mapping = cache.load(&MappingLoader, &path)?;
            println!("{:?}", mapping.header);

            match &mapping.height {
                Some(height) => {
                    let heights = height.heights.cells();
                    let max = heights.iter().copied().fold(0.0_f32, f32::max);
                    println!("heights up to {max}");
                }
                None => println!("no height grid"),
            }
        }
        _ => return Err(format!("`{path}` is not an obj, att or map file").into()),
    }

    Ok(())
}
