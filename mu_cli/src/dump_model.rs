use std::error::Error;

use clap::Parser;
use mu_asset_core::{AssetCache, AssetPath, ModelLoader, TextureLoader};

#[derive(Parser)]
pub struct DumpModel {
    /// Model path, with or without the `bmd` extension
    path: String,
    /// Also decode the textures the meshes reference
    #[clap(short, long)]
    textures: bool,
    /// Print every bone and action in full
    #[clap(short, long)]
    verbose: bool,
}

pub fn dump_model(opts: &DumpModel, cache: &AssetCache) -> Result<(), Box<dyn Error>> {
    let model = cache.load(&ModelLoader, opts.path.as_str())?;

    println!("{} (version {:#04x})", model.name, model.version);
    println!(
        "{} meshes, {} bones, {} actions",
        model.meshes.len(),
        model.bones.len(),
        model.actions.len()
    );

    for (i, mesh) in model.meshes.iter().enumerate() {
        println!(
            "mesh {i}: {} vertices, {} normals, {} tex coords, {} triangles, texture `{}`",
            mesh.vertices.len(),
            mesh.normals.len(),
            mesh.tex_coords.len(),
            mesh.triangles.len(),
            mesh.texture_path
        );
    }

    if opts.verbose {
        for (i, bone) in model.real_bones() {
            println!("bone {i}: {bone:#?}");
        }
        for (i, action) in model.actions.iter().enumerate() {
            println!("action {i}: {action:#?}");
        }
    }

    if opts.textures {
        let model_path = AssetPath::new(&opts.path);
        let texture_paths: Vec<_> = model
            .texture_paths()
            .map(|texture| model_path.parent_join(texture))
            .collect();

        let textures = cache.prepare_each(&TextureLoader, &texture_paths);

        for (path, texture) in texture_paths.iter().zip(textures) {
            match texture {
                Some(texture) => println!(
                    "texture `{path}`: {}x{}, {} components",
                    texture.width, texture.height, texture.components
                ),
                None => println!("texture `{path}`: missing or invalid"),
            }
        }
    }

    Ok(())
}
