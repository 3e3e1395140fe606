use mu_bmd::Model;
use mu_terrain::{ObjectList, TerrainAttribute, TerrainMapping};
use mu_texture::{TextureAsset, TextureFormat};

use crate::AssetPath;

/// Decodes one kind of asset from the bytes of its file.
///
/// The cache keeps one result map per loader type, so a loader type should
/// always produce the same output for the same path.
pub trait AssetLoader: Send + Sync + 'static {
    type Output: Send + Sync + 'static;

    /// Extension of the file an asset referenced as `path` is stored in.
    ///
    /// `None` keeps the extension of `path` as is.
    fn expected_extension(&self, path: &AssetPath) -> Option<&'static str>;

    /// Decodes the file stored at `path`, which already carries the expected extension.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `bytes` is not a valid asset.
    fn decode(&self, path: &AssetPath, bytes: &[u8]) -> mu_binary::Result<Self::Output>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ModelLoader;

impl AssetLoader for ModelLoader {
    type Output = Model;

    fn expected_extension(&self, _path: &AssetPath) -> Option<&'static str> {
        Some(mu_bmd::EXTENSION)
    }

    fn decode(&self, _path: &AssetPath, bytes: &[u8]) -> mu_binary::Result<Model> {
        Model::decode(bytes)
    }
}

/// Loads textures by either their container name or the source image name
/// models reference them by.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextureLoader;

impl AssetLoader for TextureLoader {
    type Output = TextureAsset;

    fn expected_extension(&self, path: &AssetPath) -> Option<&'static str> {
        path.extension()
            .and_then(TextureFormat::for_reference)
            .map(TextureFormat::extension)
    }

    fn decode(&self, path: &AssetPath, bytes: &[u8]) -> mu_binary::Result<TextureAsset> {
        let extension = path.extension().unwrap_or_default();
        let format = TextureFormat::from_extension(extension).ok_or_else(|| {
            mu_binary::Error::invalid("texture", format!("unknown texture extension `{extension}`"))
        })?;

        format.decode(bytes)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectListLoader;

impl AssetLoader for ObjectListLoader {
    type Output = ObjectList;

    fn expected_extension(&self, _path: &AssetPath) -> Option<&'static str> {
        Some("obj")
    }

    fn decode(&self, _path: &AssetPath, bytes: &[u8]) -> mu_binary::Result<ObjectList> {
        ObjectList::decode(bytes)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AttributeLoader;

impl AssetLoader for AttributeLoader {
    type Output = TerrainAttribute;

    fn expected_extension(&self, _path: &AssetPath) -> Option<&'static str> {
        Some("att")
    }

    fn decode(&self, _path: &AssetPath, bytes: &[u8]) -> mu_binary::Result<TerrainAttribute> {
        TerrainAttribute::decode(bytes)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MappingLoader;

impl AssetLoader for MappingLoader {
    type Output = TerrainMapping;

    fn expected_extension(&self, _path: &AssetPath) -> Option<&'static str> {
        Some("map")
    }

    fn decode(&self, _path: &AssetPath, bytes: &[u8]) -> mu_binary::Result<TerrainMapping> {
        TerrainMapping::decode(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_extensions() {
        let loader = TextureLoader;
        assert_eq!(
            loader.expected_extension(&AssetPath::new("Item/Sword.JPG")),
            Some("ozj")
        );
        assert_eq!(
            loader.expected_extension(&AssetPath::new("Item/Sword.ozt")),
            Some("ozt")
        );
        assert_eq!(loader.expected_extension(&AssetPath::new("Item/Sword")), None);
    }

    #[test]
    fn unknown_texture_extension() {
        assert!(matches!(
            TextureLoader.decode(&AssetPath::new("Item/Sword.wav"), &[0; 32]),
            Err(mu_binary::Error::InvalidFormat { .. })
        ));
    }
}
