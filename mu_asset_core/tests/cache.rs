use std::{
    fs,
    io::{Cursor, Write},
    panic::{self, AssertUnwindSafe},
    path::Path,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use mu_asset_core::{
    AssetCache, AssetLoader, AssetPath, Error, ModelLoader, Settings, TextureLoader,
};
use zip::{write::SimpleFileOptions, ZipWriter};

/// Copies the file contents, counting decodes.
#[derive(Clone, Default)]
struct CountingLoader {
    decodes: Arc<AtomicUsize>,
}

impl CountingLoader {
    fn decodes(&self) -> usize {
        self.decodes.load(Ordering::SeqCst)
    }
}

impl AssetLoader for CountingLoader {
    type Output = Vec<u8>;

    fn expected_extension(&self, _path: &AssetPath) -> Option<&'static str> {
        Some("bin")
    }

    fn decode(&self, _path: &AssetPath, bytes: &[u8]) -> mu_binary::Result<Vec<u8>> {
        self.decodes.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(50));

        if bytes.starts_with(b"bad") {
            return Err(mu_binary::Error::invalid("bin", "corrupt test asset"));
        }
        Ok(bytes.to_vec())
    }
}

/// Records how many decodes overlap.
#[derive(Default)]
struct OverlapLoader {
    running: AtomicUsize,
    peak: AtomicUsize,
    total: AtomicUsize,
}

impl AssetLoader for OverlapLoader {
    type Output = Vec<u8>;

    fn expected_extension(&self, _path: &AssetPath) -> Option<&'static str> {
        Some("bin")
    }

    fn decode(&self, _path: &AssetPath, bytes: &[u8]) -> mu_binary::Result<Vec<u8>> {
        let running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(running, Ordering::SeqCst);
        self.total.fetch_add(1, Ordering::SeqCst);

        thread::sleep(Duration::from_millis(300));

        self.running.fetch_sub(1, Ordering::SeqCst);
        Ok(bytes.to_vec())
    }
}

struct PanickingLoader;

impl AssetLoader for PanickingLoader {
    type Output = Vec<u8>;

    fn expected_extension(&self, _path: &AssetPath) -> Option<&'static str> {
        Some("bin")
    }

    fn decode(&self, _path: &AssetPath, _bytes: &[u8]) -> mu_binary::Result<Vec<u8>> {
        panic!("decoder bug");
    }
}

fn write(root: &Path, path: &str, contents: &[u8]) {
    let path = root.join(path);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn cache(root: &Path) -> AssetCache {
    let mut settings = Settings::new(root);
    settings.threads(4);
    AssetCache::new(settings).unwrap()
}

/// A 1x1 24 bit bitmap behind the 4 byte `ozb` prefix.
fn ozb_pixel(b: u8, g: u8, r: u8) -> Vec<u8> {
    let mut out = vec![0; 4];
    out.extend_from_slice(b"BM");
    out.extend_from_slice(&58_u32.to_le_bytes());
    out.extend_from_slice(&0_u32.to_le_bytes());
    out.extend_from_slice(&54_u32.to_le_bytes());
    out.extend_from_slice(&40_u32.to_le_bytes());
    out.extend_from_slice(&1_i32.to_le_bytes());
    out.extend_from_slice(&1_i32.to_le_bytes());
    out.extend_from_slice(&1_u16.to_le_bytes());
    out.extend_from_slice(&24_u16.to_le_bytes());
    out.extend_from_slice(&[0; 24]);
    out.extend_from_slice(&[b, g, r, 0]);
    out
}

#[test]
fn concurrent_prepare_decodes_once() {
    let root = tempfile::tempdir().unwrap();
    write(root.path(), "Data/Blob.bin", b"payload");

    let cache = &cache(root.path());
    let loader = &CountingLoader::default();

    let results: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let path = if i % 2 == 0 {
                    "Data/Blob.bin"
                } else {
                    "data\\BLOB.BIN"
                };
                s.spawn(move || cache.prepare(loader, path))
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(loader.decodes(), 1);
    assert_eq!(cache.finished_assets(), 1);
    assert_eq!(cache.in_progress_assets(), 0);

    let first = results[0].clone().unwrap();
    assert_eq!(first.as_slice(), b"payload");
    for result in &results {
        assert!(Arc::ptr_eq(&first, result.as_ref().unwrap()));
    }
}

#[test]
fn failures_are_cached_until_evicted() {
    let root = tempfile::tempdir().unwrap();
    write(root.path(), "Broken.bin", b"bad bytes");

    let cache = cache(root.path());
    let loader = CountingLoader::default();

    assert!(cache.prepare(&loader, "Broken.bin").is_none());
    assert!(cache.prepare(&loader, "Broken.bin").is_none());
    assert!(cache.get(&loader, "Broken.bin").is_none());
    assert_eq!(loader.decodes(), 1);

    write(root.path(), "Broken.bin", b"fixed");
    assert!(cache.evict(&loader, "Broken.bin"));
    assert_eq!(
        cache.prepare(&loader, "Broken.bin").as_deref(),
        Some(&b"fixed".to_vec())
    );
    assert_eq!(loader.decodes(), 2);
}

#[test]
fn evict_during_decode_never_overlaps_decodes() {
    let root = tempfile::tempdir().unwrap();
    write(root.path(), "Blob.bin", b"payload");

    let cache = &cache(root.path());
    let loader = &OverlapLoader::default();

    thread::scope(|s| {
        let first = s.spawn(move || cache.prepare(loader, "Blob"));
        thread::sleep(Duration::from_millis(100));

        let waiters: Vec<_> = (0..3)
            .map(|_| s.spawn(move || cache.prepare(loader, "Blob")))
            .collect();
        thread::sleep(Duration::from_millis(50));

        assert!(cache.evict(loader, "Blob"));

        assert!(first.join().unwrap().is_some());
        for waiter in waiters {
            assert!(waiter.join().unwrap().is_some());
        }
    });

    assert_eq!(loader.peak.load(Ordering::SeqCst), 1);
    // the evicted result is dropped, so the waiters decode once more
    assert_eq!(loader.total.load(Ordering::SeqCst), 2);
    assert!(cache.get(loader, "Blob").is_some());
    assert_eq!(cache.in_progress_assets(), 0);
}

#[test]
fn panicking_decode_releases_waiters() {
    let root = tempfile::tempdir().unwrap();
    write(root.path(), "Blob.bin", b"payload");

    let cache = cache(root.path());

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        cache.prepare(&PanickingLoader, "Blob")
    }));
    assert!(result.is_err());
    assert_eq!(cache.in_progress_assets(), 0);

    // cached as failed instead of blocking on a slot nobody completes
    assert!(cache.prepare(&PanickingLoader, "Blob").is_none());
    assert_eq!(cache.finished_assets(), 0);
}

#[test]
fn missing_assets() {
    let root = tempfile::tempdir().unwrap();
    let cache = cache(root.path());
    let loader = CountingLoader::default();

    assert!(cache.prepare(&loader, "Nowhere/Thing").is_none());
    assert_eq!(loader.decodes(), 0);
    assert_eq!(cache.finished_assets(), 1);
    assert_eq!(
        cache.load(&loader, "Nowhere/Thing").unwrap_err(),
        Error::NotFound("Nowhere/Thing.bin".to_owned())
    );
}

#[test]
fn get_never_decodes() {
    let root = tempfile::tempdir().unwrap();
    write(root.path(), "Blob.bin", b"payload");

    let cache = cache(root.path());
    let loader = CountingLoader::default();

    assert!(cache.get(&loader, "Blob").is_none());
    assert_eq!(loader.decodes(), 0);

    cache.prepare(&loader, "Blob");
    assert_eq!(cache.get(&loader, "blob.BIN").as_deref(), Some(&b"payload".to_vec()));
    assert_eq!(loader.decodes(), 1);
}

#[test]
fn case_insensitive_resolution() {
    let root = tempfile::tempdir().unwrap();
    write(root.path(), "Item/texture/FOO.OZJ", b"x");

    let cache = cache(root.path());
    assert_eq!(
        cache.resolve("Item/texture/foo.ozj"),
        Some(root.path().join("Item/texture/FOO.OZJ"))
    );
}

#[test]
fn texture_from_fallback_folder() {
    let root = tempfile::tempdir().unwrap();
    write(root.path(), "Data/Item/Texture/shield.OZB", &ozb_pixel(10, 20, 30));

    let cache = cache(root.path());

    assert_eq!(
        cache.resolve_for(&TextureLoader, "Data/Item/Shield.bmp"),
        Some(root.path().join("Data/Item/Texture/shield.OZB"))
    );

    let texture = cache.prepare(&TextureLoader, "Data/Item/Shield.bmp").unwrap();
    assert_eq!((texture.width, texture.height), (1, 1));
    assert_eq!(texture.data, vec![30, 20, 10]);

    // the container name shares the result of the referenced name
    let same = cache.prepare(&TextureLoader, "data/item/shield.ozb").unwrap();
    assert!(Arc::ptr_eq(&texture, &same));
    assert_eq!(cache.finished_assets(), 1);
}

#[test]
fn model_by_name() {
    let root = tempfile::tempdir().unwrap();
    let mut bytes = b"BMD\x0a".to_vec();
    let mut name = [0; 32];
    name[..7].copy_from_slice(b"Sword01");
    bytes.extend_from_slice(&name);
    bytes.extend_from_slice(&[0; 6]);
    write(root.path(), "Data/Item/Sword01.bmd", &bytes);

    let cache = cache(root.path());
    let model = cache.prepare(&ModelLoader, "Data\\Item\\Sword01").unwrap();
    assert_eq!(model.name, "Sword01");
    assert_eq!(model.version, 0x0a);

    write(root.path(), "Data/Item/Broken.bmd", b"XYZ\x00 not a model at all");
    assert!(matches!(
        cache.load(&ModelLoader, "Data/Item/Broken"),
        Err(Error::Decode { .. })
    ));
}

#[test]
fn prepare_each_keeps_order() {
    let root = tempfile::tempdir().unwrap();
    for i in 0..6 {
        write(root.path(), &format!("Blob{i}.bin"), format!("blob {i}").as_bytes());
    }

    let cache = cache(root.path());
    let loader = CountingLoader::default();

    let paths: Vec<String> = (0..6).chain([2, 4, 9]).map(|i| format!("Blob{i}")).collect();
    let results = cache.prepare_each(&loader, &paths);

    assert_eq!(results.len(), paths.len());
    for (i, result) in results.iter().take(6).enumerate() {
        assert_eq!(result.as_deref(), Some(&format!("blob {i}").into_bytes()));
    }
    assert!(Arc::ptr_eq(
        results[2].as_ref().unwrap(),
        results[6].as_ref().unwrap()
    ));
    assert!(results[8].is_none());
    assert_eq!(loader.decodes(), 6);
}

#[test]
fn resolution_is_cached_until_cleared() {
    let root = tempfile::tempdir().unwrap();
    let cache = cache(root.path());
    let loader = CountingLoader::default();

    assert_eq!(cache.resolve("Late.bin"), None);
    write(root.path(), "Late.bin", b"late");
    assert_eq!(cache.resolve("Late.bin"), None);
    assert!(cache.prepare(&loader, "Late").is_none());

    cache.clear();
    assert_eq!(cache.resolve("Late.bin"), Some(root.path().join("Late.bin")));
    assert!(cache.prepare(&loader, "Late").is_some());
}

#[test]
fn scripts_from_disk() {
    let root = tempfile::tempdir().unwrap();
    write(root.path(), "Data/Gate.txt", b"// gates\n1 0 0 133 118\nend\n");

    let cache = cache(root.path());
    assert!(cache.get_script("Data/Gate.txt").is_none());

    let script = cache.prepare_script("data/gate.txt").unwrap();
    assert_eq!(script.lines()[0].field::<u8>(3), Some(133));

    let again = cache.get_script("Data/Gate.txt").unwrap();
    assert!(Arc::ptr_eq(&script, &again));
}

#[test]
fn scripts_from_archive() {
    let root = tempfile::tempdir().unwrap();

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("\\Gate.txt", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(b"1 \"Lorencia\" 2\n").unwrap();
    let archive = writer.finish().unwrap().into_inner();
    let archive_path = root.path().join("Data.zip");
    fs::write(&archive_path, archive).unwrap();

    let mut settings = Settings::new(root.path());
    settings.script_archive(&archive_path);
    let cache = AssetCache::new(settings).unwrap();

    let script = cache.prepare_script("/Gate.txt").unwrap();
    assert_eq!(script.lines()[0].raw(1), Some("Lorencia"));

    assert!(cache.prepare_script("Missing.txt").is_none());
    assert!(matches!(
        cache.load_script("Missing.txt"),
        Err(Error::Script {
            error: mu_text::Error::EntryNotFound(_),
            ..
        })
    ));
}

#[test]
fn missing_archive() {
    let root = tempfile::tempdir().unwrap();
    let mut settings = Settings::new(root.path());
    settings.script_archive(root.path().join("Missing.zip"));

    assert!(matches!(
        AssetCache::new(settings),
        Err(Error::Script { .. })
    ));
}
