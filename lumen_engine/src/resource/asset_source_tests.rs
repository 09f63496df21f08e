use super::*;

#[test]
fn test_in_memory_lookup() {
    let mut assets = InMemoryAssets::new();
    assets.insert_shader("shaders/mesh.vert.spv", vec![3, 2, 35, 7]);
    assets.insert_texture("textures/default", TextureAsset::checkerboard(4, 2, [255; 4], [0, 0, 0, 255]));

    assert_eq!(assets.shader("shaders/mesh.vert.spv"), Some(vec![3, 2, 35, 7]));
    assert!(assets.shader("shaders/other.spv").is_none());
    assert_eq!(assets.texture("textures/default").unwrap().width, 4);
}

#[test]
fn test_require_reports_missing_asset_by_name() {
    let assets = InMemoryAssets::new();
    assert_eq!(
        require_shader(&assets, "shaders/mesh.frag.spv"),
        Err(Error::AssetMissing("shaders/mesh.frag.spv".to_string()))
    );
    assert_eq!(
        require_texture(&assets, "textures/default"),
        Err(Error::AssetMissing("textures/default".to_string()))
    );
}

#[test]
fn test_checkerboard_layout() {
    let tex = TextureAsset::checkerboard(4, 2, [1, 1, 1, 1], [2, 2, 2, 2]);
    assert_eq!(tex.pixels.len(), 4 * 4 * 4);
    // (0,0) and (2,2) share a color, (2,0) differs
    let at = |x: usize, y: usize| tex.pixels[(y * 4 + x) * 4];
    assert_eq!(at(0, 0), 1);
    assert_eq!(at(2, 0), 2);
    assert_eq!(at(2, 2), 1);
}

#[test]
fn test_directory_assets_reads_shader_files() {
    let dir = std::env::temp_dir().join(format!("lumen_assets_{}", std::process::id()));
    std::fs::create_dir_all(dir.join("shaders")).unwrap();
    std::fs::write(dir.join("shaders/mesh.vert.spv"), [1u8, 2, 3, 4]).unwrap();

    let assets = DirectoryAssets::new(&dir);
    assert_eq!(assets.shader("shaders/mesh.vert.spv"), Some(vec![1, 2, 3, 4]));
    assert!(assets.shader("shaders/missing.spv").is_none());

    std::fs::remove_dir_all(&dir).ok();
}
