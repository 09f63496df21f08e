//! Resource module
//!
//! CPU-side assets consumed by the renderer and the asset collaborator trait.

pub mod asset_source;
pub mod mesh_asset;

pub use asset_source::{
    require_shader, require_texture, AssetSource, DirectoryAssets, InMemoryAssets, TextureAsset,
};
pub use mesh_asset::{MeshAsset, MeshInstanceId};
