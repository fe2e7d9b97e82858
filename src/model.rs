//! Model families and model file location.
//!
//! ## Families
//!
//! Each supported network family carries one [`ModelFamily`] descriptor with
//! both of its lookup tables, so the pre-padding and tile-size policies cannot
//! drift apart when a family is added:
//!
//! | Family | Pre-padding | Tile table (heap budget MB → tile) |
//! |---|---|---|
//! | `models-cunet` | 18 (28 at scale 1) | >2600 → 400, >740 → 200, >250 → 100, else 32 |
//! | `models-upconv_7_anime_style_art_rgb` | 7 | >1900 → 400, >550 → 200, >190 → 100, else 32 |
//! | `models-upconv_7_photo` | 7 | >1900 → 400, >550 → 200, >190 → 100, else 32 |
//!
//! ## File layout
//!
//! A model directory holds one `.param`/`.bin` pair per (noise, scale):
//!
//! ```text
//! models/models-cunet/
//! ├── noise0_model.param            # scale 1
//! ├── noise0_model.bin
//! ├── noise0_scale2.0x_model.param  # scale 2
//! ├── noise0_scale2.0x_model.bin
//! ├── scale2.0x_model.param         # noise -1 (upscale only)
//! └── scale2.0x_model.bin
//! ```
//!
//! Noise `-1` only ships a 2× model, so requesting it forces scale 2 even when
//! the caller asked for scale 1. That override is silent; callers should read
//! the effective scale back from [`LocatedModel::scale`].

use crate::engine::EngineError;
use crate::error::{Result, Waifu2xError};
use std::path::{Path, PathBuf};

/// Name of the bundled models directory, resolved next to the executable.
pub const BUNDLED_MODELS_DIR: &str = "models";

/// Pre-padding lookup for one family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prepadding {
    /// Used when denoising is disabled (noise `-1`).
    pub denoise_off: u32,
    /// `(scale, prepadding)` pairs.
    pub by_scale: &'static [(u32, u32)],
    pub fallback: u32,
}

impl Prepadding {
    pub const fn fixed(value: u32) -> Self {
        Self {
            denoise_off: value,
            by_scale: &[],
            fallback: value,
        }
    }

    pub fn lookup(&self, noise: i32, scale: u32) -> u32 {
        if noise == -1 {
            return self.denoise_off;
        }
        self.by_scale
            .iter()
            .find(|(s, _)| *s == scale)
            .map(|(_, p)| *p)
            .unwrap_or(self.fallback)
    }
}

/// Descending heap-budget thresholds mapping to a tile size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileTable {
    /// `(budget, tile)`: first entry whose budget is strictly exceeded wins.
    pub thresholds: &'static [(u32, u32)],
    pub floor: u32,
}

impl TileTable {
    pub fn select(&self, heap_budget: u32) -> u32 {
        self.thresholds
            .iter()
            .find(|(min, _)| heap_budget > *min)
            .map(|(_, tile)| *tile)
            .unwrap_or(self.floor)
    }
}

/// Everything the binding needs to know about a network family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelFamily {
    pub name: &'static str,
    pub prepadding: Prepadding,
    pub tiles: TileTable,
}

const CUNET_TILES: TileTable = TileTable {
    thresholds: &[(2600, 400), (740, 200), (250, 100)],
    floor: 32,
};

const UPCONV_TILES: TileTable = TileTable {
    thresholds: &[(1900, 400), (550, 200), (190, 100)],
    floor: 32,
};

pub const CUNET: ModelFamily = ModelFamily {
    name: "models-cunet",
    prepadding: Prepadding {
        denoise_off: 18,
        by_scale: &[(1, 28), (2, 18)],
        fallback: 18,
    },
    tiles: CUNET_TILES,
};

pub const UPCONV_7_ANIME_STYLE_ART_RGB: ModelFamily = ModelFamily {
    name: "models-upconv_7_anime_style_art_rgb",
    prepadding: Prepadding::fixed(7),
    tiles: UPCONV_TILES,
};

pub const UPCONV_7_PHOTO: ModelFamily = ModelFamily {
    name: "models-upconv_7_photo",
    prepadding: Prepadding::fixed(7),
    tiles: UPCONV_TILES,
};

pub const MODEL_FAMILIES: &[ModelFamily] = &[CUNET, UPCONV_7_ANIME_STYLE_ART_RGB, UPCONV_7_PHOTO];

/// Look up a family by its directory name.
pub fn family(name: &str) -> Option<&'static ModelFamily> {
    MODEL_FAMILIES.iter().find(|f| f.name == name)
}

/// A model identifier and the family it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    identifier: String,
    family: &'static ModelFamily,
}

impl ModelSpec {
    /// Parse a family name (`models-cunet`) or a model directory path whose
    /// last component is a family name (`/opt/waifu2x/models-cunet`).
    ///
    /// The family, and with it pre-padding and tile sizing, is taken from
    /// that last component. A directory with any other name fails with
    /// [`Waifu2xError::UnsupportedModel`], even if it holds valid model
    /// files; pass such files through `model_files` with a family `model`.
    pub fn parse(identifier: &str) -> Result<Self> {
        let family = family(identifier)
            .or_else(|| {
                Path::new(identifier)
                    .file_name()
                    .and_then(|n| n.to_str())
                    .and_then(family)
            })
            .ok_or_else(|| Waifu2xError::UnsupportedModel(identifier.to_string()))?;
        Ok(Self {
            identifier: identifier.to_string(),
            family,
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn family(&self) -> &'static ModelFamily {
        self.family
    }
}

/// File stem for a (noise, scale) pair, plus the scale the model really has.
pub fn file_stem(noise: i32, scale: u32) -> Result<(String, u32)> {
    match (noise, scale) {
        (-1, _) => Ok(("scale2.0x_model".to_string(), 2)),
        (0..=3, 1) => Ok((format!("noise{noise}_model"), 1)),
        (0..=3, 2) => Ok((format!("noise{noise}_scale2.0x_model"), 2)),
        _ => Err(Waifu2xError::InvalidArgument(format!(
            "no model for noise {noise} at scale {scale}"
        ))),
    }
}

/// Character type the native model loader takes for paths.
#[cfg(windows)]
pub type NativeChar = u16;
#[cfg(not(windows))]
pub type NativeChar = std::ffi::c_char;

/// NUL-terminated path in the encoding the native loader expects: UTF-16 on
/// Windows, raw OS bytes elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativePath {
    #[cfg(windows)]
    buf: Vec<u16>,
    #[cfg(not(windows))]
    buf: std::ffi::CString,
}

impl NativePath {
    pub fn new(path: &Path) -> std::result::Result<Self, EngineError> {
        let nul = || EngineError::InvalidPath(format!("{} contains a NUL byte", path.display()));

        #[cfg(windows)]
        {
            use std::os::windows::ffi::OsStrExt;
            let mut buf: Vec<u16> = path.as_os_str().encode_wide().collect();
            if buf.contains(&0) {
                return Err(nul());
            }
            buf.push(0);
            Ok(Self { buf })
        }
        #[cfg(unix)]
        {
            use std::os::unix::ffi::OsStrExt;
            let buf = std::ffi::CString::new(path.as_os_str().as_bytes()).map_err(|_| nul())?;
            Ok(Self { buf })
        }
        #[cfg(not(any(unix, windows)))]
        {
            let s = path.to_str().ok_or_else(|| {
                EngineError::InvalidPath(format!("{} is not valid UTF-8", path.display()))
            })?;
            let buf = std::ffi::CString::new(s).map_err(|_| nul())?;
            Ok(Self { buf })
        }
    }

    pub fn as_ptr(&self) -> *const NativeChar {
        self.buf.as_ptr()
    }
}

/// An existing parameter/weight file pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPaths {
    param: PathBuf,
    bin: PathBuf,
}

impl ModelPaths {
    /// Pair two files, failing if either is missing.
    pub fn new(param: impl Into<PathBuf>, bin: impl Into<PathBuf>) -> Result<Self> {
        let (param, bin) = (param.into(), bin.into());
        if param.is_file() && bin.is_file() {
            Ok(Self { param, bin })
        } else {
            Err(Waifu2xError::ModelFilesNotFound { param, bin })
        }
    }

    pub fn param(&self) -> &Path {
        &self.param
    }

    pub fn bin(&self) -> &Path {
        &self.bin
    }

    /// Encode both paths for the native loader.
    pub fn to_native(&self) -> std::result::Result<(NativePath, NativePath), EngineError> {
        Ok((NativePath::new(&self.param)?, NativePath::new(&self.bin)?))
    }
}

/// Result of locating a model: the file pair and the scale it produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedModel {
    pub paths: ModelPaths,
    pub scale: u32,
}

/// Resolves model identifiers against a models directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelLocator {
    root: PathBuf,
}

impl ModelLocator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `models/` next to the running executable, or `./models` when the
    /// executable path is unknown.
    pub fn bundled() -> Self {
        let root = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(BUNDLED_MODELS_DIR)))
            .unwrap_or_else(|| PathBuf::from(BUNDLED_MODELS_DIR));
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// An existing directory is used as-is; anything else is a name under the
    /// models root.
    pub fn model_dir(&self, identifier: &str) -> PathBuf {
        let direct = Path::new(identifier);
        if direct.is_dir() {
            direct.to_path_buf()
        } else {
            self.root.join(identifier)
        }
    }

    pub fn locate(&self, identifier: &str, noise: i32, scale: u32) -> Result<LocatedModel> {
        let (stem, scale) = file_stem(noise, scale)?;
        let dir = self.model_dir(identifier);
        let paths = ModelPaths::new(
            dir.join(format!("{stem}.param")),
            dir.join(format!("{stem}.bin")),
        )?;
        Ok(LocatedModel { paths, scale })
    }
}
