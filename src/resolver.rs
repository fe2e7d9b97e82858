//! Runtime configuration resolution: tile size and pre-padding.
//!
//! Pure functions over the [`ModelFamily`] tables. The only input that comes
//! from the engine is the heap budget, passed in as a closure so it is only
//! queried when the tile size is actually automatic on a GPU.

use crate::engine::{Device, EngineError};
use crate::model::ModelFamily;

/// Tile size used on the CPU path, large enough to treat most images as a
/// single tile.
pub const CPU_TILE_SIZE: u32 = 4000;

/// Effective engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    pub tile_size: u32,
    pub prepadding: u32,
}

/// Tile size for `device`, honouring a positive `requested` override.
pub fn tile_size(
    device: Device,
    family: &ModelFamily,
    requested: i32,
    heap_budget: impl FnOnce() -> Result<u32, EngineError>,
) -> Result<u32, EngineError> {
    if requested > 0 {
        return Ok(requested as u32);
    }
    match device {
        Device::Cpu => Ok(CPU_TILE_SIZE),
        Device::Gpu(_) => Ok(family.tiles.select(heap_budget()?)),
    }
}

pub fn resolve(
    device: Device,
    family: &ModelFamily,
    noise: i32,
    scale: u32,
    requested_tile: i32,
    heap_budget: impl FnOnce() -> Result<u32, EngineError>,
) -> Result<Resolved, EngineError> {
    Ok(Resolved {
        tile_size: tile_size(device, family, requested_tile, heap_budget)?,
        prepadding: family.prepadding.lookup(noise, scale),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CUNET, UPCONV_7_ANIME_STYLE_ART_RGB, UPCONV_7_PHOTO};

    fn budget(mb: u32) -> impl FnOnce() -> Result<u32, EngineError> {
        move || Ok(mb)
    }

    fn no_budget() -> Result<u32, EngineError> {
        panic!("heap budget must not be queried")
    }

    #[test]
    fn cpu_uses_flat_tile_without_querying_budget() {
        let resolved = resolve(Device::Cpu, &CUNET, 0, 2, 0, no_budget).unwrap();
        assert_eq!(resolved.tile_size, CPU_TILE_SIZE);
        assert_eq!(resolved.tile_size, 4000);
    }

    #[test]
    fn gpu_cunet_with_large_budget() {
        let resolved = resolve(Device::Gpu(0), &CUNET, 0, 2, 0, budget(3000)).unwrap();
        assert_eq!(
            resolved,
            Resolved {
                tile_size: 400,
                prepadding: 18
            }
        );
    }

    #[test]
    fn gpu_tables_differ_per_family() {
        let cunet = tile_size(Device::Gpu(0), &CUNET, 0, budget(2000)).unwrap();
        let anime =
            tile_size(Device::Gpu(0), &UPCONV_7_ANIME_STYLE_ART_RGB, 0, budget(2000)).unwrap();
        assert_eq!(cunet, 200);
        assert_eq!(anime, 400);

        assert_eq!(tile_size(Device::Gpu(1), &CUNET, 0, budget(100)).unwrap(), 32);
        assert_eq!(tile_size(Device::Gpu(1), &UPCONV_7_PHOTO, 0, budget(200)).unwrap(), 100);
    }

    #[test]
    fn positive_override_wins() {
        assert_eq!(tile_size(Device::Gpu(0), &CUNET, 256, no_budget).unwrap(), 256);
        assert_eq!(tile_size(Device::Cpu, &CUNET, 64, no_budget).unwrap(), 64);
    }

    #[test]
    fn zero_and_negative_mean_auto() {
        assert_eq!(tile_size(Device::Gpu(0), &CUNET, 0, budget(800)).unwrap(), 200);
        assert_eq!(tile_size(Device::Gpu(0), &CUNET, -5, budget(800)).unwrap(), 200);
    }

    #[test]
    fn budget_errors_propagate() {
        let err = tile_size(Device::Gpu(0), &CUNET, 0, || {
            Err(EngineError::Unavailable("no device".into()))
        })
        .unwrap_err();
        assert!(matches!(err, EngineError::Unavailable(_)));
    }

    #[test]
    fn photo_prepadding_for_any_noise_and_scale() {
        for noise in -1..=3 {
            for scale in [1, 2] {
                let resolved =
                    resolve(Device::Gpu(0), &UPCONV_7_PHOTO, noise, scale, 0, budget(1000))
                        .unwrap();
                assert_eq!(resolved.prepadding, 7);
            }
        }
    }

    #[test]
    fn resolution_is_idempotent() {
        let first = resolve(Device::Gpu(0), &CUNET, 1, 1, 0, budget(500)).unwrap();
        let second = resolve(Device::Gpu(0), &CUNET, 1, 1, 0, budget(500)).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.prepadding, 28);
        assert_eq!(first.tile_size, 100);
    }
}
