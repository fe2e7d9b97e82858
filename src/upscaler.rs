//! The public upscaling facade.
//!
//! A [`Waifu2x`] value only exists once its model is loaded. Construction
//! runs, in order:
//!
//! 1. option validation (no engine, no file I/O)
//! 2. model family lookup
//! 3. engine creation
//! 4. tile size / pre-padding resolution
//! 5. model file location
//! 6. engine parameter assignment and model load
//!
//! Any failure drops whatever was acquired and returns the error; there is
//! no half-loaded state to recover from.

use crate::config::Options;
use crate::engine::{Device, Engine, EngineError, EngineParams, EngineSettings, NativeEngine};
use crate::error::Result;
use crate::imaging::{RawImage, from_native, to_native};
use crate::model::{LocatedModel, ModelLocator, ModelPaths, ModelSpec, file_stem};
use crate::resolver::{self, Resolved};
use image::DynamicImage;
use tracing::{debug, info};

/// waifu2x upscaler bound to one engine handle and one loaded model.
///
/// `process` takes `&mut self`: the CPU path rewrites the engine's tile size
/// before every call, so a handle must not be shared between concurrent
/// callers.
pub struct Waifu2x<E: Engine = NativeEngine> {
    engine: E,
    device: Device,
    model: ModelSpec,
    paths: ModelPaths,
    params: EngineParams,
}

impl Waifu2x<NativeEngine> {
    /// Create an upscaler on the linked native engine.
    pub fn new(options: &Options) -> Result<Self> {
        Self::with_engine(options, NativeEngine::create)
    }
}

impl<E: Engine> Waifu2x<E> {
    /// Create an upscaler on an engine produced by `create`.
    ///
    /// `create` is only called once `options` have been validated and the
    /// model family is known.
    pub fn with_engine<F>(options: &Options, create: F) -> Result<Self>
    where
        F: FnOnce(&EngineSettings) -> std::result::Result<E, EngineError>,
    {
        options.validate()?;
        let model = ModelSpec::parse(&options.model)?;
        let device = options.device();

        let settings = EngineSettings {
            device,
            tta_mode: options.tta_mode,
            num_threads: options.num_threads,
        };
        let mut engine = create(&settings)?;

        let Resolved {
            tile_size,
            prepadding,
        } = resolver::resolve(
            device,
            model.family(),
            options.noise,
            options.scale,
            options.tile_size,
            || engine.heap_budget(),
        )?;
        debug!(model = model.identifier(), tile_size, prepadding, "configuration resolved");

        let LocatedModel { paths, scale } = match &options.model_files {
            Some(files) => LocatedModel {
                paths: ModelPaths::new(&files.param, &files.bin)?,
                scale: file_stem(options.noise, options.scale)?.1,
            },
            None => {
                let locator = match &options.models_dir {
                    Some(dir) => ModelLocator::new(dir),
                    None => ModelLocator::bundled(),
                };
                locator.locate(model.identifier(), options.noise, options.scale)?
            }
        };

        let params = EngineParams {
            scale,
            noise: options.noise,
            tile_size,
            prepadding,
        };
        engine.set_params(params);
        engine.load(&paths)?;
        info!(
            param = %paths.param().display(),
            device = ?device,
            scale,
            noise = options.noise,
            tile_size,
            "model loaded"
        );

        Ok(Self {
            engine,
            device,
            model,
            paths,
            params,
        })
    }

    /// Upscale a decoded image. The result keeps the input's colour mode.
    pub fn process(&mut self, image: &DynamicImage) -> Result<DynamicImage> {
        let (input, mode) = to_native(image)?;
        let output = self.process_raw(&input)?;
        from_native(output, mode)
    }

    /// Upscale a raw buffer into a freshly allocated `scale`× buffer.
    pub fn process_raw(&mut self, input: &RawImage) -> Result<RawImage> {
        let mut output = input.zeroed_output(self.params.scale);
        debug!(
            width = input.width(),
            height = input.height(),
            channels = input.channels(),
            device = ?self.device,
            "processing"
        );
        match self.device {
            Device::Gpu(_) => self.engine.process(input, &mut output)?,
            Device::Cpu => {
                self.params.tile_size = input.width().max(input.height());
                self.engine.set_params(self.params);
                self.engine.process_cpu(input, &mut output)?;
            }
        }
        Ok(output)
    }

    /// Effective scale. 2 whenever noise is -1, whatever was requested.
    pub fn scale(&self) -> u32 {
        self.params.scale
    }

    pub fn noise(&self) -> i32 {
        self.params.noise
    }

    /// Tile size last handed to the engine.
    pub fn tile_size(&self) -> u32 {
        self.params.tile_size
    }

    pub fn prepadding(&self) -> u32 {
        self.params.prepadding
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn model(&self) -> &ModelSpec {
        &self.model
    }

    pub fn model_paths(&self) -> &ModelPaths {
        &self.paths
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelFiles;
    use crate::engine::tests::{DropCounter, MockEngine, RecordedOp};
    use crate::error::Waifu2xError;
    use crate::resolver::CPU_TILE_SIZE;
    use crate::test_helpers::{gpu_mock, models_root, options_for as options};
    use image::{GenericImageView, Rgb, RgbImage};
    use std::cell::Cell;
    use std::fs;

    #[test]
    fn gpu_construction_resolves_and_loads() {
        let root = models_root();
        let upscaler = Waifu2x::with_engine(&options(&root), gpu_mock(3000)).unwrap();

        assert_eq!(upscaler.tile_size(), 400);
        assert_eq!(upscaler.prepadding(), 18);
        assert_eq!(upscaler.scale(), 2);
        assert_eq!(upscaler.device(), Device::Gpu(0));

        let ops = upscaler.engine().get_operations();
        assert_eq!(ops[0], RecordedOp::HeapBudget);
        assert_eq!(
            ops[1],
            RecordedOp::SetParams(EngineParams {
                scale: 2,
                noise: 0,
                tile_size: 400,
                prepadding: 18,
            })
        );
        assert!(matches!(&ops[2], RecordedOp::Load { param, .. }
            if param.ends_with("noise0_scale2.0x_model.param")));
    }

    #[test]
    fn settings_forwarded_to_engine() {
        let root = models_root();
        let opts = Options {
            tta_mode: true,
            num_threads: 4,
            gpu_id: 1,
            ..options(&root)
        };
        let upscaler = Waifu2x::with_engine(&opts, gpu_mock(1000)).unwrap();
        assert_eq!(
            upscaler.engine().settings,
            Some(EngineSettings {
                device: Device::Gpu(1),
                tta_mode: true,
                num_threads: 4,
            })
        );
    }

    #[test]
    fn invalid_scale_fails_before_engine_creation() {
        let created = Cell::new(false);
        let opts = Options {
            scale: 3,
            models_dir: Some("/nonexistent".into()),
            ..Options::default()
        };
        let result = Waifu2x::with_engine(&opts, |settings| {
            created.set(true);
            Ok(MockEngine::new(settings))
        });
        assert!(matches!(result, Err(Waifu2xError::InvalidArgument(_))));
        assert!(!created.get());
    }

    #[test]
    fn unsupported_model_fails_before_engine_creation() {
        let created = Cell::new(false);
        let opts = Options {
            model: "models-unknown".into(),
            ..Options::default()
        };
        let result = Waifu2x::with_engine(&opts, |settings| {
            created.set(true);
            Ok(MockEngine::new(settings))
        });
        assert!(matches!(result, Err(Waifu2xError::UnsupportedModel(_))));
        assert!(!created.get());
    }

    #[test]
    fn missing_weight_file_releases_engine() {
        let root = models_root();
        fs::remove_file(root.path().join("models-cunet/noise0_scale2.0x_model.bin")).unwrap();
        let drops = DropCounter::default();
        let counter = drops.clone();

        let result = Waifu2x::with_engine(&options(&root), move |settings| {
            Ok(MockEngine {
                drops: counter,
                ..MockEngine::new(settings)
            })
        });
        assert!(matches!(
            result,
            Err(Waifu2xError::ModelFilesNotFound { .. })
        ));
        // One drop for the engine's counter; the test still holds its own.
        assert_eq!(drops.count(), 1);
    }

    #[test]
    fn load_failure_is_native_error() {
        let root = models_root();
        let result = Waifu2x::with_engine(&options(&root), |settings| {
            Ok(MockEngine {
                fail_load: true,
                ..MockEngine::new(settings)
            })
        });
        assert!(matches!(
            result,
            Err(Waifu2xError::NativeEngine(EngineError::Status { op: "load", .. }))
        ));
    }

    #[test]
    fn engine_creation_failure_propagates() {
        let root = models_root();
        let result: Result<Waifu2x<MockEngine>> = Waifu2x::with_engine(&options(&root), |_| {
            Err(EngineError::Unavailable("no vulkan".into()))
        });
        assert!(matches!(
            result,
            Err(Waifu2xError::NativeEngine(EngineError::Unavailable(_)))
        ));
    }

    #[test]
    fn cpu_mode_uses_flat_tile_and_cpu_path() {
        let root = models_root();
        let opts = Options {
            gpu_id: -1,
            ..options(&root)
        };
        let mut upscaler = Waifu2x::with_engine(&opts, |settings| {
            Ok(MockEngine::new(settings))
        })
        .unwrap();
        assert_eq!(upscaler.tile_size(), CPU_TILE_SIZE);
        assert!(!upscaler
            .engine()
            .get_operations()
            .contains(&RecordedOp::HeapBudget));

        let image = DynamicImage::ImageRgb8(RgbImage::new(30, 12));
        let out = upscaler.process(&image).unwrap();
        assert_eq!(out.dimensions(), (60, 24));
        assert_eq!(upscaler.tile_size(), 30);

        let ops = upscaler.engine().get_operations();
        assert_eq!(
            ops.last(),
            Some(&RecordedOp::ProcessCpu {
                tile_size: 30,
                width: 30,
                height: 12,
            })
        );
    }

    #[test]
    fn gpu_mode_keeps_resolved_tile() {
        let root = models_root();
        let mut upscaler = Waifu2x::with_engine(&options(&root), gpu_mock(500)).unwrap();
        let image = DynamicImage::ImageRgb8(RgbImage::new(8, 8));

        upscaler.process(&image).unwrap();
        upscaler.process(&image).unwrap();

        let processed: Vec<_> = upscaler
            .engine()
            .get_operations()
            .into_iter()
            .filter(|op| matches!(op, RecordedOp::Process { .. }))
            .collect();
        assert_eq!(processed.len(), 2);
        assert!(processed.iter().all(|op| matches!(
            op,
            RecordedOp::Process { tile_size: 100, .. }
        )));
    }

    #[test]
    fn process_preserves_mode_and_pixels() {
        let root = models_root();
        let mut upscaler = Waifu2x::with_engine(&options(&root), gpu_mock(3000)).unwrap();
        let mut image = RgbImage::new(2, 1);
        image.put_pixel(0, 0, Rgb([255, 0, 0]));
        image.put_pixel(1, 0, Rgb([0, 0, 255]));

        let out = upscaler.process(&DynamicImage::ImageRgb8(image)).unwrap();
        let out = out.as_rgb8().expect("mode preserved");
        assert_eq!(out.dimensions(), (4, 2));
        assert_eq!(out.get_pixel(1, 1), &Rgb([255, 0, 0]));
        assert_eq!(out.get_pixel(2, 0), &Rgb([0, 0, 255]));
    }

    #[test]
    fn noise_off_forces_scale_two() {
        let root = models_root();
        let opts = Options {
            scale: 1,
            noise: -1,
            ..options(&root)
        };
        let mut upscaler = Waifu2x::with_engine(&opts, gpu_mock(3000)).unwrap();
        assert_eq!(upscaler.scale(), 2);
        assert!(upscaler
            .model_paths()
            .param()
            .ends_with("scale2.0x_model.param"));

        let out = upscaler
            .process(&DynamicImage::new_luma8(5, 3))
            .unwrap();
        assert_eq!(out.dimensions(), (10, 6));
    }

    #[test]
    fn scale_one_keeps_dimensions() {
        let root = models_root();
        let opts = Options {
            scale: 1,
            noise: 1,
            ..options(&root)
        };
        let mut upscaler = Waifu2x::with_engine(&opts, gpu_mock(3000)).unwrap();
        assert_eq!(upscaler.prepadding(), 28);
        let out = upscaler.process(&DynamicImage::new_rgba8(7, 9)).unwrap();
        assert_eq!(out.dimensions(), (7, 9));
    }

    #[test]
    fn photo_model_prepadding() {
        let root = models_root();
        let opts = Options {
            model: "models-upconv_7_photo".into(),
            noise: 2,
            ..options(&root)
        };
        let upscaler = Waifu2x::with_engine(&opts, gpu_mock(600)).unwrap();
        assert_eq!(upscaler.prepadding(), 7);
        assert_eq!(upscaler.tile_size(), 200);
    }

    #[test]
    fn explicit_tile_size_skips_budget() {
        let root = models_root();
        let opts = Options {
            tile_size: 128,
            ..options(&root)
        };
        let upscaler = Waifu2x::with_engine(&opts, gpu_mock(3000)).unwrap();
        assert_eq!(upscaler.tile_size(), 128);
        assert!(!upscaler
            .engine()
            .get_operations()
            .contains(&RecordedOp::HeapBudget));
    }

    #[test]
    fn model_directory_path_identifier() {
        let root = models_root();
        let dir = root.path().join("models-cunet");
        let opts = Options {
            model: dir.to_string_lossy().to_string(),
            models_dir: Some("/nonexistent".into()),
            ..Options::default()
        };
        let upscaler = Waifu2x::with_engine(&opts, gpu_mock(3000)).unwrap();
        assert_eq!(
            upscaler.model_paths().param(),
            dir.join("noise0_scale2.0x_model.param")
        );
    }

    #[test]
    fn explicit_model_files() {
        let root = models_root();
        let dir = root.path().join("models-cunet");
        let opts = Options {
            model_files: Some(ModelFiles {
                param: dir.join("noise1_model.param"),
                bin: dir.join("noise1_model.bin"),
            }),
            models_dir: Some("/nonexistent".into()),
            ..Options::default()
        };
        let upscaler = Waifu2x::with_engine(&opts, gpu_mock(3000)).unwrap();
        assert_eq!(upscaler.model_paths().bin(), dir.join("noise1_model.bin"));
    }

    #[test]
    fn sixteen_bit_image_never_reaches_engine() {
        let root = models_root();
        let mut upscaler = Waifu2x::with_engine(&options(&root), gpu_mock(3000)).unwrap();
        let err = upscaler
            .process(&DynamicImage::new_rgb16(4, 4))
            .unwrap_err();
        assert!(matches!(err, Waifu2xError::MalformedImage(_)));
        assert!(!upscaler
            .engine()
            .get_operations()
            .iter()
            .any(|op| matches!(op, RecordedOp::Process { .. })));
    }

    #[test]
    fn empty_image_never_reaches_engine() {
        let root = models_root();
        let mut upscaler = Waifu2x::with_engine(&options(&root), gpu_mock(3000)).unwrap();
        let err = upscaler
            .process(&DynamicImage::new_rgb8(0, 0))
            .unwrap_err();
        assert!(matches!(err, Waifu2xError::MalformedImage(_)));
        assert!(!upscaler
            .engine()
            .get_operations()
            .iter()
            .any(|op| matches!(op, RecordedOp::Process { .. })));
    }

    #[test]
    fn process_error_propagates() {
        let root = models_root();
        let mut upscaler = Waifu2x::with_engine(&options(&root), |settings| {
            Ok(MockEngine {
                fail_process: true,
                ..MockEngine::new(settings).with_heap_budget(3000)
            })
        })
        .unwrap();
        let err = upscaler
            .process(&DynamicImage::new_rgb8(2, 2))
            .unwrap_err();
        assert!(matches!(err, Waifu2xError::NativeEngine(_)));
    }
}
