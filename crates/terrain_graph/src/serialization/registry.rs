//! Decoders for the open type families stored in graph documents.
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::blending::{
    AddBlend, BlendMode, DarkenBlend, DifferenceBlend, LightenBlend, MaskBlend, MultiplyBlend,
    OverlayBlend, ScreenBlend, SubtractBlend,
};
use crate::effects::{
    BrightnessEffect, ContrastEffect, Effect, GammaEffect, GaussianBlurEffect, IntensityEffect,
    InvertEffect,
};
use crate::error::{Error, Result};
use crate::generators::{
    DiamondSquareGenerator, FbmSimplexGenerator, FlatGenerator, Generator, PyramidGenerator,
    RectangleGenerator, SimplexGenerator, VoronoiGenerator, WhiteNoiseGenerator,
};

pub type GeneratorDecoder = Arc<dyn Fn(Value) -> Result<Arc<dyn Generator>> + Send + Sync>;
pub type EffectDecoder = Arc<dyn Fn(Value) -> Result<Arc<dyn Effect>> + Send + Sync>;
pub type BlendModeDecoder = Arc<dyn Fn(Value) -> Result<Arc<dyn BlendMode>> + Send + Sync>;

/// Maps type tags to decode functions for generators, effects and blend modes.
///
/// Encoding goes through each value's own `to_payload`; decoding looks the
/// tag up here. Use [`TypeRegistry::with_defaults`] for the built-in types and
/// register custom implementations on top.
#[derive(Clone, Default)]
pub struct TypeRegistry {
    generators: HashMap<String, GeneratorDecoder>,
    effects: HashMap<String, EffectDecoder>,
    blend_modes: HashMap<String, BlendModeDecoder>,
}

fn sorted_keys<V>(map: &HashMap<String, V>) -> Vec<&str> {
    let mut keys: Vec<&str> = map.keys().map(String::as_str).collect();
    keys.sort_unstable();
    keys
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("generators", &sorted_keys(&self.generators))
            .field("effects", &sorted_keys(&self.effects))
            .field("blend_modes", &sorted_keys(&self.blend_modes))
            .finish()
    }
}

impl TypeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with every built-in generator, effect and blend mode.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        registry.register_generator_type::<FlatGenerator>(FlatGenerator::TYPE_TAG);
        registry.register_generator_type::<WhiteNoiseGenerator>(WhiteNoiseGenerator::TYPE_TAG);
        registry
            .register_generator_type::<DiamondSquareGenerator>(DiamondSquareGenerator::TYPE_TAG);
        registry.register_generator(VoronoiGenerator::TYPE_TAG, |payload| {
            let generator: VoronoiGenerator = serde_json::from_value(payload)?;
            generator.validate()?;
            Ok(Arc::new(generator) as Arc<dyn Generator>)
        });
        registry.register_generator_type::<SimplexGenerator>(SimplexGenerator::TYPE_TAG);
        registry.register_generator(FbmSimplexGenerator::TYPE_TAG, |payload| {
            let generator: FbmSimplexGenerator = serde_json::from_value(payload)?;
            generator.validate()?;
            Ok(Arc::new(generator) as Arc<dyn Generator>)
        });
        registry.register_generator_type::<PyramidGenerator>(PyramidGenerator::TYPE_TAG);
        registry.register_generator_type::<RectangleGenerator>(RectangleGenerator::TYPE_TAG);

        registry.register_effect_type::<BrightnessEffect>(BrightnessEffect::TYPE_TAG);
        registry.register_effect_type::<ContrastEffect>(ContrastEffect::TYPE_TAG);
        registry.register_effect_type::<GammaEffect>(GammaEffect::TYPE_TAG);
        registry.register_effect_type::<IntensityEffect>(IntensityEffect::TYPE_TAG);
        registry.register_effect_type::<GaussianBlurEffect>(GaussianBlurEffect::TYPE_TAG);
        registry.register_unit_effect::<InvertEffect>(InvertEffect::TYPE_TAG);

        registry.register_unit_blend_mode::<AddBlend>(AddBlend::TYPE_TAG);
        registry.register_unit_blend_mode::<SubtractBlend>(SubtractBlend::TYPE_TAG);
        registry.register_unit_blend_mode::<MultiplyBlend>(MultiplyBlend::TYPE_TAG);
        registry.register_unit_blend_mode::<ScreenBlend>(ScreenBlend::TYPE_TAG);
        registry.register_unit_blend_mode::<DarkenBlend>(DarkenBlend::TYPE_TAG);
        registry.register_unit_blend_mode::<LightenBlend>(LightenBlend::TYPE_TAG);
        registry.register_unit_blend_mode::<OverlayBlend>(OverlayBlend::TYPE_TAG);
        registry.register_unit_blend_mode::<DifferenceBlend>(DifferenceBlend::TYPE_TAG);
        registry.register_unit_blend_mode::<MaskBlend>(MaskBlend::TYPE_TAG);

        registry
    }

    /// Total number of registered decoders.
    pub fn len(&self) -> usize {
        self.generators.len() + self.effects.len() + self.blend_modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registers a generator decoder, replacing any previous one for `tag`.
    pub fn register_generator<F>(&mut self, tag: impl Into<String>, decode: F)
    where
        F: Fn(Value) -> Result<Arc<dyn Generator>> + Send + Sync + 'static,
    {
        self.generators.insert(tag.into(), Arc::new(decode));
    }

    /// Registers a generator decoded straight from its serde payload.
    pub fn register_generator_type<T>(&mut self, tag: impl Into<String>)
    where
        T: Generator + DeserializeOwned + 'static,
    {
        self.register_generator(tag, |payload| {
            Ok(Arc::new(serde_json::from_value::<T>(payload)?) as Arc<dyn Generator>)
        });
    }

    pub fn register_effect<F>(&mut self, tag: impl Into<String>, decode: F)
    where
        F: Fn(Value) -> Result<Arc<dyn Effect>> + Send + Sync + 'static,
    {
        self.effects.insert(tag.into(), Arc::new(decode));
    }

    pub fn register_effect_type<T>(&mut self, tag: impl Into<String>)
    where
        T: Effect + DeserializeOwned + 'static,
    {
        self.register_effect(tag, |payload| {
            Ok(Arc::new(serde_json::from_value::<T>(payload)?) as Arc<dyn Effect>)
        });
    }

    /// Registers a parameterless effect; its payload is ignored.
    pub fn register_unit_effect<T>(&mut self, tag: impl Into<String>)
    where
        T: Effect + Default + 'static,
    {
        self.register_effect(tag, |_| Ok(Arc::new(T::default()) as Arc<dyn Effect>));
    }

    pub fn register_blend_mode<F>(&mut self, tag: impl Into<String>, decode: F)
    where
        F: Fn(Value) -> Result<Arc<dyn BlendMode>> + Send + Sync + 'static,
    {
        self.blend_modes.insert(tag.into(), Arc::new(decode));
    }

    pub fn register_blend_mode_type<T>(&mut self, tag: impl Into<String>)
    where
        T: BlendMode + DeserializeOwned + 'static,
    {
        self.register_blend_mode(tag, |payload| {
            Ok(Arc::new(serde_json::from_value::<T>(payload)?) as Arc<dyn BlendMode>)
        });
    }

    /// Registers a parameterless blend mode; its payload is ignored.
    pub fn register_unit_blend_mode<T>(&mut self, tag: impl Into<String>)
    where
        T: BlendMode + Default + 'static,
    {
        self.register_blend_mode(tag, |_| Ok(Arc::new(T::default()) as Arc<dyn BlendMode>));
    }

    pub fn contains_generator(&self, tag: &str) -> bool {
        self.generators.contains_key(tag)
    }

    pub fn contains_effect(&self, tag: &str) -> bool {
        self.effects.contains_key(tag)
    }

    pub fn contains_blend_mode(&self, tag: &str) -> bool {
        self.blend_modes.contains_key(tag)
    }

    pub fn decode_generator(&self, tag: &str, payload: Value) -> Result<Arc<dyn Generator>> {
        let decode = self.generators.get(tag).ok_or_else(|| Error::UnknownType {
            kind: "generator",
            tag: tag.to_owned(),
        })?;
        decode(payload)
    }

    pub fn decode_effect(&self, tag: &str, payload: Value) -> Result<Arc<dyn Effect>> {
        let decode = self.effects.get(tag).ok_or_else(|| Error::UnknownType {
            kind: "effect",
            tag: tag.to_owned(),
        })?;
        decode(payload)
    }

    pub fn decode_blend_mode(&self, tag: &str, payload: Value) -> Result<Arc<dyn BlendMode>> {
        let decode = self.blend_modes.get(tag).ok_or_else(|| Error::UnknownType {
            kind: "blend mode",
            tag: tag.to_owned(),
        })?;
        decode(payload)
    }
}
