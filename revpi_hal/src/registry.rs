//! Component registry.
//!
//! Maps model names to factories. A factory receives the component
//! configuration and the control channel it should own; the registry is
//! built at startup and passed around by value, without global state.

use std::collections::HashMap;

use revpi_common::capability::Component;
use revpi_common::config::{BOARD_MODEL, ComponentConfig, ConfigError, ENCODER_MODEL};
use revpi_common::error::PiResult;
use tracing::info;

use crate::board::RevPiBoard;
use crate::channel::{ControlChannel, PiControl};
use crate::encoder::EncoderComponent;

/// Builds a component from its configuration and control channel.
pub type ComponentFactory =
    fn(&ComponentConfig, Box<dyn ControlChannel>) -> PiResult<Box<dyn Component>>;

fn create_board(
    config: &ComponentConfig,
    channel: Box<dyn ControlChannel>,
) -> PiResult<Box<dyn Component>> {
    Ok(Box::new(RevPiBoard::new(config, channel)?))
}

fn create_encoder(
    config: &ComponentConfig,
    channel: Box<dyn ControlChannel>,
) -> PiResult<Box<dyn Component>> {
    Ok(Box::new(EncoderComponent::new(config, channel)?))
}

/// Registry of component factories.
pub struct ComponentRegistry {
    factories: HashMap<&'static str, ComponentFactory>,
}

impl ComponentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry holding the board and encoder models.
    pub fn with_builtin() -> Self {
        let mut reg = Self::new();
        reg.register(BOARD_MODEL, create_board);
        reg.register(ENCODER_MODEL, create_encoder);
        reg
    }

    /// Register a factory.
    ///
    /// # Panics
    /// Panics if a factory with the same model name is already registered.
    pub fn register(&mut self, model: &'static str, factory: ComponentFactory) {
        if self.factories.contains_key(model) {
            panic!("Model '{model}' is already registered");
        }
        self.factories.insert(model, factory);
    }

    /// Get a factory by model name.
    pub fn get_factory(&self, model: &str) -> Option<ComponentFactory> {
        self.factories.get(model).copied()
    }

    /// Validate `config` and build its model on `channel`.
    pub fn create(
        &self,
        config: &ComponentConfig,
        channel: Box<dyn ControlChannel>,
    ) -> PiResult<Box<dyn Component>> {
        config.validate()?;
        let factory = self.get_factory(&config.model).ok_or_else(|| {
            ConfigError::ValidationError(format!(
                "no component registered for model '{}'",
                config.model
            ))
        })?;
        info!("Creating {} on {}", config.model, channel.describe());
        factory(config, channel)
    }

    /// Open `config.device_path` and build the configured model on it.
    pub fn open(&self, config: &ComponentConfig) -> PiResult<Box<dyn Component>> {
        let channel = PiControl::open(&config.device_path)?;
        self.create(config, Box::new(channel))
    }

    /// List all registered model names.
    pub fn list_models(&self) -> Vec<&'static str> {
        let mut models: Vec<_> = self.factories.keys().copied().collect();
        models.sort_unstable();
        models
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::SimulatedControl;
    use crate::channel::simulated::dio_module;
    use revpi_common::config::EncoderConfig;
    use revpi_common::error::PiError;

    fn channel() -> Box<dyn ControlChannel> {
        Box::new(
            SimulatedControl::default()
                .with_device(dio_module(31, 0))
                .with_variable("Counter_1", 6, 0, 32),
        )
    }

    #[test]
    fn registry_builtin_models() {
        let reg = ComponentRegistry::with_builtin();
        assert_eq!(reg.list_models(), vec![BOARD_MODEL, ENCODER_MODEL]);
    }

    #[test]
    fn registry_create_board() {
        let reg = ComponentRegistry::with_builtin();
        let comp = reg.create(&ComponentConfig::default(), channel()).unwrap();
        assert_eq!(comp.model(), BOARD_MODEL);
        assert!(comp.as_board().is_some());
    }

    #[test]
    fn registry_create_encoder_checks_mode() {
        let reg = ComponentRegistry::with_builtin();
        let config = ComponentConfig {
            model: ENCODER_MODEL.to_string(),
            encoder: Some(EncoderConfig {
                pin: "Counter_1".to_string(),
            }),
            ..ComponentConfig::default()
        };
        // Input mode byte is 0: counter disabled.
        assert!(matches!(
            reg.create(&config, channel()),
            Err(PiError::NotConfigured { .. })
        ));
    }

    #[test]
    fn registry_unknown_model() {
        let reg = ComponentRegistry::new();
        let result = reg.create(&ComponentConfig::default(), channel());
        assert!(matches!(result, Err(PiError::Config(_))));
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn registry_duplicate_panics() {
        let mut reg = ComponentRegistry::with_builtin();
        reg.register(BOARD_MODEL, create_board);
    }
}
