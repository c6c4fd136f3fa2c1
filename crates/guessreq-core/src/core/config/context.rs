use crate::config::Config;
use crate::effects::{Effects, SharedEffects};

pub struct CommandContext {
    config: Config,
    effects: SharedEffects,
}

impl CommandContext {
    pub fn new(config: Config, effects: SharedEffects) -> Self {
        Self { config, effects }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn effects(&self) -> &dyn Effects {
        self.effects.as_ref()
    }
}
