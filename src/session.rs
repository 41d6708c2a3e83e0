//! Generation sessions.
//!
//! A [`Session`] is the explicit context threaded through every dispatch: it
//! owns the random source, the decision log, the constraint authority and the
//! strategy chain, and borrows the introspection provider. Create one per
//! generation run and drop it when done; only one request runs at a time.

use crate::decisions::{Choice, Config, Constraint, ConstraintAuthority, DecisionLog, Target};
use crate::introspect::Introspector;
use crate::providers::{PrimitiveProvider, ProviderConfig, RandomProvider, ReplayProvider};
use crate::traversal::{History, InstanceDispatcher, StrategyChain};
use crate::types::TypeRef;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Tunables for a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Seed of the session's random source
    pub seed: u64,

    /// Inclusive bounds on array and list lengths
    pub container_length: (usize, usize),

    /// Inclusive bounds on the bit length of arbitrary-precision integers
    pub big_int_bits: (u32, u32),

    /// Ranges for the default value generator
    pub provider: ProviderConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            container_length: (0, 10),
            big_int_bits: (2, 32),
            provider: ProviderConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[derive(Debug)]
pub struct Session {
    authority: Box<dyn ConstraintAuthority>,
    introspector: Arc<dyn Introspector>,
    provider: Box<dyn PrimitiveProvider>,
    strategies: Arc<StrategyChain>,
    decisions: DecisionLog,
    transcript: Vec<String>,
    settings: SessionConfig,
}

impl Session {
    pub fn builder<I: Introspector + 'static>(introspector: I) -> SessionBuilder {
        SessionBuilder::new(Arc::new(introspector))
    }

    /// Root dispatcher with an empty path.
    pub fn dispatcher(&mut self) -> InstanceDispatcher<'_> {
        InstanceDispatcher::new(self, History::new())
    }

    /// `try_get_instance` on a fresh root dispatcher.
    pub fn generate(&mut self, ty: &TypeRef) -> Option<Value> {
        log::debug!("generating {:?}", ty);
        self.dispatcher().try_get_instance(ty)
    }

    /// `get_instance` on a fresh root dispatcher.
    pub fn generate_required(&mut self, ty: &TypeRef) -> Option<Value> {
        log::debug!("generating required {:?}", ty);
        self.dispatcher().get_instance(ty)
    }

    pub fn decisions(&self) -> &DecisionLog {
        &self.decisions
    }

    pub fn into_decisions(self) -> DecisionLog {
        self.decisions
    }

    /// Indented explanation of every dispatch, decline and cycle.
    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }

    pub fn settings(&self) -> &SessionConfig {
        &self.settings
    }

    pub(crate) fn introspector(&self) -> Arc<dyn Introspector> {
        Arc::clone(&self.introspector)
    }

    pub(crate) fn provider_mut(&mut self) -> &mut dyn PrimitiveProvider {
        self.provider.as_mut()
    }

    pub(crate) fn strategies(&self) -> Arc<StrategyChain> {
        Arc::clone(&self.strategies)
    }

    pub(crate) fn load_constraint(&self, target: &Target) -> Constraint {
        match self.authority.find_constraint_for(target) {
            Some(constraint) => constraint,
            None => self.authority.make_constraint(target),
        }
    }

    pub(crate) fn record(&mut self, choice: Choice) {
        self.decisions.push(choice);
    }

    pub(crate) fn note(&mut self, depth: usize, msg: &str) {
        let line = format!("{}{}", "    ".repeat(depth), msg);
        log::debug!("{}", line);
        self.transcript.push(line);
    }
}

#[derive(Debug)]
pub struct SessionBuilder {
    introspector: Arc<dyn Introspector>,
    config: Config,
    authority: Option<Box<dyn ConstraintAuthority>>,
    provider: Option<Box<dyn PrimitiveProvider>>,
    replay: Option<DecisionLog>,
    settings: SessionConfig,
}

impl SessionBuilder {
    pub fn new(introspector: Arc<dyn Introspector>) -> Self {
        SessionBuilder {
            introspector,
            config: Config::new(),
            authority: None,
            provider: None,
            replay: None,
            settings: SessionConfig::default(),
        }
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Use a custom constraint authority instead of a [`Config`].
    pub fn authority(mut self, authority: Box<dyn ConstraintAuthority>) -> Self {
        self.authority = Some(authority);
        self
    }

    pub fn settings(mut self, settings: SessionConfig) -> Self {
        self.settings = settings;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.settings.seed = seed;
        self
    }

    pub fn provider(mut self, provider: Box<dyn PrimitiveProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Replay a prior log: its seed, with its terminal values fed back.
    pub fn replay(mut self, log: DecisionLog) -> Self {
        self.replay = Some(log);
        self
    }

    pub fn build(self) -> Session {
        let mut settings = self.settings;
        let provider: Box<dyn PrimitiveProvider> = match (self.provider, &self.replay) {
            (Some(provider), _) => provider,
            (None, Some(log)) => {
                settings.seed = log.seed();
                Box::new(ReplayProvider::seeded(log, settings.provider.clone()))
            }
            (None, None) => Box::new(RandomProvider::with_config(settings.seed, settings.provider.clone())),
        };

        let (authority, fingerprint): (Box<dyn ConstraintAuthority>, _) = match self.authority {
            Some(authority) => (authority, None),
            None => {
                let fingerprint = self.config.fingerprint();
                (Box::new(self.config), Some(fingerprint))
            }
        };
        log::info!("starting session with seed {}", settings.seed);

        Session {
            authority,
            introspector: self.introspector,
            provider,
            strategies: Arc::new(StrategyChain::standard()),
            decisions: DecisionLog::new(settings.seed, fingerprint),
            transcript: Vec::new(),
            settings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspect::Registry;

    #[test]
    fn test_settings_defaults_fill_missing_json_fields() {
        let settings = SessionConfig::from_json(r#"{"seed": 9}"#).unwrap();
        assert_eq!(settings.seed, 9);
        assert_eq!(settings.container_length, (0, 10));
        assert_eq!(settings.big_int_bits, (2, 32));
    }

    #[test]
    fn test_log_carries_seed_and_fingerprint() {
        let config = Config::new();
        let fingerprint = config.fingerprint();
        let session = Session::builder(Registry::new()).config(config).seed(17).build();
        assert_eq!(session.decisions().seed(), 17);
        assert_eq!(session.decisions().config_fingerprint(), Some(fingerprint.as_str()));
    }

    #[test]
    fn test_transcript_is_indented_by_depth() {
        let mut session = Session::builder(Registry::new()).build();
        session.generate(&TypeRef::int());
        assert_eq!(session.transcript()[0], "    current path: i32");
    }
}
