//! Source resolution: an ordered chain of tier strategies.
//!
//! Tiers run in the fixed order Loose, Archive, Decompile and the first one
//! that produces text wins. A name no tier can resolve becomes a [`Miss`]
//! carrying every tier's reason, including tiers that were disabled.

pub mod decompiler;
mod strategies;

pub use decompiler::{Decompiler, DECOMPILER_CANDIDATES};
pub use strategies::{ArchiveStrategy, DecompileStrategy, LooseStrategy};

use crate::services::archive::ArchiveIndex;
use crate::services::scanner::LooseIndex;
use crate::types::{Miss, ResolutionOutcome, ScriptName, SourceRecord, Tier, TierAttempt};
use std::sync::Arc;

/// One resolution tier.
///
/// `Err` carries the reason this tier could not produce source; it is never
/// fatal and the next tier is tried.
pub trait ResolveStrategy: Send + Sync {
    fn tier(&self) -> Tier;
    fn resolve(&self, name: &ScriptName) -> Result<SourceRecord, String>;
}

#[derive(Default)]
pub struct SourceResolver {
    strategies: Vec<Box<dyn ResolveStrategy>>,
    disabled: Vec<Tier>,
}

impl SourceResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver for one run. Passing `None` for a tier records it as disabled.
    pub fn for_run(
        loose: Arc<LooseIndex>,
        archives: Option<Arc<ArchiveIndex>>,
        decompiler: Option<Arc<Decompiler>>,
    ) -> Self {
        let mut resolver = Self::new().with_strategy(LooseStrategy::new(loose.clone()));

        resolver = match &archives {
            Some(index) => resolver.with_strategy(ArchiveStrategy::new(index.clone())),
            None => resolver.with_disabled(Tier::Archive),
        };

        match decompiler {
            Some(decompiler) => {
                resolver.with_strategy(DecompileStrategy::new(decompiler, loose, archives))
            }
            None => resolver.with_disabled(Tier::Decompile),
        }
    }

    /// Add a tier. Strategies are kept sorted by tier so the order is fixed
    /// no matter how they were registered.
    pub fn with_strategy(mut self, strategy: impl ResolveStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self.strategies.sort_by_key(|s| s.tier());
        self
    }

    pub fn with_disabled(mut self, tier: Tier) -> Self {
        if !self.disabled.contains(&tier) {
            self.disabled.push(tier);
        }
        self
    }

    pub fn tiers(&self) -> Vec<Tier> {
        self.strategies.iter().map(|s| s.tier()).collect()
    }

    pub fn resolve(&self, name: &ScriptName) -> ResolutionOutcome {
        let mut attempts: Vec<TierAttempt> = self
            .disabled
            .iter()
            .map(|tier| TierAttempt {
                tier: *tier,
                reason: "disabled".to_string(),
            })
            .collect();

        for strategy in &self.strategies {
            match strategy.resolve(name) {
                Ok(record) => {
                    log::debug!("Resolved {name} from {}", record.provenance);
                    return ResolutionOutcome::Resolved(record);
                }
                Err(reason) => {
                    log::debug!("{} tier missed {name}: {reason}", strategy.tier());
                    attempts.push(TierAttempt {
                        tier: strategy.tier(),
                        reason,
                    });
                }
            }
        }

        attempts.sort_by_key(|a| a.tier);
        ResolutionOutcome::Miss(Miss {
            name: name.clone(),
            attempts,
        })
    }
}

#[cfg(test)]
#[path = "tests/resolver_tests.rs"]
mod tests;
