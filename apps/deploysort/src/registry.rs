//! # Stage Registry
//!
//! The caller side of the ordering engine. Holds the stages read from a
//! manifest and hands them to the sequencer, pre-sorted by their relative
//! order hint when the manifest asks for it.
//!
//! The engine ignores the hint. Pre-sorting only changes which of several
//! independent stages comes first, since ties resolve by input order.

use crate::manifest::{Manifest, ManifestSettings};
use deploysort_core::{SequencePlan, Sequencer, SequencerError, Stage};

/// Stages plus the settings they were declared with.
#[derive(Debug, Clone, Default)]
pub struct StageRegistry {
    stages: Vec<Stage>,
    settings: ManifestSettings,
}

impl StageRegistry {
    /// Create a registry from stages and settings.
    #[must_use]
    pub fn new(stages: Vec<Stage>, settings: ManifestSettings) -> Self {
        Self { stages, settings }
    }

    /// Create a registry from a parsed manifest.
    #[must_use]
    pub fn from_manifest(manifest: Manifest) -> Self {
        Self::new(manifest.stages, manifest.sequencer)
    }

    /// Stages in the order they will be handed to the sequencer.
    ///
    /// With `order_by_hint` set this is a stable sort by `relative_order`,
    /// otherwise declaration order.
    #[must_use]
    pub fn stages(&self) -> Vec<&Stage> {
        self.ordered().into_iter().map(|(_, stage)| stage).collect()
    }

    /// Stages in sequencing order, paired with their declaration index.
    fn ordered(&self) -> Vec<(usize, &Stage)> {
        let mut stages: Vec<(usize, &Stage)> = self.stages.iter().enumerate().collect();
        if self.settings.order_by_hint {
            stages.sort_by_key(|(_, s)| s.relative_order);
        }
        stages
    }

    /// A sequencer configured from the manifest settings.
    #[must_use]
    pub fn sequencer(&self) -> Sequencer {
        Sequencer::with_config(self.settings.sequencer_config())
    }

    /// Order the registered stages.
    pub fn sequence(&self) -> Result<Vec<&Stage>, SequencerError> {
        let stages = self.stages();
        let order = self.sequencer().sequence(&stages)?;
        Ok(order.into_iter().copied().collect())
    }

    /// Order the registered stages and describe the result.
    ///
    /// Indices in the plan are declaration positions in the manifest, also
    /// when the stages were pre-sorted by hint.
    pub fn plan(&self) -> Result<SequencePlan, SequencerError> {
        let (declared, stages): (Vec<usize>, Vec<&Stage>) = self.ordered().into_iter().unzip();
        let mut plan = self.sequencer().plan(&stages)?;
        plan.reindex(|i| declared.get(i).copied().unwrap_or(i));
        Ok(plan)
    }

    /// The manifest settings.
    #[must_use]
    pub fn settings(&self) -> ManifestSettings {
        self.settings
    }

    /// Number of registered stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether no stage is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}
