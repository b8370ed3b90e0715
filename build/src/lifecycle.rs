//! Lifecycle trigger dispatch.
//!
//! A declarative resource framework drives the build cycle through four
//! standard triggers. They all funnel into the same explicit cycle instead
//! of four independent callbacks, so the existence check lives in exactly
//! one place. The framework persists the returned reference as the
//! resource's durable identifier between invocations; this layer holds no
//! cross-cycle state.

use bakery_core::error::Result;

use crate::cycle::{BuildSpec, Orchestrator};

/// Lifecycle trigger fired by the invoking framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Create,
    Refresh,
    Update,
    Destroy,
}

impl Orchestrator {
    /// Run the cycle for a lifecycle trigger.
    ///
    /// Returns the reference for the framework to persist, or `None` when
    /// the trigger leaves no managed image behind. Destroy is a deliberate
    /// no-op: built images stay on the engine at teardown.
    pub async fn handle(&self, trigger: Trigger, spec: &BuildSpec) -> Result<Option<String>> {
        match trigger {
            Trigger::Destroy => Ok(None),
            Trigger::Create | Trigger::Refresh | Trigger::Update => {
                let outcome = self.converge(spec).await?;
                Ok(Some(outcome.reference().to_string()))
            }
        }
    }
}
