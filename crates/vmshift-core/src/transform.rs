//! Ordered, fail-fast configuration transformation pipeline.
//!
//! A [`TransformationManager`] binds one mutable configuration and one
//! arguments object, holds an ordered list of [`Transformation`]s and runs
//! the enabled ones in registration order. The first failure aborts the run
//! and is reported with the failing transformation's name. Earlier mutations
//! are not rolled back; callers that need atomicity clone the configuration
//! first.

use crate::CoreError;
use serde::Serialize;
use std::fmt;
use tracing::{debug, info};
use vmshift_schema::HostCapabilities;

type GenericFn<'h, C, A> = Box<dyn Fn(&mut C, &A) -> Result<(), CoreError> + 'h>;
type SpecificFn<'h, C, A> =
    Box<dyn Fn(&dyn HostCapabilities, &mut C, &A) -> Result<(), CoreError> + 'h>;

/// What a transformation does when applied.
pub(crate) enum Behavior<'h, C, A> {
    /// Depends only on the configuration and arguments.
    Generic(GenericFn<'h, C, A>),
    /// Also reads host state through a borrowed capability handle.
    Specific {
        handle: &'h dyn HostCapabilities,
        run: SpecificFn<'h, C, A>,
    },
}

/// A single named mutation step.
///
/// Names are diagnostic and need not be unique.
pub struct Transformation<'h, C, A> {
    name: String,
    enabled: bool,
    behavior: Behavior<'h, C, A>,
}

impl<'h, C, A> Transformation<'h, C, A> {
    pub fn generic(
        name: &str,
        run: impl Fn(&mut C, &A) -> Result<(), CoreError> + 'h,
    ) -> Self {
        Self {
            name: name.to_owned(),
            enabled: true,
            behavior: Behavior::Generic(Box::new(run)),
        }
    }

    pub fn specific(
        name: &str,
        handle: &'h dyn HostCapabilities,
        run: impl Fn(&dyn HostCapabilities, &mut C, &A) -> Result<(), CoreError> + 'h,
    ) -> Self {
        Self {
            name: name.to_owned(),
            enabled: true,
            behavior: Behavior::Specific {
                handle,
                run: Box::new(run),
            },
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_specific(&self) -> bool {
        matches!(self.behavior, Behavior::Specific { .. })
    }

    fn run(&self, config: &mut C, args: &A) -> Result<(), CoreError> {
        match &self.behavior {
            Behavior::Generic(run) => run(config, args),
            Behavior::Specific { handle, run } => run(*handle, config, args),
        }
    }
}

impl<C, A> fmt::Debug for Transformation<'_, C, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transformation")
            .field("name", &self.name)
            .field("enabled", &self.enabled)
            .field("specific", &self.is_specific())
            .finish_non_exhaustive()
    }
}

/// One row of [`TransformationManager::summary`].
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TransformationSummary {
    pub ordinal: usize,
    pub active: bool,
    pub name: String,
}

impl fmt::Display for TransformationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.active { 'x' } else { ' ' };
        write!(f, "{:>3}. [{marker}] {}", self.ordinal, self.name)
    }
}

/// Applies registered transformations, in order, to one configuration.
pub struct TransformationManager<'a, 'h, C, A> {
    transformations: Vec<Transformation<'h, C, A>>,
    config: &'a mut C,
    args: &'a A,
}

impl<'a, 'h, C, A> TransformationManager<'a, 'h, C, A> {
    pub fn new(config: &'a mut C, args: &'a A) -> Self {
        Self {
            transformations: Vec::new(),
            config,
            args,
        }
    }

    pub fn register(&mut self, transformation: Transformation<'h, C, A>) {
        self.register_with(transformation, true);
    }

    pub fn register_with(&mut self, mut transformation: Transformation<'h, C, A>, enabled: bool) {
        transformation.set_enabled(enabled);
        debug!(
            "registered transformation '{}' ({})",
            transformation.name(),
            if enabled { "enabled" } else { "disabled" }
        );
        self.transformations.push(transformation);
    }

    /// Enable or disable every transformation called `name`. Returns how many matched.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> usize {
        let mut matched = 0;
        for t in self.transformations.iter_mut().filter(|t| t.name == name) {
            t.set_enabled(enabled);
            matched += 1;
        }
        matched
    }

    pub fn transformations(&self) -> &[Transformation<'h, C, A>] {
        &self.transformations
    }

    pub fn config(&self) -> &C {
        self.config
    }

    pub fn args(&self) -> &A {
        self.args
    }

    /// Run every enabled transformation in registration order.
    ///
    /// Stops at the first failure and wraps it with the transformation's name.
    pub fn apply(&mut self) -> Result<(), CoreError> {
        let mut applied = 0usize;
        for t in &self.transformations {
            if !t.enabled {
                continue;
            }
            debug!("applying transformation '{}'", t.name);
            t.run(self.config, self.args)
                .map_err(|e| CoreError::TransformationFailed {
                    name: t.name.clone(),
                    source: Box::new(e),
                })?;
            applied += 1;
        }
        info!("applied {applied} transformations");
        Ok(())
    }

    pub fn summary(&self) -> Vec<TransformationSummary> {
        self.transformations
            .iter()
            .enumerate()
            .map(|(i, t)| TransformationSummary {
                ordinal: i + 1,
                active: t.enabled,
                name: t.name.clone(),
            })
            .collect()
    }
}
