// ABOUTME: Diagnostics accumulator for non-fatal warnings during lifecycle operations.
// ABOUTME: Collects problems that do not fail an operation but should be shown to users.

/// Collects non-fatal warnings during lifecycle operations.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning.message);
        self.warnings.push(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Check if any warnings were collected.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// A non-fatal warning.
#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    /// A mirror is running but cluster nodes were not pointed at it.
    pub fn node_injection(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::NodeInjection,
            message: message.into(),
        }
    }
}

/// Categories of warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// Node configuration fragment could not be written.
    NodeInjection,
}
