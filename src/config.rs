//! Configuration for hierarchy materialization, call resolution and call tracing.

/// Name of the root type of the default type universe.
pub const DEFAULT_ROOT_TYPE: &str = "java/lang/Object";

/// Configuration for the analysis session.
///
/// Controls how lookups that cannot be satisfied are reported and which methods the
/// call tracer descends into.
///
/// # Examples
///
/// ```rust
/// use flowscope::config::AnalysisConfig;
///
/// let config = AnalysisConfig {
///     trace_libraries: true,
///     ..AnalysisConfig::strict()
/// };
/// assert!(config.strict);
/// assert_eq!(config.root_type, "java/lang/Object");
/// ```
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Internal name of the hierarchy root (default: `java/lang/Object`).
    pub root_type: String,

    /// Promote unresolvable types and methods to errors (default: false).
    ///
    /// In lenient mode a missing type or method yields an empty resolution and classes
    /// whose supertypes are unknown are left out of the hierarchy.
    pub strict: bool,

    /// Keep a record of ambiguous virtual call levels (default: true).
    pub record_ambiguities: bool,

    /// Record calls into library methods in the call graph (default: true).
    ///
    /// Library bodies are never scanned either way.
    pub trace_libraries: bool,

    /// Treat static initializers of application classes as entry points (default: true).
    pub include_static_initializers: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            root_type: DEFAULT_ROOT_TYPE.to_string(),
            strict: false,
            record_ambiguities: true,
            trace_libraries: true,
            include_static_initializers: true,
        }
    }
}

impl AnalysisConfig {
    /// Creates the default, lenient configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration that fails on every unresolvable lookup.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }

    /// Creates a configuration that tolerates incomplete type universes and keeps no
    /// ambiguity records.
    #[must_use]
    pub fn lenient() -> Self {
        Self {
            strict: false,
            record_ambiguities: false,
            ..Self::default()
        }
    }

    /// Replaces the root type.
    #[must_use]
    pub fn with_root_type(mut self, root_type: impl Into<String>) -> Self {
        self.root_type = root_type.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let default = AnalysisConfig::new();
        assert!(!default.strict);
        assert!(default.record_ambiguities);

        assert!(AnalysisConfig::strict().strict);
        assert!(!AnalysisConfig::lenient().record_ambiguities);
        assert_eq!(
            AnalysisConfig::lenient().with_root_type("System/Object").root_type,
            "System/Object"
        );
    }
}
