//! Entry points of a call graph trace.

use std::{fmt, sync::OnceLock};

use crate::{
    config::AnalysisConfig,
    program::{ClassSource, MethodFlags, MethodId},
};

/// Name of program entry methods.
pub const MAIN_NAME: &str = "main";
/// Descriptor of program entry methods.
pub const MAIN_DESC: &str = "([Ljava/lang/String;)V";

/// The methods considered externally reachable.
///
/// Entry points are the caller-supplied methods plus, discovered from the application
/// classes of the borrowed [`ClassSource`], every `public static main(String[])` method
/// and, if enabled, every static initializer. Discovery runs once and is cached; adding a
/// method resets the cache.
///
/// # Examples
///
/// ```rust
/// use flowscope::analysis::callgraph::EntryPoints;
/// use flowscope::config::AnalysisConfig;
/// use flowscope::program::{ApplicationClassSource, ClassNode, MethodFlags, MethodNode};
///
/// let mut source = ApplicationClassSource::new();
/// source.add_class(ClassNode::new("java/lang/Object", None).library())?;
/// let app = source.add_class(ClassNode::new("app/Main", Some("java/lang/Object")))?;
/// let main = source.add_method(
///     app,
///     MethodNode::new("main", "([Ljava/lang/String;)V", MethodFlags::PUBLIC | MethodFlags::STATIC),
/// )?;
/// let run = source.add_method(app, MethodNode::new("run", "()V", MethodFlags::PUBLIC))?;
///
/// let mut entries = EntryPoints::new(&source, &AnalysisConfig::default());
/// entries.add(run);
/// assert_eq!(entries.methods(), vec![run, main]);
/// # Ok::<(), flowscope::Error>(())
/// ```
pub struct EntryPoints<'s, S> {
    source: &'s S,
    extra: Vec<MethodId>,
    include_static_initializers: bool,
    discovered: OnceLock<Vec<MethodId>>,
}

impl<'s, S: ClassSource> EntryPoints<'s, S> {
    /// Creates a set of entry points over `source` with no caller-supplied methods.
    #[must_use]
    pub fn new(source: &'s S, config: &AnalysisConfig) -> Self {
        Self {
            source,
            extra: Vec::new(),
            include_static_initializers: config.include_static_initializers,
            discovered: OnceLock::new(),
        }
    }

    /// Adds a caller-supplied entry point.
    pub fn add(&mut self, method: MethodId) {
        if !self.extra.contains(&method) {
            self.extra.push(method);
        }
        self.discovered = OnceLock::new();
    }

    /// Returns the caller-supplied entry points.
    #[must_use]
    pub fn extra(&self) -> &[MethodId] {
        &self.extra
    }

    /// Returns every entry point: caller-supplied ones first, then discovered ones, without
    /// duplicates.
    pub fn methods(&self) -> Vec<MethodId> {
        let discovered = self.discovered.get_or_init(|| self.discover());
        let mut methods = self.extra.clone();
        for &method in discovered {
            if !methods.contains(&method) {
                methods.push(method);
            }
        }
        methods
    }

    /// Returns the source entry points are discovered in.
    #[must_use]
    pub const fn source(&self) -> &'s S {
        self.source
    }

    fn discover(&self) -> Vec<MethodId> {
        let source = self.source;
        let mut found = Vec::new();
        for class in source.classes() {
            if source.is_library(class) {
                continue;
            }
            for &id in source.methods_of(class) {
                let Some(method) = source.method(id) else {
                    continue;
                };
                let is_main = method.matches(MAIN_NAME, MAIN_DESC)
                    && method
                        .access
                        .contains(MethodFlags::PUBLIC | MethodFlags::STATIC);
                let is_initializer =
                    self.include_static_initializers && method.is_static_initializer();
                if is_main || is_initializer {
                    found.push(id);
                }
            }
        }
        found
    }
}

impl<S> fmt::Debug for EntryPoints<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryPoints")
            .field("extra", &self.extra)
            .field("include_static_initializers", &self.include_static_initializers)
            .field("discovered", &self.discovered.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::{ApplicationClassSource, ClassNode, MethodNode};

    fn source() -> (ApplicationClassSource, [MethodId; 4]) {
        let mut source = ApplicationClassSource::new();
        let object = source
            .add_class(ClassNode::new("java/lang/Object", None).library())
            .unwrap();
        let app = source
            .add_class(ClassNode::new("app/Main", Some("java/lang/Object")))
            .unwrap();
        let statik = MethodFlags::PUBLIC | MethodFlags::STATIC;
        let main = source
            .add_method(app, MethodNode::new(MAIN_NAME, MAIN_DESC, statik))
            .unwrap();
        let clinit = source
            .add_method(app, MethodNode::new("<clinit>", "()V", MethodFlags::STATIC))
            .unwrap();
        let instance_main = source
            .add_method(app, MethodNode::new(MAIN_NAME, "()V", statik))
            .unwrap();
        let library_clinit = source
            .add_method(object, MethodNode::new("<clinit>", "()V", MethodFlags::STATIC))
            .unwrap();
        (source, [main, clinit, instance_main, library_clinit])
    }

    #[test]
    fn test_discovery() {
        let (source, [main, clinit, _, _]) = source();
        let entries = EntryPoints::new(&source, &AnalysisConfig::default());
        assert_eq!(entries.methods(), vec![main, clinit]);

        let without = AnalysisConfig {
            include_static_initializers: false,
            ..AnalysisConfig::default()
        };
        assert_eq!(EntryPoints::new(&source, &without).methods(), vec![main]);
    }

    #[test]
    fn test_add_resets_cache() {
        let (source, [main, clinit, other, _]) = source();
        let mut entries = EntryPoints::new(&source, &AnalysisConfig::default());
        assert_eq!(entries.methods().len(), 2);

        entries.add(other);
        entries.add(main);
        assert_eq!(entries.extra(), &[other, main]);
        assert_eq!(entries.methods(), vec![other, main, clinit]);
    }

    #[test]
    fn test_discovery_follows_own_source() {
        let (source, [main, clinit, _, _]) = source();
        let mut other = ApplicationClassSource::new();
        other
            .add_class(ClassNode::new("java/lang/Object", None).library())
            .unwrap();
        let tool = other
            .add_class(ClassNode::new("tool/Cli", Some("java/lang/Object")))
            .unwrap();
        let tool_main = other
            .add_method(
                tool,
                MethodNode::new(MAIN_NAME, MAIN_DESC, MethodFlags::PUBLIC | MethodFlags::STATIC),
            )
            .unwrap();

        let config = AnalysisConfig::default();
        let first = EntryPoints::new(&source, &config);
        let second = EntryPoints::new(&other, &config);
        assert_eq!(first.methods(), vec![main, clinit]);
        assert_eq!(second.methods(), vec![tool_main]);
        assert!(std::ptr::eq(second.source(), &other));
    }
}
