use thiserror::Error;

macro_rules! structural_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Structural {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Structural {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Errors fall into two groups. Structural errors signal a broken invariant in how a graph or
/// IR was built and are never expected on well-formed input. Lookup errors (missing types or
/// methods) are only produced when a caller explicitly asks for strict resolution; in lenient
/// mode the same conditions surface as empty results.
///
/// Ambiguous virtual call sites are not errors at all: they are recorded by the
/// [`InvocationResolver`](crate::analysis::InvocationResolver) and resolution continues.
///
/// # Error Categories
///
/// ## Invariant Violations
/// - [`Error::Structural`] - Duplicate immediate edge, unknown phi predecessor, duplicate declarations
/// - [`Error::UnsupportedOperation`] - Operation not defined for a graph specialization or edge kind
/// - [`Error::GraphError`] - Operation referenced a vertex the graph does not contain
///
/// ## Resolution Errors
/// - [`Error::TypeNotFound`] - Type is unknown to the class source
/// - [`Error::MethodNotFound`] - No declaration matched a strict lookup
/// - [`Error::InvalidDescriptor`] - A field or method descriptor could not be parsed
///
/// # Examples
///
/// ```rust
/// use flowscope::Error;
///
/// fn describe(err: &Error) -> &'static str {
///     match err {
///         Error::Structural { .. } => "broken invariant",
///         Error::TypeNotFound(_) | Error::MethodNotFound { .. } => "unresolved",
///         _ => "other",
///     }
/// }
///
/// assert_eq!(describe(&Error::TypeNotFound("a/B".into())), "unresolved");
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// A structural invariant of a graph or the IR was violated.
    ///
    /// This covers a second immediate edge on a block, mutating a phi argument for a
    /// predecessor the phi does not know, a type with no `extends` edge, and duplicate
    /// declarations where a unique match is assumed. The error includes the source
    /// location where the violation was detected.
    ///
    /// # Fields
    ///
    /// * `message` - Description of the violated invariant
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Structural - {file}:{line}: {message}")]
    Structural {
        /// The message to be printed for the Structural error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// The requested operation is not defined for this graph or edge.
    ///
    /// Raised by splice operations on the type hierarchy and by inverting
    /// exception edges. The payload names the operation.
    #[error("Operation not supported - {0}")]
    UnsupportedOperation(&'static str),

    /// A graph operation referenced a vertex that is not part of the graph.
    #[error("{0}")]
    GraphError(String),

    /// Failed to find a type in the class source.
    #[error("Failed to find type - {0}")]
    TypeNotFound(String),

    /// A strict method lookup found no matching declaration.
    #[error("Failed to find method - {owner}.{name}{desc}")]
    MethodNotFound {
        /// Owner type of the lookup
        owner: String,
        /// Method name
        name: String,
        /// Method descriptor
        desc: String,
    },

    /// A descriptor string is not well formed.
    #[error("Invalid descriptor - {0}")]
    InvalidDescriptor(String),
}
