use std::{path::PathBuf, time::Duration};

use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Two very different classes of failure share this enum. Reading an assembly can fail for
/// many reasons ([`Error::Malformed`], [`Error::OutOfBounds`], [`Error::FileError`], ...), but
/// during a resolution pass those failures are always caught per identity and turned into a
/// [`crate::resolution::ResolutionFailure`] record; the walk keeps going. Only
/// [`Error::Configuration`] is allowed to abort a pass.
///
/// # Error Categories
///
/// ## File Parsing Errors
/// - [`Error::Malformed`] - Corrupted or invalid file structure
/// - [`Error::OutOfBounds`] - Attempted to read beyond file boundaries
/// - [`Error::NotSupported`] - File is not a managed assembly
/// - [`Error::Empty`] - Empty input provided
///
/// ## I/O and External Errors
/// - [`Error::FileError`] - Filesystem I/O errors
/// - [`Error::GoblinErr`] - PE parsing errors from goblin crate
/// - [`Error::Timeout`] - A metadata read did not finish in time
///
/// ## Resolution Errors
/// - [`Error::Configuration`] - Unusable framework description or resolver setup
///
/// # Examples
///
/// ```rust,no_run
/// use dotdeps::{Error, metadata::{AssemblyMetadataReader, CilMetadataReader}};
/// use std::path::Path;
///
/// match CilMetadataReader::new().read(Path::new("Library.dll")) {
///     Ok(metadata) => println!("{}", metadata.identity),
///     Err(Error::NotSupported) => eprintln!("not a managed assembly"),
///     Err(Error::FileError(io_err)) => eprintln!("I/O error: {}", io_err),
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The file is damaged and could not be parsed.
    ///
    /// The error includes the source location where the malformation was detected for
    /// debugging purposes.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while parsing the file.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// This file type is not supported.
    ///
    /// Returned for PE images without a CLI header, i.e. native binaries.
    #[error("This file type is not supported")]
    NotSupported,

    /// Provided input was empty.
    #[error("Provided input was empty")]
    Empty,

    /// File I/O error.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Error from the goblin crate during PE parsing.
    #[error("{0}")]
    GoblinErr(#[from] goblin::error::Error),

    /// The resolver was set up with something it cannot work with.
    ///
    /// This is the only fatal error of a resolution pass, raised for a missing framework
    /// description or an unsupported framework kind. The caller must not go on to invoke the
    /// reflection tooling.
    #[error("{0}")]
    Configuration(String),

    /// Reading an assembly's metadata took longer than the configured bound.
    #[error("Reading metadata of '{}' timed out after {:?}", path.display(), timeout)]
    Timeout {
        /// The file that was being read
        path: PathBuf,
        /// The bound that was exceeded
        timeout: Duration,
    },

    /// Generic error for miscellaneous failures.
    #[error("{0}")]
    Error(String),
}
