//! Assembly identity system.
//!
//! This module models how a compiled assembly, and every reference to another assembly it
//! declares, is named: a simple name, a four-part version, an optional culture and an optional
//! public key token. The resolution pass compares a requested identity against the identity
//! of the file it actually found, and keys its bookkeeping on the identity's full name.
//!
//! # ECMA-335 References
//!
//! - **Section II.6.1**: Overview of assemblies - defines assembly identity components
//! - **Section II.6.2.1.3**: Public key and token - strong name identity format
//! - **Section II.22.2**: Assembly table - assembly metadata structure
//! - **Section II.22.5**: AssemblyRef table - assembly reference structure
//!
//! # Examples
//!
//! ```rust
//! use dotdeps::metadata::identity::{AssemblyIdentity, PublicKeyToken};
//!
//! let mscorlib = AssemblyIdentity::parse(
//!     "mscorlib, Version=4.0.0.0, Culture=neutral, PublicKeyToken=b77a5c561934e089"
//! )?;
//! let ecma_key = [0u8, 0, 0, 0, 0, 0, 0, 0, 4, 0, 0, 0, 0, 0, 0, 0];
//!
//! assert_eq!(
//!     mscorlib.public_key_token,
//!     Some(PublicKeyToken::from_public_key(&ecma_key))
//! );
//! # Ok::<(), dotdeps::Error>(())
//! ```

pub use assembly::{AssemblyIdentity, AssemblyVersion};
pub use cryptographic::PublicKeyToken;

mod assembly;
mod cryptographic;
