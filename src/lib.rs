// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Web App Deploy Sample
//!
//! Provisions an Azure web app, deploys a package to it, and tears everything
//! down again, using the Azure Resource Manager REST API.
//!
//! ## Overview
//!
//! A run goes through these steps:
//!
//! 1. Authenticate with a client-secret credential read from the environment
//! 2. Create a resource group and a web app with its service plan
//! 3. Open the publishing-profile stream of the web app
//! 4. Launch a detached task that deploys the package after a short delay and
//!    probes the app at fixed offsets
//! 5. Read the stream until it ends or a wall-clock bound elapses
//! 6. Delete the resource group, whatever happened before
//!
//! ## Modules
//!
//! - [`azure`]: Authentication, Resource Manager client and provisioning
//! - [`cleanup`]: Scoped ownership of the resource group
//! - [`config`]: Settings parsing, validation and name generation
//! - [`sample`]: The run itself
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```yaml
//! # webapp-sample.yaml
//! region: westus
//! log_stream_timeout_secs: 120
//! deploy_delay_secs: 10
//! probe_offsets_secs: [5, 15, 25, 35]
//! probe_path: /coffeeshop/
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod azure;
pub mod cleanup;
pub mod cli;
pub mod config;
pub mod error;
pub mod sample;

// ============================================================================
// Re-exports
// ============================================================================

pub use azure::{ArmClient, HttpHelper, ResourceProvisioner, WebAppManager};
pub use cleanup::{CleanupOutcome, ResourceGroupGuard};
pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{ConfigParser, ConfigValidator, SampleSettings};
pub use error::{Result, SampleError};
pub use sample::{RunReport, WebAppSample};
