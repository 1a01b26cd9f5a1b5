//! Integration tests for unload-redshift.
//!
//! Collaborators are replaced by recording fakes, so no AWS account or
//! Redshift cluster is needed.

mod credentials;
mod fakes;
mod task;
