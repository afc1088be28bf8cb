//! Serializable execution-context factory for distributed rule
//! evaluation.
//!
//! When a rule program is shipped to a remote node, the receiving side
//! must regain an execution context with the same read/write view
//! timestamps and the same configured options, without any reference to
//! the sender's memory. [`NexusDescriptor`] is that wire-crossing
//! descriptor; [`NexusDescriptor::new_instance`] reconstructs an
//! [`ExecutionNexus`] from the descriptor plus a locally valid
//! federation context.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strata_error::Result;
use strata_locator::{FederationContext, LocatableResource};
use strata_types::{Namespace, Timestamp};
use tracing::debug;

/// Opaque execution knobs carried across the process boundary.
///
/// The evaluation engine interprets these; this layer only transports
/// them intact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOptions {
    /// Upper bound on parallel evaluation tasks.
    pub max_parallel: u32,
    /// Capacity of the chunked solution buffers.
    pub chunk_capacity: u32,
    /// Optional element filter expression applied to solution buffers.
    pub element_filter: Option<String>,
    /// Bit flags selecting which solution fields are materialized.
    pub solution_flags: u32,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            max_parallel: 8,
            chunk_capacity: 1000,
            element_filter: None,
            solution_flags: 0,
        }
    }
}

/// Immutable, transport-serializable descriptor of an execution context.
///
/// A pure value: reconstruction is a function of the descriptor and a
/// locally supplied context, with no hidden state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NexusDescriptor {
    write_timestamp: Timestamp,
    read_timestamp: Timestamp,
    options: ExecutionOptions,
}

impl NexusDescriptor {
    /// Describe an execution context.
    #[must_use]
    pub fn new(
        write_timestamp: Timestamp,
        read_timestamp: Timestamp,
        options: ExecutionOptions,
    ) -> Self {
        Self {
            write_timestamp,
            read_timestamp,
            options,
        }
    }

    /// The timestamp for the write view of the relations.
    #[must_use]
    pub fn write_timestamp(&self) -> Timestamp {
        self.write_timestamp
    }

    /// The timestamp for the read view of the relations.
    #[must_use]
    pub fn read_timestamp(&self) -> Timestamp {
        self.read_timestamp
    }

    /// The configured execution options.
    #[must_use]
    pub fn options(&self) -> &ExecutionOptions {
        &self.options
    }

    /// Reconstruct an execution context against `context`.
    #[must_use]
    pub fn new_instance(&self, context: Arc<FederationContext>) -> ExecutionNexus {
        debug!(
            write_timestamp = %self.write_timestamp,
            read_timestamp = %self.read_timestamp,
            "reconstructing execution nexus"
        );
        ExecutionNexus {
            descriptor: self.clone(),
            context,
        }
    }
}

/// A reconstructed execution context: the descriptor bound to a local
/// federation context.
pub struct ExecutionNexus {
    descriptor: NexusDescriptor,
    context: Arc<FederationContext>,
}

impl ExecutionNexus {
    /// The descriptor this nexus was reconstructed from.
    #[must_use]
    pub fn descriptor(&self) -> &NexusDescriptor {
        &self.descriptor
    }

    /// The timestamp for the write view.
    #[must_use]
    pub fn write_timestamp(&self) -> Timestamp {
        self.descriptor.write_timestamp
    }

    /// The timestamp for the read view.
    #[must_use]
    pub fn read_timestamp(&self) -> Timestamp {
        self.descriptor.read_timestamp
    }

    /// The configured execution options.
    #[must_use]
    pub fn options(&self) -> &ExecutionOptions {
        &self.descriptor.options
    }

    /// Resolve a relation at the read-view timestamp.
    pub fn resolve_read(
        &self,
        namespace: &Namespace,
    ) -> Result<Option<Arc<dyn LocatableResource>>> {
        self.context
            .locate(namespace, self.descriptor.read_timestamp)
    }

    /// Resolve a relation at the write-view timestamp.
    pub fn resolve_write(
        &self,
        namespace: &Namespace,
    ) -> Result<Option<Arc<dyn LocatableResource>>> {
        self.context
            .locate(namespace, self.descriptor.write_timestamp)
    }
}

impl fmt::Debug for ExecutionNexus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionNexus")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}
