//! Protocol constants and tuning parameters.

use std::time::Duration;

// ============================================================================
// Identifier space
// ============================================================================

/// Identifier width in bits.
pub const KEY_BITS: usize = 160;

/// Identifier width in octets.
pub const KEY_BYTES: usize = KEY_BITS / 8;

// ============================================================================
// Routing
// ============================================================================

/// Bucket capacity (the k value in Kademlia).
pub const K: usize = 20;

/// Number of routing buckets, one per distance bit.
pub const NUM_BUCKETS: usize = 160;

// ============================================================================
// Calls and lookups
// ============================================================================

/// Lookup parallelism bound (outstanding find-node calls at once).
pub const ALPHA: usize = 3;

/// Deadline for a single request/response exchange.
pub const CALL_TIMEOUT: Duration = Duration::from_secs(2);

/// Random octets in a correlation id.
pub const CALL_ID_BYTES: usize = 6;

/// Upper bound on lookup rounds; convergence normally exits far earlier.
pub const LOOKUP_MAX_ROUNDS: usize = 32;

// ============================================================================
// Mailboxes
// ============================================================================

/// Inbound mailbox depth; the fabric drops messages past this.
pub const INBOX_CAPACITY: usize = 1024;
