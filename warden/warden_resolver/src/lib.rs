//! # Warden Resolver
//!
//! `warden_resolver` computes the effective permissions and metadata of an
//! entity by walking its group membership graph.
//!
//! Rules:
//!
//! 1. **Permissions** are a set union over the entity and every group it
//!    reaches. Nothing is ever removed; a string meant as a denial is kept
//!    verbatim for the authorization check that consumes the set.
//!
//! 2. **Metadata** is merged by distance. The entity's own values win, then
//!    values from direct groups, then their parents, and so on. Between
//!    groups at the same distance the one visited first wins, and groups are
//!    visited in membership order.
//!
//! 3. **Cycles** abort the whole resolution with a `RecursiveGroupError`
//!    naming the groups on the cycle. The entity keeps its previous view.
//!
//! 4. **Dangling memberships** (a key with no matching group) contribute
//!    nothing.

pub mod resolver;
pub mod source;

pub use resolver::Resolver;
pub use source::GroupSource;
