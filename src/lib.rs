//! Singly-linked forward lists over external, user-controlled storage.
//!
//! # Design Philosophy
//!
//! Unlike `std::collections`, which allocate per node and address nodes
//! with pointers, this crate separates the *chain* from the *arena*:
//!
//! - **External storage**: nodes live in a storage you create and pass
//!   to every operation. Lists hold only a head key.
//! - **Stable keys**: elements are addressed by small integer keys that
//!   stay valid until the element is erased, no matter how the list is
//!   reordered or spliced.
//! - **Single allocation**: [`BoxedStorage`] allocates once, up front.
//!   After that, every list operation is allocation free; insertion
//!   into a full arena fails with [`Full`] instead of growing.
//! - **Shared arenas**: several lists can live in one storage and
//!   exchange nodes in O(1) per node, without moving payloads.
//!
//! The forward list is deliberately minimal state: one key per list,
//! one link per node, no cached length and no back pointers. Everything
//! a doubly-linked list buys you is paid for here by phrasing mutation
//! as "after a position"; see [`Cursor`].
//!
//! # Quick Start
//!
//! ```
//! use forward_collections::OwnedForwardList;
//!
//! let mut list: OwnedForwardList<u64> = OwnedForwardList::with_capacity(8);
//!
//! list.try_push_front(3)?;
//! list.try_push_front(1)?;
//! list.try_push_front(2)?;
//!
//! list.sort();
//!
//! let values: Vec<_> = list.iter().copied().collect();
//! assert_eq!(values, vec![1, 2, 3]);
//! # Ok::<(), forward_collections::Full<u64>>(())
//! ```
//!
//! # Raw Lists and Shared Storage
//!
//! [`ForwardList`] takes the storage as an explicit argument, which
//! lets multiple lists share one arena and exchange whole ranges by
//! relinking:
//!
//! ```
//! use forward_collections::{BoxedForwardStorage, Cursor, ForwardList};
//!
//! let mut storage: BoxedForwardStorage<u64> = BoxedForwardStorage::with_capacity(16);
//! let mut pending: ForwardList<u64, BoxedForwardStorage<u64>> = ForwardList::new();
//! let mut done: ForwardList<u64, BoxedForwardStorage<u64>> = ForwardList::new();
//!
//! pending.try_push_front(&mut storage, 7)?;
//! done.splice_after(&mut storage, Cursor::Head, &mut pending);
//!
//! assert!(pending.is_empty());
//! assert_eq!(done.front(&storage), Some(&7));
//! # Ok::<(), forward_collections::Full<u64>>(())
//! ```
//!
//! # Storage Invariant
//!
//! A list must always be used with the same storage instance it was
//! populated with. Mixing storages is not checked and is undefined
//! behavior through the unsafe accessors. This is the same discipline
//! the `slab` crate asks of its keys.
//!
//! # Feature Flags
//!
//! - `slab` (default): implements the storage traits for `slab::Slab`,
//!   giving lists an unbounded, growable backend with infallible
//!   insertion.

#![warn(missing_docs)]

mod key;
mod list;
mod owned;
mod storage;

pub use key::Key;
#[cfg(feature = "slab")]
pub use list::SlabForwardStorage;
pub use list::{BoxedForwardStorage, Cursor, Drain, ForwardList, ForwardNode, Iter, IterMut};
pub use owned::OwnedForwardList;
pub use storage::{BoundedStorage, BoxedStorage, Full, Storage, UnboundedStorage};
