//! Process-unique identifiers for arena entries

/// Define a `Copy` identifier newtype backed by its own process-wide counter.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u64);

        impl $name {
            /// Allocate a fresh identifier, never handed out before in this process.
            pub(crate) fn fresh() -> Self {
                static NEXT: std::sync::atomic::AtomicU64 = std::sync::atomic::AtomicU64::new(1);
                Self(NEXT.fetch_add(1, std::sync::atomic::Ordering::Relaxed))
            }

            /// Wrap a raw number (for diagnostics and tests).
            pub fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            /// The underlying number.
            pub fn raw(self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

pub(crate) use define_id;
