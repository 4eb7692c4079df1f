//! Helper macros for thin wrapper types that keep their payload in a field named `inner`.

/// Implement [core::ops::Deref] for a wrapper, exposing the payload as `$target`.
///
/// The field may be any type that derefs to `$target` (e.g. `Arc<$target>`).
#[macro_export]
macro_rules! impl_deref {
    ($name: ty, $target: ty) => {
        impl core::ops::Deref for $name {
            type Target = $target;

            fn deref(&self) -> &Self::Target {
                &self.inner
            }
        }
    };
}

/// Implement lossless conversions between a wrapper and its payload in both directions.
#[macro_export]
macro_rules! impl_conversion {
    ($name: ident, $type: ty) => {
        impl core::convert::From<$type> for $name {
            fn from(value: $type) -> Self {
                $name { inner: value }
            }
        }

        impl core::convert::From<$name> for $type {
            fn from(value: $name) -> Self {
                value.inner
            }
        }

        impl $name {
            pub const fn from_const(value: $type) -> Self {
                $name { inner: value }
            }
            pub const fn into_const(self) -> $type {
                self.inner
            }
        }
    };
}
