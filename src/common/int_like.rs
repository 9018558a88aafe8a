//! Helpers used to define types that are backed by integers (typically `usize`),
//! without compromising safety.
//!
//! # Example
//!
//! ```
//! /// Define an opaque type `Pid` backed by a `usize`.
//! kernel_time::int_like!(Pid, usize);
//!
//! const ZERO: Pid = Pid::new(0);
//! ```

#[macro_export]
macro_rules! int_like {
    ($new_type_name:ident, $backing_type: ident) => {
        #[derive(Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
        pub struct $new_type_name($backing_type);

        impl $new_type_name {
            #[allow(dead_code)]
            #[inline]
            pub const fn get(self) -> $backing_type {
                self.0
            }
            #[allow(dead_code)]
            #[inline]
            pub const fn new(x: $backing_type) -> Self {
                $new_type_name(x)
            }
        }

        impl ::core::convert::From<$backing_type> for $new_type_name {
            #[inline]
            fn from(inner: $backing_type) -> Self {
                Self::new(inner)
            }
        }
        impl ::core::convert::From<$new_type_name> for $backing_type {
            #[inline]
            fn from(wrapped: $new_type_name) -> Self {
                wrapped.get()
            }
        }
        impl ::core::fmt::Display for $new_type_name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

#[test]
fn test() {
    use core::mem::size_of;

    int_like!(UsizeLike, usize);
    assert_eq!(size_of::<UsizeLike>(), size_of::<usize>());

    let id = UsizeLike::from(7);
    assert_eq!(usize::from(id), 7);
    assert_eq!(alloc::format!("{id}"), "7");
}
