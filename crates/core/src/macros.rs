/// Implements `as_str`, `Display` and `FromStr` for a fieldless enum whose
/// serde representation is the given wire name per variant.
macro_rules! wire_enum {
    ($ty:ident, $field:literal, { $($variant:ident => $wire:literal),+ $(,)? }) => {
        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match *self {
                    $(Self::$variant => $wire),+
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $ty {
            type Err = $crate::error::CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($wire => Ok(Self::$variant),)+
                    other => Err($crate::error::CoreError::invalid($field, other)),
                }
            }
        }
    };
}

pub(crate) use wire_enum;
