/// Declares a struct and describes it to the codec in declaration order.
///
/// Field attributes pass through to the generated struct, except
/// `#[ido(skip)]`, which keeps the field out of the wire format in both
/// directions. Skipped fields keep their value on decode.
///
/// ```rust
/// ido::record! {
///     #[derive(Debug, Default, PartialEq)]
///     pub struct Session {
///         pub user: String,
///         #[ido(skip)]
///         pub token: String,
///         pub retries: u8,
///     }
/// }
///
/// let session = Session { user: "ana".into(), token: "secret".into(), retries: 2 };
/// assert_eq!(ido::to_string(&session).unwrap(), r#"{"ana",2}"#);
/// ```
#[macro_export]
macro_rules! record {
    // all fields consumed
    (@field $meta:tt $vis:tt $name:ident $fields:tt [] false []) => {
        $crate::record!(@emit $meta $vis $name $fields);
    };

    (@field $meta:tt $vis:tt $name:ident $fields:tt [$($attr:tt)*] $skip:literal
        [#[ido(skip)] $($rest:tt)*]
    ) => {
        $crate::record!(@field $meta $vis $name $fields [$($attr)*] true [$($rest)*]);
    };

    (@field $meta:tt $vis:tt $name:ident $fields:tt [$($attr:tt)*] $skip:literal
        [#[$m:meta] $($rest:tt)*]
    ) => {
        $crate::record!(@field $meta $vis $name $fields [$($attr)* #[$m]] $skip [$($rest)*]);
    };

    (@field $meta:tt $vis:tt $name:ident [$($fields:tt)*] $attrs:tt $skip:literal
        [$fvis:vis $fname:ident : $fty:ty , $($rest:tt)*]
    ) => {
        $crate::record!(@field $meta $vis $name
            [$($fields)* [$attrs [$fvis] $fname [$fty] $skip]]
            [] false [$($rest)*]);
    };

    (@field $meta:tt $vis:tt $name:ident [$($fields:tt)*] $attrs:tt $skip:literal
        [$fvis:vis $fname:ident : $fty:ty]
    ) => {
        $crate::record!(@field $meta $vis $name
            [$($fields)* [$attrs [$fvis] $fname [$fty] $skip]]
            [] false []);
    };

    (@emit [$(#[$meta:meta])*] [$vis:vis] $name:ident
        [$([[$(#[$fattr:meta])*] [$fvis:vis] $fname:ident [$fty:ty] $fskip:literal])*]
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$fattr])*
                $fvis $fname: $fty,
            )*
        }

        impl $crate::Shape for $name {
            fn layout() -> $crate::Layout {
                $crate::Layout::Struct($crate::StructLayout::new(
                    ::core::stringify!($name),
                    ::std::vec![
                        $(
                            $crate::Field::new(
                                ::core::stringify!($fname),
                                $fskip,
                                $crate::TypeRef::of::<$fty>(),
                                |v| v
                                    .downcast_ref::<$name>()
                                    .map(|s| &s.$fname as &dyn ::core::any::Any),
                                |v| v
                                    .downcast_mut::<$name>()
                                    .map(|s| &mut s.$fname as &mut dyn ::core::any::Any),
                            ),
                        )*
                    ],
                ))
            }
        }
    };

    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $($body:tt)*
        }
    ) => {
        $crate::record!(@field [$(#[$meta])*] [$vis] $name [] [] false [$($body)*]);
    };
}

/// Implements [`Shape`](crate::Shape) for types that implement
/// [`Extension`](crate::Extension).
///
/// ```rust
/// use ido::{Extension, Result};
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Hex(u32);
///
/// impl Extension for Hex {
///     fn encode_ido(&self, out: &mut Vec<u8>) -> Result<()> {
///         out.extend_from_slice(format!("{:x}", self.0).as_bytes());
///         Ok(())
///     }
///
///     fn decode_ido(&mut self, data: &[u8]) -> Result<()> {
///         let text = std::str::from_utf8(data).map_err(ido::Error::custom)?;
///         self.0 = u32::from_str_radix(text, 16).map_err(ido::Error::custom)?;
///         Ok(())
///     }
/// }
///
/// ido::extension!(Hex);
///
/// let values: Vec<Hex> = ido::from_slice(b"[ff,10]").unwrap();
/// assert_eq!(values, vec![Hex(255), Hex(16)]);
/// ```
#[macro_export]
macro_rules! extension {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Shape for $ty {
                fn layout() -> $crate::Layout {
                    $crate::Layout::extension::<Self>()
                }
            }
        )+
    };
}

#[cfg(test)]
mod tests {
    use crate::{Extension, Result};

    crate::record! {
        /// Doc comments pass through.
        #[derive(Debug, Default, Clone, PartialEq)]
        struct Flags {
            /// First.
            #[allow(dead_code)]
            a: bool,
            #[ido(skip)]
            hidden: u32,
            pub(crate) b: Option<bool>
        }
    }

    crate::record! {
        #[derive(Debug, Default)]
        pub struct Empty {}
    }

    #[derive(Debug, Default, PartialEq)]
    struct Celsius(i16);

    impl Extension for Celsius {
        fn encode_ido(&self, out: &mut Vec<u8>) -> Result<()> {
            out.extend_from_slice(format!("{}C", self.0).as_bytes());
            Ok(())
        }

        fn decode_ido(&mut self, data: &[u8]) -> Result<()> {
            let digits = data.strip_suffix(b"C").unwrap_or(data);
            self.0 = std::str::from_utf8(digits)
                .ok()
                .and_then(|text| text.parse().ok())
                .ok_or_else(|| crate::Error::malformed(data, "invalid temperature"))?;
            Ok(())
        }
    }

    crate::extension!(Celsius);

    #[test]
    fn test_record_layout() {
        let crate::Layout::Struct(layout) = <Flags as crate::Shape>::layout() else {
            panic!("expected a struct layout");
        };
        assert_eq!(layout.name(), "Flags");
        let names: Vec<_> = layout.fields().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["a", "hidden", "b"]);
        assert!(layout.fields()[1].is_skipped());
        assert!(!layout.fields()[2].is_skipped());
    }

    #[test]
    fn test_record_round_trip() {
        let flags = Flags {
            a: true,
            hidden: 9,
            b: Some(false),
        };
        let bytes = crate::to_vec(&flags).unwrap();
        assert_eq!(bytes, b"{+,}");
        let back: Flags = crate::from_slice(&bytes).unwrap();
        assert_eq!(back, Flags { hidden: 0, b: None, ..flags });
    }

    #[test]
    fn test_empty_record() {
        assert_eq!(crate::to_vec(&Empty {}).unwrap(), b"{}");
        crate::from_slice::<Empty>(b"{}").unwrap();
    }

    #[test]
    fn test_extension_macro() {
        assert_eq!(crate::to_vec(&Celsius(-4)).unwrap(), b"-4C");
        let value: Celsius = crate::from_slice(b"21C").unwrap();
        assert_eq!(value, Celsius(21));
    }
}
