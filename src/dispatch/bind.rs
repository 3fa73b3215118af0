//! Argument binding
//!
//! Trailing path segments become positional arguments. Text that does not
//! parse as the declared kind becomes that kind's zero value and the request
//! goes on.

use std::ops::Deref;

/// Declared kind of one positional parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamKind {
    Int,
    Uint,
    Float,
    Bool,
    Str,
    /// Collects every remaining segment; only valid as the last parameter
    Variadic(Box<ParamKind>),
}

/// A coerced argument value
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Int(i64),
    Uint(u64),
    Float(f64),
    Bool(bool),
    Str(String),
    List(Vec<Arg>),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindError {
    #[error("variadic parameter at position {position} is not the last parameter")]
    VariadicNotLast { position: usize },
    #[error("variadic parameter at position {position} has unsupported element kind {kind:?}")]
    UnsupportedElement { position: usize, kind: ParamKind },
}

impl ParamKind {
    /// Value used when no segment is left for this parameter
    pub fn zero(&self) -> Arg {
        match self {
            Self::Int => Arg::Int(0),
            Self::Uint => Arg::Uint(0),
            Self::Float => Arg::Float(0.0),
            Self::Bool => Arg::Bool(false),
            Self::Str => Arg::Str(String::new()),
            Self::Variadic(_) => Arg::List(Vec::new()),
        }
    }

    /// Coerce one segment. Never fails.
    pub fn coerce(&self, segment: &str) -> Arg {
        match self {
            Self::Int => Arg::Int(segment.parse().unwrap_or(0)),
            Self::Uint => Arg::Uint(segment.parse().unwrap_or(0)),
            Self::Float => Arg::Float(segment.parse().unwrap_or(0.0)),
            Self::Bool => Arg::Bool(segment == "true" || segment == "1"),
            Self::Str => Arg::Str(segment.to_string()),
            Self::Variadic(elem) => Arg::List(vec![elem.coerce(segment)]),
        }
    }
}

/// Build exactly one argument per declared parameter from `segments`.
///
/// Scalars consume one segment each, or get their zero value once segments
/// run out. A trailing variadic takes everything left.
pub fn bind(signature: &[ParamKind], segments: &[String]) -> Result<Vec<Arg>, BindError> {
    let mut args = Vec::with_capacity(signature.len());
    let mut cursor = 0;

    for (position, kind) in signature.iter().enumerate() {
        if let ParamKind::Variadic(elem) = kind {
            if position + 1 != signature.len() {
                return Err(BindError::VariadicNotLast { position });
            }
            if matches!(**elem, ParamKind::Variadic(_)) {
                return Err(BindError::UnsupportedElement {
                    position,
                    kind: (**elem).clone(),
                });
            }
            let rest = segments.get(cursor..).unwrap_or_default();
            args.push(Arg::List(rest.iter().map(|s| elem.coerce(s)).collect()));
            cursor = segments.len();
        } else {
            let arg = segments
                .get(cursor)
                .map_or_else(|| kind.zero(), |s| kind.coerce(s));
            args.push(arg);
            cursor += 1;
        }
    }

    Ok(args)
}

/// Types a capability can declare as positional parameters
pub trait FromArg: Sized {
    fn kind() -> ParamKind;

    /// Convert a bound argument; `None` or a mismatched variant yields the
    /// zero value.
    fn from_arg(arg: Option<Arg>) -> Self;
}

macro_rules! impl_from_arg_int {
    ($variant:ident, $kind:ident, $($ty:ty),*) => {
        $(
            impl FromArg for $ty {
                fn kind() -> ParamKind {
                    ParamKind::$kind
                }

                fn from_arg(arg: Option<Arg>) -> Self {
                    match arg {
                        Some(Arg::$variant(v)) => Self::try_from(v).unwrap_or(0),
                        _ => 0,
                    }
                }
            }
        )*
    };
}

impl_from_arg_int!(Int, Int, i8, i16, i32, i64, isize);
impl_from_arg_int!(Uint, Uint, u8, u16, u32, u64, usize);

impl FromArg for f64 {
    fn kind() -> ParamKind {
        ParamKind::Float
    }

    fn from_arg(arg: Option<Arg>) -> Self {
        match arg {
            Some(Arg::Float(v)) => v,
            _ => 0.0,
        }
    }
}

impl FromArg for f32 {
    fn kind() -> ParamKind {
        ParamKind::Float
    }

    #[allow(clippy::cast_possible_truncation)]
    fn from_arg(arg: Option<Arg>) -> Self {
        f64::from_arg(arg) as Self
    }
}

impl FromArg for bool {
    fn kind() -> ParamKind {
        ParamKind::Bool
    }

    fn from_arg(arg: Option<Arg>) -> Self {
        matches!(arg, Some(Arg::Bool(true)))
    }
}

impl FromArg for String {
    fn kind() -> ParamKind {
        ParamKind::Str
    }

    fn from_arg(arg: Option<Arg>) -> Self {
        match arg {
            Some(Arg::Str(v)) => v,
            _ => Self::new(),
        }
    }
}

/// Variadic tail: every path segment left after the other parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rest<T>(pub Vec<T>);

impl<T> Deref for Rest<T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: FromArg> FromArg for Rest<T> {
    fn kind() -> ParamKind {
        ParamKind::Variadic(Box::new(T::kind()))
    }

    fn from_arg(arg: Option<Arg>) -> Self {
        match arg {
            Some(Arg::List(items)) => Self(items.into_iter().map(|a| T::from_arg(Some(a))).collect()),
            _ => Self(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segs(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_scalar_coercion() {
        let sig = [ParamKind::Int, ParamKind::Float, ParamKind::Bool, ParamKind::Str];
        let args = bind(&sig, &segs(&["42", "2.5", "true", "Name"])).unwrap();
        assert_eq!(
            args,
            vec![
                Arg::Int(42),
                Arg::Float(2.5),
                Arg::Bool(true),
                Arg::Str("Name".into())
            ]
        );
    }

    #[test]
    fn test_malformed_text_is_zero() {
        let sig = [ParamKind::Int, ParamKind::Uint, ParamKind::Float, ParamKind::Bool];
        let args = bind(&sig, &segs(&["abc", "-3", "x.y", "yes"])).unwrap();
        assert_eq!(
            args,
            vec![Arg::Int(0), Arg::Uint(0), Arg::Float(0.0), Arg::Bool(false)]
        );
    }

    #[test]
    fn test_bool_accepts_one() {
        assert_eq!(ParamKind::Bool.coerce("1"), Arg::Bool(true));
        assert_eq!(ParamKind::Bool.coerce("TRUE"), Arg::Bool(false));
    }

    #[test]
    fn test_pads_with_zero_values() {
        let sig = [ParamKind::Int, ParamKind::Str, ParamKind::Bool];
        let args = bind(&sig, &segs(&["7"])).unwrap();
        assert_eq!(
            args,
            vec![Arg::Int(7), Arg::Str(String::new()), Arg::Bool(false)]
        );
    }

    #[test]
    fn test_extra_segments_ignored_without_variadic() {
        let args = bind(&[ParamKind::Int], &segs(&["1", "2", "3"])).unwrap();
        assert_eq!(args, vec![Arg::Int(1)]);
    }

    #[test]
    fn test_variadic_collects_rest() {
        let sig = [
            ParamKind::Str,
            ParamKind::Variadic(Box::new(ParamKind::Int)),
        ];
        let args = bind(&sig, &segs(&["ids", "1", "x", "3"])).unwrap();
        assert_eq!(
            args,
            vec![
                Arg::Str("ids".into()),
                Arg::List(vec![Arg::Int(1), Arg::Int(0), Arg::Int(3)])
            ]
        );
    }

    #[test]
    fn test_variadic_empty_when_no_segments() {
        let sig = [ParamKind::Variadic(Box::new(ParamKind::Str))];
        assert_eq!(bind(&sig, &[]).unwrap(), vec![Arg::List(vec![])]);
    }

    #[test]
    fn test_variadic_not_last_fails() {
        let sig = [
            ParamKind::Variadic(Box::new(ParamKind::Str)),
            ParamKind::Int,
        ];
        assert_eq!(
            bind(&sig, &segs(&["a", "b"])),
            Err(BindError::VariadicNotLast { position: 0 })
        );
    }

    #[test]
    fn test_nested_variadic_fails() {
        let nested = ParamKind::Variadic(Box::new(ParamKind::Str));
        let sig = [ParamKind::Variadic(Box::new(nested.clone()))];
        assert_eq!(
            bind(&sig, &segs(&["a"])),
            Err(BindError::UnsupportedElement {
                position: 0,
                kind: nested
            })
        );
    }

    #[test]
    fn test_from_arg_narrowing() {
        assert_eq!(i8::from_arg(Some(Arg::Int(300))), 0);
        assert_eq!(i32::from_arg(Some(Arg::Int(-12))), -12);
        assert_eq!(u16::from_arg(Some(Arg::Uint(65_535))), 65_535);
        assert_eq!(i64::from_arg(None), 0);
        assert_eq!(String::from_arg(Some(Arg::Int(1))), "");
        let rest = Rest::<u8>::from_arg(Some(Arg::List(vec![Arg::Uint(1), Arg::Uint(2)])));
        assert_eq!(rest.0, vec![1, 2]);
    }
}
