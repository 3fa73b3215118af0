//! Handlers and their capability tables
//!
//! A [`Controller`] lists its capabilities once, when it is connected to a
//! router. Each capability is a plain function or closure taking the handler,
//! the request [`Context`] and up to six [`FromArg`] parameters:
//!
//! ```
//! use dispatch_server::context::Context;
//! use dispatch_server::dispatch::{Controller, Methods};
//!
//! struct Users;
//!
//! impl Users {
//!     fn show(&self, _ctx: &mut Context, id: i64) -> String {
//!         format!("user {id}")
//!     }
//! }
//!
//! impl Controller for Users {
//!     fn methods(methods: &mut Methods<Self>) {
//!         methods.add("Show", Self::show);
//!     }
//! }
//! ```

use super::bind::{Arg, FromArg, ParamKind};
use super::reply::{IntoReply, Reply};
use crate::context::Context;
use std::collections::HashMap;
use std::error::Error as StdError;
use std::sync::Arc;

/// Capability invoked when a path names no known capability
pub const CATCH_ALL: &str = "CatchAll";
/// Capability invoked when a path ends at the matched prefix
pub const INDEX: &str = "Index";

pub type StartUpError = Box<dyn StdError + Send + Sync>;

/// An application handler.
///
/// One instance serves every request routed to it, concurrently, so any
/// interior state must be synchronized by the handler itself.
pub trait Controller: Send + Sync + Sized + 'static {
    fn methods(methods: &mut Methods<Self>);

    /// Runs once before the handler is connected to a router.
    fn start_up(&self) -> Result<(), StartUpError> {
        Ok(())
    }
}

type Invoke<H> = Box<dyn Fn(&H, &mut Context, Vec<Arg>) -> Reply + Send + Sync>;

struct Method<H> {
    signature: Vec<ParamKind>,
    invoke: Invoke<H>,
}

/// Capability name to typed invocation, filled by [`Controller::methods`]
pub struct Methods<H> {
    entries: HashMap<String, Method<H>>,
}

impl<H: 'static> Methods<H> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register `capability` under `name`; a later registration with the
    /// same name replaces the earlier one.
    pub fn add<Args, C>(&mut self, name: &str, capability: C) -> &mut Self
    where
        C: Capability<H, Args>,
    {
        self.entries.insert(
            name.to_string(),
            Method {
                signature: C::signature(),
                invoke: Box::new(move |handler, ctx, args| capability.call(handler, ctx, args)),
            },
        );
        self
    }
}

/// Implemented for functions `Fn(&H, &mut Context, A1, .., An) -> R` with
/// `Ai: FromArg` and `R: IntoReply`, for `n` up to six.
pub trait Capability<H, Args>: Send + Sync + 'static {
    fn signature() -> Vec<ParamKind>;

    fn call(&self, handler: &H, ctx: &mut Context, args: Vec<Arg>) -> Reply;
}

macro_rules! impl_capability {
    ($($ty:ident),*) => {
        impl<H, F, R, $($ty,)*> Capability<H, ($($ty,)*)> for F
        where
            F: Fn(&H, &mut Context, $($ty,)*) -> R + Send + Sync + 'static,
            R: IntoReply,
            $($ty: FromArg,)*
        {
            fn signature() -> Vec<ParamKind> {
                vec![$(<$ty as FromArg>::kind(),)*]
            }

            #[allow(unused_mut, unused_variables)]
            fn call(&self, handler: &H, ctx: &mut Context, args: Vec<Arg>) -> Reply {
                let mut args = args.into_iter();
                (self)(handler, ctx, $(<$ty as FromArg>::from_arg(args.next()),)*).into_reply()
            }
        }
    };
}

impl_capability!();
impl_capability!(A1);
impl_capability!(A1, A2);
impl_capability!(A1, A2, A3);
impl_capability!(A1, A2, A3, A4);
impl_capability!(A1, A2, A3, A4, A5);
impl_capability!(A1, A2, A3, A4, A5, A6);

/// A capability bound to its handler instance
pub struct BoundMethod {
    pub signature: Vec<ParamKind>,
    invoke: Box<dyn Fn(&mut Context, Vec<Arg>) -> Reply + Send + Sync>,
}

impl BoundMethod {
    pub fn invoke(&self, ctx: &mut Context, args: Vec<Arg>) -> Reply {
        (self.invoke)(ctx, args)
    }
}

/// A connected handler with its capability table resolved
pub struct HandlerEntry {
    /// Type name of the handler, for logs
    pub name: &'static str,
    methods: HashMap<String, BoundMethod>,
}

impl HandlerEntry {
    pub fn new<H: Controller>(handler: Arc<H>) -> Self {
        let mut table = Methods::new();
        H::methods(&mut table);

        let methods = table
            .entries
            .into_iter()
            .map(|(name, method)| {
                let handler = Arc::clone(&handler);
                let invoke = method.invoke;
                let bound = BoundMethod {
                    signature: method.signature,
                    invoke: Box::new(move |ctx, args| invoke(&handler, ctx, args)),
                };
                (name, bound)
            })
            .collect();

        Self {
            name: std::any::type_name::<H>(),
            methods,
        }
    }

    pub fn method(&self, name: &str) -> Option<&BoundMethod> {
        self.methods.get(name)
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::bind::Rest;
    use hyper::{Method as HttpMethod, Uri};

    struct Calc;

    impl Calc {
        fn add(&self, _ctx: &mut Context, a: i32, b: i32) -> String {
            (a + b).to_string()
        }

        fn join(&self, _ctx: &mut Context, sep: String, parts: Rest<String>) -> String {
            parts.join(&sep)
        }
    }

    impl Controller for Calc {
        fn methods(methods: &mut Methods<Self>) {
            methods
                .add("Add", Self::add)
                .add("Join", Self::join)
                .add(INDEX, |_: &Self, _: &mut Context| "index")
                .add("Nothing", |_: &Self, _: &mut Context| ());
        }
    }

    fn ctx() -> Context {
        Context::new(HttpMethod::GET, Uri::from_static("/"))
    }

    fn html(reply: Reply) -> String {
        match reply {
            Reply::Html(s) => s,
            _ => panic!("expected html reply"),
        }
    }

    #[test]
    fn test_signatures() {
        let entry = HandlerEntry::new(Arc::new(Calc));
        assert_eq!(
            entry.method("Add").unwrap().signature,
            vec![ParamKind::Int, ParamKind::Int]
        );
        assert_eq!(
            entry.method("Join").unwrap().signature,
            vec![ParamKind::Str, ParamKind::Variadic(Box::new(ParamKind::Str))]
        );
        assert!(entry.method(INDEX).unwrap().signature.is_empty());
        assert!(!entry.has_method("Sub"));
        assert!(entry.name.ends_with("Calc"));
    }

    #[test]
    fn test_invoke_typed() {
        let entry = HandlerEntry::new(Arc::new(Calc));
        let reply = entry
            .method("Add")
            .unwrap()
            .invoke(&mut ctx(), vec![Arg::Int(2), Arg::Int(40)]);
        assert_eq!(html(reply), "42");

        let reply = entry.method("Join").unwrap().invoke(
            &mut ctx(),
            vec![
                Arg::Str("-".into()),
                Arg::List(vec![Arg::Str("a".into()), Arg::Str("b".into())]),
            ],
        );
        assert_eq!(html(reply), "a-b");
    }

    #[test]
    fn test_unit_return_is_nothing() {
        let entry = HandlerEntry::new(Arc::new(Calc));
        let reply = entry.method("Nothing").unwrap().invoke(&mut ctx(), vec![]);
        assert!(matches!(reply, Reply::Nothing));
    }
}
