//! Path-based dispatch
//!
//! Resolution of a request path happens in four steps:
//! 1. the deepest registered prefix of the lower-cased path is selected;
//! 2. the next segment names a capability (`user_list` -> `UserList`),
//!    or `Index` when the path ends at the prefix;
//! 3. the first stacked handler exposing that capability wins, otherwise the
//!    first one exposing `CatchAll`, which also receives the name segment;
//! 4. the remaining segments are coerced into the declared parameters.

mod bind;
mod controller;
mod reply;
mod router;

pub use bind::{bind, Arg, BindError, FromArg, ParamKind, Rest};
pub use controller::{
    BoundMethod, Capability, Controller, HandlerEntry, Methods, StartUpError, CATCH_ALL, INDEX,
};
pub use reply::{classify, Data, IntoReply, Rendered, Reply, TEXT_HTML};
pub use router::{method_name, normalize_prefix, split_path, Resolution, Router};
