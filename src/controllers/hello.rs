use dispatch_server::context::Context;
use dispatch_server::dispatch::{Controller, Methods, INDEX};

/// Greets whoever asks, at `/hello` and `/hello/greet/<name>`
pub struct Hello;

impl Hello {
    fn index(&self, _ctx: &mut Context) -> &'static str {
        "<h1>Hello!</h1>"
    }

    fn greet(&self, ctx: &mut Context, name: String) -> String {
        let greeting = match ctx.params.get("greeting") {
            "" => "Hello",
            greeting => greeting,
        };
        format!("<h1>{greeting}, {name}!</h1>")
    }
}

impl Controller for Hello {
    fn methods(methods: &mut Methods<Self>) {
        methods.add(INDEX, Self::index).add("Greet", Self::greet);
    }
}
