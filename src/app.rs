//! Application-level registration
//!
//! Named routes and fallbacks are collected first and turned into a
//! [`Router`] in one step before the listener opens. A name may be used only
//! once per kind; a second registration is an error the caller is expected
//! to treat as fatal.

use crate::dispatch::{Controller, Router, StartUpError};
use crate::logger;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("App {0} was already registered.")]
    DuplicateApp(String),
    #[error("Route {0} was already registered.")]
    DuplicateRoute(String),
    #[error("Fallback {0} was already registered.")]
    DuplicateFallback(String),
    #[error("{name} failed to start: {source}")]
    StartUp {
        name: String,
        #[source]
        source: StartUpError,
    },
}

type Connector = Box<dyn FnOnce(&mut Router, &str) -> Result<(), StartUpError> + Send>;

#[derive(Default)]
pub struct App {
    apps: HashMap<String, Arc<dyn Any + Send + Sync>>,
    routes: Vec<(String, Connector)>,
    fallbacks: Vec<(String, Connector)>,
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep a shared instance retrievable by name through [`App::app`].
    pub fn register<T: Send + Sync + 'static>(
        &mut self,
        name: &str,
        app: Arc<T>,
    ) -> Result<(), AppError> {
        if self.apps.contains_key(name) {
            return Err(AppError::DuplicateApp(name.to_string()));
        }
        self.apps.insert(name.to_string(), app);
        Ok(())
    }

    pub fn app<T: Send + Sync + 'static>(&self, name: &str) -> Option<Arc<T>> {
        Arc::clone(self.apps.get(name)?).downcast::<T>().ok()
    }

    /// Main route for a handler; `name` is the prefix it is connected to.
    pub fn route<H: Controller>(&mut self, name: &str, handler: Arc<H>) -> Result<(), AppError> {
        if self.routes.iter().any(|(n, _)| n == name) {
            return Err(AppError::DuplicateRoute(name.to_string()));
        }
        self.routes.push((name.to_string(), connector(handler)));
        Ok(())
    }

    /// Like [`App::route`], but connected after every route so it is only
    /// tried once they have all failed to resolve.
    pub fn fallback<H: Controller>(
        &mut self,
        name: &str,
        handler: Arc<H>,
    ) -> Result<(), AppError> {
        if self.fallbacks.iter().any(|(n, _)| n == name) {
            return Err(AppError::DuplicateFallback(name.to_string()));
        }
        self.fallbacks.push((name.to_string(), connector(handler)));
        Ok(())
    }

    /// Start every handler and connect it, routes before fallbacks, each in
    /// registration order.
    pub fn into_router(self) -> Result<Router, AppError> {
        let mut router = Router::new();

        let routes = self.routes.into_iter().map(|r| ("route", r));
        let fallbacks = self.fallbacks.into_iter().map(|r| ("fallback", r));

        for (kind, (name, connect)) in routes.chain(fallbacks) {
            logger::log_route_added(kind, &name);
            connect(&mut router, &name).map_err(|source| AppError::StartUp {
                name: name.clone(),
                source,
            })?;
        }

        Ok(router)
    }
}

fn connector<H: Controller>(handler: Arc<H>) -> Connector {
    Box::new(move |router, name| {
        handler.start_up()?;
        router.connect(name, handler);
        Ok(())
    })
}
