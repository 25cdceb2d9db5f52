//! Handler registry for dispatching requests by method name.
//!
//! The registry is filled once at startup and then shared read-only by the
//! dispatcher. Each handler owns the parameter schema of its method: the
//! `kwargs` object is deserialized into a typed struct before the handler
//! body runs, so a missing or mistyped field never reaches the facade.
//!
//! # Example
//!
//! ```ignore
//! let mut registry = HandlerRegistry::new();
//! registry.register("privkey-to-pubkey", |p: PrivkeyParams, facade| async move {
//!     Ok::<_, RpcError>(facade.privkey_to_pubkey(&p.privkey).await?)
//! })?;
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::nem::NodeFacade;
use crate::rpc::types::RpcError;

/// Result type for handler functions.
pub type HandlerResult = Result<Value, RpcError>;

/// Boxed future for handler results.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Trait for handler functions.
pub trait Handler: Send + Sync + 'static {
    /// Handle a request with its raw `kwargs` object.
    fn call(&self, params: Value, facade: Arc<dyn NodeFacade>) -> BoxFuture<'static, HandlerResult>;
}

/// Wrapper that deserializes parameters before calling the handler.
pub struct TypedHandler<F, P, Fut, R>
where
    F: Fn(P, Arc<dyn NodeFacade>) -> Fut + Send + Sync + 'static,
    P: DeserializeOwned + Send + 'static,
    Fut: Future<Output = Result<R, RpcError>> + Send + 'static,
    R: Serialize + Send + 'static,
{
    handler: F,
    _phantom: PhantomData<fn(P) -> (Fut, R)>,
}

impl<F, P, Fut, R> TypedHandler<F, P, Fut, R>
where
    F: Fn(P, Arc<dyn NodeFacade>) -> Fut + Send + Sync + 'static,
    P: DeserializeOwned + Send + 'static,
    Fut: Future<Output = Result<R, RpcError>> + Send + 'static,
    R: Serialize + Send + 'static,
{
    /// Create a new typed handler.
    pub fn new(handler: F) -> Self {
        Self {
            handler,
            _phantom: PhantomData,
        }
    }
}

impl<F, P, Fut, R> Handler for TypedHandler<F, P, Fut, R>
where
    F: Fn(P, Arc<dyn NodeFacade>) -> Fut + Send + Sync + 'static,
    P: DeserializeOwned + Send + 'static,
    Fut: Future<Output = Result<R, RpcError>> + Send + 'static,
    R: Serialize + Send + 'static,
{
    fn call(&self, params: Value, facade: Arc<dyn NodeFacade>) -> BoxFuture<'static, HandlerResult> {
        let parsed: P = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => {
                let err = RpcError::InvalidParams(e.to_string());
                return Box::pin(async move { Err(err) });
            }
        };

        let fut = (self.handler)(parsed, facade);
        Box::pin(async move {
            let result = fut.await?;
            serde_json::to_value(result)
                .map_err(|e| RpcError::Internal(format!("failed to serialize result: {}", e)))
        })
    }
}

/// Registry mapping method names to handlers.
#[derive(Default)]
pub struct HandlerRegistry {
    methods: HashMap<String, Box<dyn Handler>>,
}

impl HandlerRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a method handler.
    ///
    /// Fails if `name` is already registered.
    pub fn register<F, P, Fut, R>(&mut self, name: &str, handler: F) -> Result<(), RpcError>
    where
        F: Fn(P, Arc<dyn NodeFacade>) -> Fut + Send + Sync + 'static,
        P: DeserializeOwned + Send + 'static,
        Fut: Future<Output = Result<R, RpcError>> + Send + 'static,
        R: Serialize + Send + 'static,
    {
        if self.methods.contains_key(name) {
            return Err(RpcError::DuplicateMethod(name.to_string()));
        }
        self.methods
            .insert(name.to_string(), Box::new(TypedHandler::new(handler)));
        Ok(())
    }

    /// Get a handler by method name.
    pub fn get(&self, name: &str) -> Option<&dyn Handler> {
        self.methods.get(name).map(|h| h.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Registered method names, sorted.
    pub fn method_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("methods", &self.method_names())
            .finish()
    }
}
