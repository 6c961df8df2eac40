use crate::{Method, Request};
use std::{collections::HashMap, fmt};
use tracing::{debug, trace};

/// Response returned by [`Router::route_request`] when no route matches.
pub const NOT_FOUND: &str = "404 Not Found";

/// Produces a response for a routed request.
///
/// The router never inspects the returned string, so it can hold plain text,
/// serialized JSON or a full HTTP response, whatever the transport expects.
///
/// Implemented for every `Fn(&Request) -> String` closure.
///
/// # Examples
/// ```
/// use maker_stream::{Handler, Method, Request, Router};
///
/// struct Greeter {
///     greeting: &'static str,
/// }
///
/// impl Handler for Greeter {
///     fn handle(&self, req: &Request) -> String {
///         let name = req.query_param("name").unwrap_or("stranger");
///         format!("{}, {name}!", self.greeting)
///     }
/// }
///
/// let mut router = Router::new();
/// router.add_route(Method::Get, "/hello", Greeter { greeting: "Hello" });
///
/// let req = Request::parse(b"GET /hello?name=Ann HTTP/1.1\r\n\r\n").unwrap();
/// assert_eq!(router.route_request(&req), "Hello, Ann!");
/// ```
pub trait Handler
where
    Self: Sync + Send + 'static,
{
    /// Handles a request and returns the response text.
    fn handle(&self, req: &Request) -> String;
}

impl<F> Handler for F
where
    F: Fn(&Request) -> String + Sync + Send + 'static,
{
    #[inline]
    fn handle(&self, req: &Request) -> String {
        self(req)
    }
}

/// A registered `(method, path)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteKey {
    method: Method,
    path: String,
}

impl RouteKey {
    #[inline]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }

    #[inline(always)]
    pub const fn method(&self) -> Method {
        self.method
    }

    #[inline(always)]
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Exact-match dispatch table from `(method, path)` to a [`Handler`].
///
/// Matching is byte-for-byte on [`Request::path`]: no prefix or pattern
/// matching, no trailing-slash or case normalization, and no method
/// fallback (a `GET` route does not answer `HEAD`).
///
/// Build the table once, then share it read-only. Registration takes
/// `&mut self`, so concurrent registration needs outside synchronization.
///
/// # Examples
/// ```
/// use maker_stream::{router::NOT_FOUND, Method, Request, Router};
///
/// let mut router = Router::new();
/// router
///     .add_route(Method::Get, "/health", |_: &Request| "ok".to_string())
///     .add_route(Method::Post, "/echo", |req: &Request| {
///         req.body_str().unwrap_or_default().to_string()
///     });
///
/// let req = Request::parse(b"POST /echo HTTP/1.1\r\nContent-Length: 2\r\n\r\nhi").unwrap();
/// assert_eq!(router.route_request(&req), "hi");
///
/// let req = Request::parse(b"GET /echo HTTP/1.1\r\n\r\n").unwrap();
/// assert_eq!(router.route_request(&req), NOT_FOUND);
/// ```
#[derive(Default)]
pub struct Router {
    // Grouped by method so a lookup borrows the request path instead of
    // building an owned key
    routes: HashMap<Method, HashMap<String, Box<dyn Handler>>>,
}

impl Router {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for requests with exactly this method and path.
    ///
    /// Registering the same pair again replaces the previous handler.
    pub fn add_route<H: Handler>(
        &mut self,
        method: Method,
        path: impl Into<String>,
        handler: H,
    ) -> &mut Self {
        let path = path.into();
        let paths = self.routes.entry(method).or_default();

        if paths.insert(path.clone(), Box::new(handler)).is_some() {
            debug!(%method, path = path.as_str(), "route handler replaced");
        }

        self
    }

    /// Runs the handler registered for the request's method and path, or
    /// returns [`NOT_FOUND`].
    pub fn route_request(&self, req: &Request) -> String {
        let method = req.method();
        let path = req.path();

        match self.handler(method, path) {
            Some(handler) => {
                trace!(%method, path, "route matched");
                handler.handle(req)
            }
            None => {
                debug!(%method, path, "no route");
                NOT_FOUND.to_string()
            }
        }
    }

    #[inline]
    pub fn contains(&self, key: &RouteKey) -> bool {
        self.handler(key.method, &key.path).is_some()
    }

    /// Number of registered routes.
    #[inline]
    pub fn len(&self) -> usize {
        self.routes.values().map(HashMap::len).sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.routes.values().all(HashMap::is_empty)
    }

    /// Iterates over the registered routes in no particular order.
    pub fn routes(&self) -> impl Iterator<Item = RouteKey> + '_ {
        self.routes.iter().flat_map(|(&method, paths)| {
            paths.keys().map(move |path| RouteKey::new(method, path.as_str()))
        })
    }

    #[inline]
    fn handler(&self, method: Method, path: &str) -> Option<&dyn Handler> {
        self.routes.get(&method)?.get(path).map(Box::as_ref)
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut routes: Vec<_> = self.routes().map(|key| key.to_string()).collect();
        routes.sort_unstable();

        f.debug_struct("Router").field("routes", &routes).finish()
    }
}
