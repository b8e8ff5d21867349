use std::collections::HashMap;
use std::fmt::Display;

use http::Method;

use crate::middleware::HandlerId;

/// One registered endpoint, as seen by introspection and reverse lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub method: Method,
    pub path: String,
    pub handler: HandlerId,
}

/// Flat table of every registered route, in registration order.
///
/// Re-registering a method and path replaces the entry in place, so its
/// position (and therefore reverse-lookup precedence) is kept.
#[derive(Debug, Default)]
pub(crate) struct RouteRegistry {
    routes: Vec<Route>,
    index: HashMap<(Method, String), usize>,
}

impl RouteRegistry {
    pub(crate) fn insert(&mut self, route: Route) -> Option<Route> {
        let key = (route.method.clone(), route.path.clone());
        match self.index.get(&key) {
            Some(&i) => Some(std::mem::replace(&mut self.routes[i], route)),
            None => {
                self.index.insert(key, self.routes.len());
                self.routes.push(route);
                None
            }
        }
    }

    pub(crate) fn get(&self, method: &Method, path: &str) -> Option<&Route> {
        self.index
            .get(&(method.clone(), path.to_string()))
            .map(|&i| &self.routes[i])
    }

    pub(crate) fn as_slice(&self) -> &[Route] {
        &self.routes
    }

    /// Build a concrete URI for the first route registered with `handler`,
    /// substituting its `:name` segments positionally with `params`.
    ///
    /// Returns an empty string for an unknown handler. Placeholders beyond
    /// the supplied values stay literal; extra values are ignored.
    pub(crate) fn uri<P: Display>(&self, handler: HandlerId, params: &[P]) -> String {
        let Some(route) = self.routes.iter().find(|r| r.handler == handler) else {
            return String::new();
        };

        let mut uri = String::with_capacity(route.path.len());
        let mut rest = route.path.as_str();
        let mut values = params.iter();

        while let Some(pos) = rest.find(':') {
            let Some(value) = values.next() else {
                break;
            };
            uri.push_str(&rest[..pos]);
            let placeholder = &rest[pos..];
            let end = placeholder.find('/').unwrap_or(placeholder.len());
            uri.push_str(&value.to_string());
            rest = &placeholder[end..];
        }
        uri.push_str(rest);
        uri
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::Handler;

    fn route(method: Method, path: &str, handler: HandlerId) -> Route {
        Route {
            method,
            path: path.to_string(),
            handler,
        }
    }

    #[test]
    fn test_reinsert_replaces_in_place() {
        let a = Handler::new(|_| Ok(())).id();
        let b = Handler::new(|_| Ok(())).id();
        let mut reg = RouteRegistry::default();
        reg.insert(route(Method::GET, "/x", a));
        reg.insert(route(Method::GET, "/y", a));
        let old = reg.insert(route(Method::GET, "/x", b)).unwrap();
        assert_eq!(old.handler, a);
        assert_eq!(reg.as_slice().len(), 2);
        assert_eq!(reg.as_slice()[0].handler, b);
        assert_eq!(reg.get(&Method::GET, "/x").unwrap().handler, b);
        assert!(reg.get(&Method::POST, "/x").is_none());
    }

    #[test]
    fn test_uri_substitutes_in_order() {
        let h = Handler::new(|_| Ok(())).id();
        let mut reg = RouteRegistry::default();
        reg.insert(route(Method::GET, "/posts/:id/comments/:cid", h));
        assert_eq!(reg.uri(h, &["7", "3"]), "/posts/7/comments/3");
        assert_eq!(reg.uri(h, &[7, 3]), "/posts/7/comments/3");
    }

    #[test]
    fn test_uri_first_registered_wins() {
        let h = Handler::new(|_| Ok(())).id();
        let mut reg = RouteRegistry::default();
        reg.insert(route(Method::GET, "/users/:id", h));
        reg.insert(route(Method::GET, "/people/:id", h));
        assert_eq!(reg.uri(h, &["1"]), "/users/1");
    }

    #[test]
    fn test_uri_unknown_handler_is_empty() {
        let reg = RouteRegistry::default();
        let h = Handler::new(|_| Ok(())).id();
        assert_eq!(reg.uri::<&str>(h, &[]), "");
    }

    #[test]
    fn test_uri_with_missing_values_keeps_placeholders() {
        let h = Handler::new(|_| Ok(())).id();
        let mut reg = RouteRegistry::default();
        reg.insert(route(Method::GET, "/a/:x/b/:y", h));
        assert_eq!(reg.uri(h, &["1"]), "/a/1/b/:y");
        assert_eq!(reg.uri(h, &["1", "2", "3"]), "/a/1/b/2");
    }
}
