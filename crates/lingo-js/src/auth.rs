//! The extension's auth helper, seen from Rust.

use js_sys::Promise;
use lingo_core::AuthGate;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

#[wasm_bindgen]
extern "C" {
    /// Any object with `isAuthenticated()` and `getUserEmail()` methods.
    ///
    /// `isAuthenticated` may return a boolean or a promise of one.
    pub type JsAuth;

    #[wasm_bindgen(method, catch, js_name = isAuthenticated)]
    fn is_authenticated(this: &JsAuth) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch, js_name = getUserEmail)]
    fn get_user_email(this: &JsAuth) -> Result<JsValue, JsValue>;
}

/// Answers captured once from a [`JsAuth`].
#[derive(Debug, Clone, Default)]
pub(crate) struct ResolvedAuth {
    authenticated: bool,
    email: Option<String>,
}

impl ResolvedAuth {
    /// Ask `auth`, awaiting a promise if one comes back. Errors count as
    /// signed out.
    pub(crate) async fn resolve(auth: &JsAuth) -> Self {
        let answer = match auth.is_authenticated() {
            Ok(value) if value.is_instance_of::<Promise>() => {
                JsFuture::from(value.unchecked_into::<Promise>()).await
            }
            other => other,
        };
        let authenticated = match answer {
            Ok(value) => value.is_truthy(),
            Err(e) => {
                tracing::warn!(target: "lingo::auth", error = ?e, "auth check failed");
                false
            }
        };
        let email = auth
            .get_user_email()
            .ok()
            .and_then(|v| v.as_string());
        Self {
            authenticated,
            email,
        }
    }
}

impl AuthGate for ResolvedAuth {
    fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    fn user_email(&self) -> Option<String> {
        self.email.clone()
    }
}
